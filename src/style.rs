//! Preset plot styles for climate-model fields
//!
//! Each [`Field`] carries two independently tuned style records, one for
//! plotting the raw field and one for plotting a difference between two
//! instances of it. A [`StyleTable`] starts from those presets and can
//! override bounds and level counts per field.

use crate::colormap::{
    clip_colormap, combine_colormaps, BaseColormap, BoundaryNorm, Colormap, ColormapRef,
};
use crate::errors::{ClimVisError, Result};
use crate::utils::linspace;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::colormap::BaseColormap::*;

/// Physical quantities with preset styles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Field {
    Precipitation,
    SurfaceTemperature,
    WindComponent,
    SurfaceWindSpeed,
    MoistureFluxConvergence,
    RelativeHumidity,
    SpecificHumidity,
    Convergence,
    Divergence,
    Omega,
    LatentHeatFlux,
    SensibleHeatFlux,
    CloudFraction,
    ShortwaveFlux,
    LongwaveFlux,
    SeaLevelPressure,
    StationaryWave,
    SeaSurfaceTemperature,
    SeaIce,
    OceanStreamfunction,
    Topography,
    Bathymetry,
}

impl Field {
    pub const ALL: [Field; 22] = [
        Field::Precipitation,
        Field::SurfaceTemperature,
        Field::WindComponent,
        Field::SurfaceWindSpeed,
        Field::MoistureFluxConvergence,
        Field::RelativeHumidity,
        Field::SpecificHumidity,
        Field::Convergence,
        Field::Divergence,
        Field::Omega,
        Field::LatentHeatFlux,
        Field::SensibleHeatFlux,
        Field::CloudFraction,
        Field::ShortwaveFlux,
        Field::LongwaveFlux,
        Field::SeaLevelPressure,
        Field::StationaryWave,
        Field::SeaSurfaceTemperature,
        Field::SeaIce,
        Field::OceanStreamfunction,
        Field::Topography,
        Field::Bathymetry,
    ];

    /// Keys accepted for this field. Matching is case-sensitive because
    /// `sh` (specific humidity) and `SH` (sensible heat flux) differ.
    #[must_use]
    pub const fn aliases(self) -> &'static [&'static str] {
        match self {
            Self::Precipitation => &["prec", "precip", "precipiation", "precipitation"],
            Self::SurfaceTemperature => &["ts", "tsurf", "t", "temp", "temperature"],
            Self::WindComponent => &["u", "U", "uwind", "usurf", "v", "V", "vwind", "vsurf"],
            Self::SurfaceWindSpeed => &["sfc_wind_speed", "sfcWind", "sfcwind", "sfc_wind", "wsurf"],
            Self::MoistureFluxConvergence => {
                &["mfc", "moist_flux_convergence", "mfcvg", "mf_cvg", "vimfc"]
            }
            Self::RelativeHumidity => &["rh", "rel_hum", "relative_humidity"],
            Self::SpecificHumidity => &["sh", "qv", "q", "Q", "QV", "specific_humidity"],
            Self::Convergence => &["cvg", "convergence"],
            Self::Divergence => &["div", "dvg", "divergence"],
            Self::Omega => &["omega", "w"],
            Self::LatentHeatFlux => &["lh_flux", "LH", "lhf"],
            Self::SensibleHeatFlux => &["sh_flux", "SH", "shf"],
            Self::CloudFraction => {
                &["cloud", "cloud_frac", "fcloud", "pcldl", "pcldm", "pcldh", "pcldt"]
            }
            Self::ShortwaveFlux => &["sw_flux", "sw_toa", "swcrf"],
            Self::LongwaveFlux => &["lw_flux", "lw_toa", "lwcrf"],
            Self::SeaLevelPressure => &["slp", "pressure"],
            Self::StationaryWave => &["z200", "z700", "z_200", "z_700", "stationary_wave"],
            Self::SeaSurfaceTemperature => {
                &["sst", "SST", "sea_surface_temperature", "sea_surface_temp"]
            }
            Self::SeaIce => &["ice", "seaice", "seaIce", "oicefr"],
            Self::OceanStreamfunction => &[
                "ocean_streamfunction",
                "sf_Atl",
                "sf_atl",
                "sf_pac",
                "sf_ind",
                "sf_Pac",
                "sf_Ind",
                "sf_ocn",
            ],
            Self::Topography => &[
                "topo_real",
                "topo",
                "topography",
                "surface_height",
                "zatmo",
                "zsurf",
            ],
            Self::Bathymetry => &["bathymetry", "bathy", "depth"],
        }
    }

    /// Canonical key, the first alias
    #[must_use]
    pub const fn key(self) -> &'static str {
        self.aliases()[0]
    }

    /// Preset `(absolute, difference)` style records
    #[must_use]
    pub const fn presets(self) -> (StyleRecord, StyleRecord) {
        use ColormapRecipe::{Clip, Combine, Plain};
        match self {
            Self::Precipitation => (
                StyleRecord::new(Plain(named(Blues)), 0.0, 10.0, 21),
                StyleRecord::new(
                    Combine(named(BrBG), named(Blues), [0.0, 0.5], [0.0, 0.95], 128, 128),
                    -6.0,
                    6.0,
                    25,
                ),
            ),
            Self::SurfaceTemperature => (
                StyleRecord::new(Plain(rev(RdYlBu)), -30.0, 30.0, 21),
                StyleRecord::new(Plain(rev(RdBu)), -10.0, 10.0, 21),
            ),
            Self::WindComponent => (
                StyleRecord::new(
                    Combine(rev(YlOrBr), named(BuPu), [0.0, 1.0], [0.0, 1.0], 128, 128),
                    -10.0,
                    10.0,
                    21,
                ),
                StyleRecord::new(Plain(rev(RdBu)), -5.0, 5.0, 11),
            ),
            Self::SurfaceWindSpeed => (
                StyleRecord::new(Plain(rev(Matter)), 4.0, 11.0, 31),
                StyleRecord::new(Plain(rev(RdBu)), -10.0, 10.0, 21),
            ),
            Self::MoistureFluxConvergence => (
                StyleRecord::new(
                    Combine(rev(YlOrBr), rev(Tempo), [0.0, 1.0], [0.0, 1.0], 128, 128),
                    -0.00006,
                    0.00006,
                    25,
                ),
                StyleRecord::new(
                    Combine(rev(YlOrBr), rev(Tempo), [0.0, 1.0], [0.0, 1.0], 128, 128),
                    -0.00004,
                    0.00004,
                    17,
                ),
            ),
            Self::RelativeHumidity | Self::SpecificHumidity => (
                StyleRecord::new(Clip(rev(Delta), 0.5, 1.0), 0.0, 100.0, 21),
                StyleRecord::new(
                    Combine(named(BrBG), rev(Delta), [0.0, 0.45], [0.52, 1.0], 128, 128),
                    -50.0,
                    50.0,
                    21,
                ),
            ),
            Self::Convergence => (
                StyleRecord::new(Plain(named(RdBu)), -5e-05, 5e-05, 21),
                StyleRecord::new(Plain(named(RdBu)), -5e-06, 5e-06, 21),
            ),
            Self::Divergence => (
                StyleRecord::new(Plain(rev(RdBu)), -5e-05, 5e-05, 21),
                StyleRecord::new(Plain(rev(RdBu)), -5e-05, 5e-05, 21),
            ),
            Self::Omega => (
                StyleRecord::new(Plain(named(Curl)), -0.1, 0.1, 21),
                StyleRecord::new(Plain(named(Curl)), -0.05, 0.05, 21),
            ),
            Self::LatentHeatFlux => (
                StyleRecord::new(Plain(named(Amp)), 0.0, 300.0, 16),
                StyleRecord::new(Plain(rev(RdBu)), -100.0, 100.0, 21),
            ),
            Self::SensibleHeatFlux => (
                StyleRecord::new(Plain(rev(RdBu)), -100.0, 100.0, 21),
                StyleRecord::new(Plain(rev(RdBu)), -20.0, 20.0, 21),
            ),
            Self::CloudFraction => (
                StyleRecord::new(Plain(named(Ice)), 0.0, 100.0, 21),
                StyleRecord::new(Plain(named(Diff)), -20.0, 20.0, 21),
            ),
            Self::ShortwaveFlux => (
                StyleRecord::new(Plain(rev(Thermal)), -100.0, 0.0, 21),
                StyleRecord::new(
                    Combine(named(Gray), named(Amp), [0.1, 0.95], [0.0, 0.95], 128, 128),
                    -50.0,
                    50.0,
                    21,
                ),
            ),
            Self::LongwaveFlux => (
                StyleRecord::new(Plain(named(Thermal)), 0.0, 100.0, 21),
                StyleRecord::new(
                    Combine(named(Bone), named(Amp), [0.1, 0.95], [0.0, 0.95], 128, 128),
                    -50.0,
                    50.0,
                    21,
                ),
            ),
            Self::SeaLevelPressure => (
                StyleRecord::new(Plain(named(RdBu)), 975.0, 1025.0, 11),
                StyleRecord::new(Plain(named(RdBu)), -10.0, 10.0, 11),
            ),
            Self::StationaryWave => (
                StyleRecord::new(Plain(named(Seismic)), -150.0, 150.0, 31),
                StyleRecord::new(Plain(named(Seismic)), -30.0, 30.0, 21),
            ),
            Self::SeaSurfaceTemperature => (
                StyleRecord::new(Plain(rev(RdYlBu)), -5.0, 30.0, 36),
                StyleRecord::new(Plain(rev(RdBu)), -10.0, 10.0, 21),
            ),
            Self::SeaIce => (
                StyleRecord::new(Plain(named(Ice)), 0.0, 100.0, 26),
                StyleRecord::new(Plain(named(RdBu)), -50.0, 50.0, 26),
            ),
            Self::OceanStreamfunction => (
                StyleRecord::new(Plain(named(YlGnBu)), -10.0, 30.0, 21),
                StyleRecord::new(Plain(rev(Delta)), -20.0, 20.0, 21),
            ),
            Self::Topography => (
                StyleRecord::new(Clip(named(Topo), 0.5, 1.0), 0.0, 5000.0, 26),
                StyleRecord::new(
                    Combine(
                        named(TwilightShifted),
                        rev(AfmHot),
                        [0.0, 0.5],
                        [0.0, 1.0],
                        128,
                        128,
                    ),
                    -2000.0,
                    2000.0,
                    21,
                ),
            ),
            Self::Bathymetry => (
                StyleRecord::new(Plain(rev(Deep)), -4000.0, 0.0, 21),
                StyleRecord::new(Plain(named(Diff)), -1000.0, 1000.0, 21),
            ),
        }
    }
}

const fn named(base: BaseColormap) -> ColormapRef {
    ColormapRef::named(base)
}

const fn rev(base: BaseColormap) -> ColormapRef {
    ColormapRef::reversed(base)
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Field {
    type Err = ClimVisError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|field| field.aliases().contains(&s))
            .ok_or_else(|| ClimVisError::UnknownField {
                field: s.to_string(),
            })
    }
}

/// How to build the colormap of a style record
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ColormapRecipe {
    /// A library palette as-is
    Plain(ColormapRef),
    /// Palette clipped to `[lower, upper]`
    Clip(ColormapRef, f64, f64),
    /// Two palettes stacked: `(low, high, range_low, range_up, n_low, n_up)`
    Combine(ColormapRef, ColormapRef, [f64; 2], [f64; 2], usize, usize),
}

impl ColormapRecipe {
    /// Materialize the colormap
    ///
    /// # Errors
    ///
    /// Returns `InvalidColormap` if a clip or combine range is invalid.
    pub fn build(&self) -> Result<Colormap> {
        match *self {
            Self::Plain(cmap) => Ok(cmap.to_colormap()),
            Self::Clip(cmap, lower, upper) => clip_colormap(&cmap.to_colormap(), lower, upper),
            Self::Combine(low, high, range_low, range_up, n_low, n_up) => combine_colormaps(
                &low.to_colormap(),
                &high.to_colormap(),
                range_low,
                range_up,
                n_low,
                n_up,
            ),
        }
    }
}

/// Upper bound on the number of level boundaries a style may request
pub const MAX_LEVELS: usize = 10_000;

/// A static style record: colormap recipe, bounds and level count
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StyleRecord {
    pub colormap: ColormapRecipe,
    pub vmin: f64,
    pub vmax: f64,
    pub levels: usize,
}

impl StyleRecord {
    #[must_use]
    pub const fn new(colormap: ColormapRecipe, vmin: f64, vmax: f64, levels: usize) -> Self {
        Self {
            colormap,
            vmin,
            vmax,
            levels,
        }
    }

    fn validate(&self, field: Field) -> Result<()> {
        if !(self.vmin < self.vmax) || !(2..=MAX_LEVELS).contains(&self.levels) {
            return Err(ClimVisError::InvalidConfig {
                message: format!(
                    "style for '{field}' needs vmin < vmax and 2 to {MAX_LEVELS} levels (got {}, {}, {})",
                    self.vmin, self.vmax, self.levels
                ),
            });
        }
        Ok(())
    }
}

/// A resolved style, ready for a renderer
#[derive(Debug, Clone)]
pub struct FieldStyle {
    pub colormap: Colormap,
    pub vmin: f64,
    pub vmax: f64,
    pub level_count: usize,
}

impl FieldStyle {
    /// Level boundaries: `level_count` values evenly spaced over `[vmin, vmax]`
    #[must_use]
    pub fn levels(&self) -> Vec<f64> {
        linspace(self.vmin, self.vmax, self.level_count)
    }

    /// Discretized color mapping over the levels
    ///
    /// # Errors
    ///
    /// Returns `InvalidColormap` if the colormap has fewer colors than bins.
    pub fn norm(&self) -> Result<BoundaryNorm> {
        BoundaryNorm::new(self.levels(), self.colormap.len())
    }
}

/// Bounds/levels replacing a preset, as read from configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StyleBounds {
    pub vmin: f64,
    pub vmax: f64,
    pub levels: usize,
}

/// Per-field overrides for the absolute and difference records
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StyleOverride {
    #[serde(default)]
    pub absolute: Option<StyleBounds>,
    #[serde(default)]
    pub difference: Option<StyleBounds>,
}

/// Style lookup table: presets plus optional overrides
#[derive(Debug, Clone, Default)]
pub struct StyleTable {
    overrides: BTreeMap<Field, StyleOverride>,
}

impl StyleTable {
    /// The preset table with no overrides
    #[must_use]
    pub fn presets() -> Self {
        Self::default()
    }

    /// Build a table from overrides keyed by any field alias
    ///
    /// # Errors
    ///
    /// Returns `UnknownField` for an unrecognized key and `InvalidConfig`
    /// for bounds that violate `vmin < vmax` or `2 <= levels <= MAX_LEVELS`.
    pub fn with_overrides(overrides: &BTreeMap<String, StyleOverride>) -> Result<Self> {
        let mut table = Self::default();
        for (key, style_override) in overrides {
            let field: Field = key.parse()?;
            table.overrides.insert(field, style_override.clone());
            for diff in [false, true] {
                table.record(field, diff).validate(field)?;
            }
            tracing::debug!(%field, "style override registered");
        }
        Ok(table)
    }

    /// The effective record for `field`
    #[must_use]
    pub fn record(&self, field: Field, diff: bool) -> StyleRecord {
        let (absolute, difference) = field.presets();
        let mut record = if diff { difference } else { absolute };
        let bounds = self.overrides.get(&field).and_then(|o| {
            if diff {
                o.difference
            } else {
                o.absolute
            }
        });
        if let Some(bounds) = bounds {
            record.vmin = bounds.vmin;
            record.vmax = bounds.vmax;
            record.levels = bounds.levels;
        }
        record
    }

    /// Resolve the style for a field key
    ///
    /// # Errors
    ///
    /// Returns `UnknownField` for a key with no preset.
    pub fn field_style(&self, key: &str, diff: bool) -> Result<FieldStyle> {
        let field: Field = key.parse()?;
        let record = self.record(field, diff);
        Ok(FieldStyle {
            colormap: record.colormap.build()?,
            vmin: record.vmin,
            vmax: record.vmax,
            level_count: record.levels,
        })
    }
}

/// Resolve the preset style for a field key
///
/// # Errors
///
/// Returns `UnknownField` for a key with no preset.
pub fn field_style(key: &str, diff: bool) -> Result<FieldStyle> {
    StyleTable::presets().field_style(key, diff)
}

/// Level boundaries for user-supplied bounds.
///
/// `scale` is a power of ten applied before counting half-unit steps, so
/// small-magnitude fields still get a usable number of levels. Very coarse
/// results (seven levels or fewer) are refined to `2n + 1`. The count is
/// truncated, not rounded, so `(0, 0.45)` yields 4 levels.
///
/// # Errors
///
/// Returns `InvalidConfig` unless `vmin < vmax` and the count is finite and
/// at most [`MAX_LEVELS`].
pub fn custom_levels(vmin: f64, vmax: f64, scale: i32) -> Result<Vec<f64>> {
    if !(vmin < vmax) {
        return Err(ClimVisError::InvalidConfig {
            message: format!("vmin ({vmin}) must be below vmax ({vmax})"),
        });
    }
    let factor = 10f64.powi(scale);
    let mut n = 2.0 * (vmax * factor - vmin * factor) + 1.0;
    if n <= 7.0 {
        n = n * 2.0 + 1.0;
    }
    if !n.is_finite() || n > MAX_LEVELS as f64 {
        return Err(ClimVisError::InvalidConfig {
            message: format!(
                "[{vmin}, {vmax}] at scale 10^{scale} needs {n} levels, above the limit of {MAX_LEVELS}"
            ),
        });
    }
    // tolerate float noise such as 20.999999999
    let n = ((n + 1e-9).floor() as usize).max(2);
    Ok(linspace(vmin, vmax, n))
}

/// Fallback colormap when no style is requested: divergent for data with
/// negative values, sequential otherwise.
#[must_use]
pub fn default_colormap(min_value: f64) -> ColormapRef {
    if min_value < 0.0 {
        ColormapRef::named(RdBu)
    } else {
        ColormapRef::reversed(Viridis)
    }
}
