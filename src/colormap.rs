//! Colormaps, colormap composition and discretized color mapping
//!
//! Base palettes come from `colorous` (ColorBrewer / matplotlib gradients)
//! or from anchor tables for the oceanographic and matplotlib maps it does
//! not ship. A [`Colormap`] is always a concrete lookup table, so clipping
//! and stacking are plain array transformations.

use crate::errors::{ClimVisError, Result};
use crate::utils::linspace;
use std::fmt;

/// Number of entries in a linear-segmented colormap
pub const DEFAULT_COLORMAP_SIZE: usize = 256;

/// Number of samples taken when clipping a colormap
pub const CLIP_SAMPLES: usize = 50;

/// An RGBA color with channels in `[0, 1]`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    pub a: f64,
}

impl Rgba {
    /// Fully transparent black, used for missing values
    pub const TRANSPARENT: Self = Self {
        r: 0.0,
        g: 0.0,
        b: 0.0,
        a: 0.0,
    };

    #[must_use]
    pub fn from_rgb8(r: u8, g: u8, b: u8) -> Self {
        Self {
            r: f64::from(r) / 255.0,
            g: f64::from(g) / 255.0,
            b: f64::from(b) / 255.0,
            a: 1.0,
        }
    }

    #[must_use]
    pub fn lerp(self, other: Self, t: f64) -> Self {
        Self {
            r: self.r + (other.r - self.r) * t,
            g: self.g + (other.g - self.g) * t,
            b: self.b + (other.b - self.b) * t,
            a: self.a + (other.a - self.a) * t,
        }
    }

    /// `#rrggbb` hex string
    #[must_use]
    pub fn to_hex(self) -> String {
        let channel = |c: f64| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
        format!("#{:02x}{:02x}{:02x}", channel(self.r), channel(self.g), channel(self.b))
    }
}

/// Library-provided palettes referenced by the style presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BaseColormap {
    Blues,
    BrBG,
    RdBu,
    RdYlBu,
    YlOrBr,
    BuPu,
    YlGnBu,
    Viridis,
    Seismic,
    Bone,
    AfmHot,
    TwilightShifted,
    Matter,
    Tempo,
    Delta,
    Curl,
    Amp,
    Ice,
    Diff,
    Thermal,
    Gray,
    Topo,
    Deep,
}

impl BaseColormap {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Blues => "Blues",
            Self::BrBG => "BrBG",
            Self::RdBu => "RdBu",
            Self::RdYlBu => "RdYlBu",
            Self::YlOrBr => "YlOrBr",
            Self::BuPu => "BuPu",
            Self::YlGnBu => "YlGnBu",
            Self::Viridis => "viridis",
            Self::Seismic => "seismic",
            Self::Bone => "bone",
            Self::AfmHot => "afmhot",
            Self::TwilightShifted => "twilight_shifted",
            Self::Matter => "matter",
            Self::Tempo => "tempo",
            Self::Delta => "delta",
            Self::Curl => "curl",
            Self::Amp => "amp",
            Self::Ice => "ice",
            Self::Diff => "diff",
            Self::Thermal => "thermal",
            Self::Gray => "gray",
            Self::Topo => "topo",
            Self::Deep => "deep",
        }
    }

    fn gradient(self) -> Option<colorous::Gradient> {
        match self {
            Self::Blues => Some(colorous::BLUES),
            Self::BrBG => Some(colorous::BROWN_GREEN),
            Self::RdBu => Some(colorous::RED_BLUE),
            Self::RdYlBu => Some(colorous::RED_YELLOW_BLUE),
            Self::YlOrBr => Some(colorous::YELLOW_ORANGE_BROWN),
            Self::BuPu => Some(colorous::BLUE_PURPLE),
            Self::YlGnBu => Some(colorous::YELLOW_GREEN_BLUE),
            Self::Viridis => Some(colorous::VIRIDIS),
            _ => None,
        }
    }

    /// Anchor colors as `(position, rgb)` for palettes without a gradient
    fn anchors(self) -> &'static [(f64, [u8; 3])] {
        match self {
            Self::Seismic => &[
                (0.0, [0, 0, 76]),
                (0.25, [0, 0, 255]),
                (0.5, [255, 255, 255]),
                (0.75, [255, 0, 0]),
                (1.0, [128, 0, 0]),
            ],
            Self::Bone => &[
                (0.0, [0, 0, 0]),
                (0.375, [84, 84, 116]),
                (0.75, [166, 198, 198]),
                (1.0, [255, 255, 255]),
            ],
            Self::AfmHot => &[
                (0.0, [0, 0, 0]),
                (0.25, [128, 0, 0]),
                (0.5, [255, 128, 0]),
                (0.75, [255, 255, 128]),
                (1.0, [255, 255, 255]),
            ],
            Self::TwilightShifted => &[
                (0.0, [47, 20, 54]),
                (0.25, [94, 128, 185]),
                (0.5, [226, 217, 226]),
                (0.75, [173, 86, 69]),
                (1.0, [47, 20, 54]),
            ],
            Self::Matter => &[
                (0.0, [254, 237, 176]),
                (0.25, [243, 150, 105]),
                (0.5, [199, 64, 96]),
                (0.75, [117, 29, 94]),
                (1.0, [47, 15, 61]),
            ],
            Self::Tempo => &[
                (0.0, [255, 246, 244]),
                (0.25, [171, 210, 174]),
                (0.5, [66, 158, 120]),
                (0.75, [21, 93, 80]),
                (1.0, [20, 29, 38]),
            ],
            Self::Delta => &[
                (0.0, [16, 31, 63]),
                (0.25, [38, 125, 169]),
                (0.5, [255, 253, 205]),
                (0.75, [64, 141, 61]),
                (1.0, [23, 35, 18]),
            ],
            Self::Curl => &[
                (0.0, [21, 29, 68]),
                (0.25, [72, 161, 150]),
                (0.5, [254, 246, 245]),
                (0.75, [200, 94, 116]),
                (1.0, [52, 13, 53]),
            ],
            Self::Amp => &[
                (0.0, [241, 237, 236]),
                (0.25, [226, 170, 150]),
                (0.5, [200, 95, 70]),
                (0.75, [145, 30, 40]),
                (1.0, [60, 9, 18]),
            ],
            Self::Ice => &[
                (0.0, [4, 6, 19]),
                (0.25, [58, 60, 125]),
                (0.5, [62, 118, 166]),
                (0.75, [101, 178, 200]),
                (1.0, [234, 253, 253]),
            ],
            Self::Diff => &[
                (0.0, [7, 34, 63]),
                (0.25, [80, 122, 162]),
                (0.5, [245, 242, 241]),
                (0.75, [148, 134, 84]),
                (1.0, [28, 16, 8]),
            ],
            Self::Thermal => &[
                (0.0, [4, 35, 51]),
                (0.25, [85, 55, 150]),
                (0.5, [177, 64, 120]),
                (0.75, [245, 130, 55]),
                (1.0, [232, 250, 91]),
            ],
            Self::Gray => &[(0.0, [0, 0, 0]), (1.0, [255, 255, 255])],
            Self::Topo => &[
                (0.0, [40, 26, 44]),
                (0.25, [59, 87, 166]),
                (0.499, [168, 213, 226]),
                (0.501, [15, 91, 32]),
                (0.75, [194, 166, 107]),
                (1.0, [250, 250, 250]),
            ],
            Self::Deep => &[
                (0.0, [253, 254, 204]),
                (0.25, [120, 206, 163]),
                (0.5, [64, 144, 164]),
                (0.75, [62, 80, 150]),
                (1.0, [40, 26, 44]),
            ],
            _ => &[],
        }
    }

    /// Continuous evaluation at `t` in `[0, 1]`
    #[must_use]
    pub fn eval(self, t: f64) -> Rgba {
        let t = t.clamp(0.0, 1.0);
        if let Some(gradient) = self.gradient() {
            let c = gradient.eval_continuous(t);
            return Rgba::from_rgb8(c.r, c.g, c.b);
        }

        let anchors = self.anchors();
        let upper = anchors
            .iter()
            .position(|(pos, _)| *pos >= t)
            .unwrap_or(anchors.len() - 1);
        if upper == 0 {
            let [r, g, b] = anchors[0].1;
            return Rgba::from_rgb8(r, g, b);
        }
        let (p0, [r0, g0, b0]) = anchors[upper - 1];
        let (p1, [r1, g1, b1]) = anchors[upper];
        let frac = if p1 > p0 { (t - p0) / (p1 - p0) } else { 0.0 };
        Rgba::from_rgb8(r0, g0, b0).lerp(Rgba::from_rgb8(r1, g1, b1), frac)
    }
}

/// A base palette, optionally reversed (matplotlib's `_r` suffix)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ColormapRef {
    pub base: BaseColormap,
    pub reversed: bool,
}

impl ColormapRef {
    #[must_use]
    pub const fn named(base: BaseColormap) -> Self {
        Self {
            base,
            reversed: false,
        }
    }

    #[must_use]
    pub const fn reversed(base: BaseColormap) -> Self {
        Self {
            base,
            reversed: true,
        }
    }

    #[must_use]
    pub fn name(self) -> String {
        if self.reversed {
            format!("{}_r", self.base.name())
        } else {
            self.base.name().to_string()
        }
    }

    /// Sample the palette into a 256-entry lookup table
    #[must_use]
    pub fn to_colormap(self) -> Colormap {
        let colors = linspace(0.0, 1.0, DEFAULT_COLORMAP_SIZE)
            .into_iter()
            .map(|t| self.base.eval(if self.reversed { 1.0 - t } else { t }))
            .collect();
        Colormap {
            name: self.name(),
            colors,
        }
    }
}

/// A concrete colormap: a lookup table of `N` colors spanning `[0, 1]`
#[derive(Debug, Clone, PartialEq)]
pub struct Colormap {
    pub name: String,
    colors: Vec<Rgba>,
}

impl Colormap {
    /// Colormap that uses the given colors as-is
    ///
    /// # Errors
    ///
    /// Returns `InvalidColormap` for an empty color list.
    pub fn listed(name: impl Into<String>, colors: Vec<Rgba>) -> Result<Self> {
        if colors.is_empty() {
            return Err(ClimVisError::InvalidColormap {
                message: "a colormap needs at least one color".to_string(),
            });
        }
        Ok(Self {
            name: name.into(),
            colors,
        })
    }

    /// Linear-segmented colormap through evenly spaced `colors`, resampled to `n` entries
    ///
    /// # Errors
    ///
    /// Returns `InvalidColormap` for an empty color list or `n == 0`.
    pub fn from_list(name: impl Into<String>, colors: &[Rgba], n: usize) -> Result<Self> {
        if colors.is_empty() || n == 0 {
            return Err(ClimVisError::InvalidColormap {
                message: format!("cannot build {n} entries from {} colors", colors.len()),
            });
        }
        let last = colors.len() - 1;
        let table = linspace(0.0, 1.0, n)
            .into_iter()
            .map(|t| {
                let x = t * last as f64;
                let i = (x.floor() as usize).min(last);
                if i == last {
                    colors[last]
                } else {
                    colors[i].lerp(colors[i + 1], x - i as f64)
                }
            })
            .collect();
        Self::listed(name, table)
    }

    /// Number of colors in the lookup table
    #[must_use]
    pub fn len(&self) -> usize {
        self.colors.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    #[must_use]
    pub fn colors(&self) -> &[Rgba] {
        &self.colors
    }

    /// Lookup at `t` in `[0, 1]`; NaN maps to transparent
    #[must_use]
    pub fn eval(&self, t: f64) -> Rgba {
        if t.is_nan() {
            return Rgba::TRANSPARENT;
        }
        let n = self.colors.len();
        let i = ((t.clamp(0.0, 1.0) * n as f64).floor() as usize).min(n - 1);
        self.colors[i]
    }

    /// Color for lookup-table index `i`, clamped to the table
    #[must_use]
    pub fn color_at(&self, i: usize) -> Rgba {
        self.colors[i.min(self.colors.len() - 1)]
    }

    /// `n` colors sampled evenly over `[lower, upper]`
    #[must_use]
    pub fn sample(&self, lower: f64, upper: f64, n: usize) -> Vec<Rgba> {
        linspace(lower, upper, n).into_iter().map(|t| self.eval(t)).collect()
    }

    #[must_use]
    pub fn reversed(&self) -> Self {
        Self {
            name: format!("{}_r", self.name),
            colors: self.colors.iter().rev().copied().collect(),
        }
    }
}

impl From<ColormapRef> for Colormap {
    fn from(cmap: ColormapRef) -> Self {
        cmap.to_colormap()
    }
}

impl fmt::Display for Colormap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} colors)", self.name, self.colors.len())
    }
}

fn check_range(lower: f64, upper: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&lower) || !(0.0..=1.0).contains(&upper) || lower >= upper {
        return Err(ClimVisError::InvalidColormap {
            message: format!("range [{lower}, {upper}] must satisfy 0 <= lower < upper <= 1"),
        });
    }
    Ok(())
}

/// Clip a colormap to `[lower, upper]` of its domain and treat the clipped
/// segment as a complete colormap.
///
/// Clipping a divergent palette unequally from both ends moves its neutral
/// point away from the center.
///
/// # Errors
///
/// Returns `InvalidColormap` when the range is outside `[0, 1]` or empty.
pub fn clip_colormap(cmap: &Colormap, lower: f64, upper: f64) -> Result<Colormap> {
    check_range(lower, upper)?;
    Colormap::listed(
        format!("{}_clip", cmap.name),
        cmap.sample(lower, upper, CLIP_SAMPLES),
    )
}

/// Stack two colormaps end to end.
///
/// `n_low` colors are sampled from `range_low` of `low` and `n_up` from
/// `range_up` of `high`; the concatenation becomes a 256-entry
/// linear-segmented colormap.
///
/// # Errors
///
/// Returns `InvalidColormap` for bad ranges or zero sample counts.
pub fn combine_colormaps(
    low: &Colormap,
    high: &Colormap,
    range_low: [f64; 2],
    range_up: [f64; 2],
    n_low: usize,
    n_up: usize,
) -> Result<Colormap> {
    check_range(range_low[0], range_low[1])?;
    check_range(range_up[0], range_up[1])?;
    if n_low == 0 || n_up == 0 {
        return Err(ClimVisError::InvalidColormap {
            message: "both colormaps must contribute at least one color".to_string(),
        });
    }
    let mut colors = low.sample(range_low[0], range_low[1], n_low);
    colors.extend(high.sample(range_up[0], range_up[1], n_up));
    Colormap::from_list(
        format!("{}+{}", low.name, high.name),
        &colors,
        DEFAULT_COLORMAP_SIZE,
    )
}

/// Where a value falls relative to a set of level boundaries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorIndex {
    /// Below the first boundary
    Under,
    /// Lookup-table index for an in-range value
    Index(usize),
    /// At or above the last boundary
    Over,
    /// NaN
    Bad,
}

/// Discretized color mapping: boundaries split the value range into bins,
/// each bin mapped to one color index spread across `ncolors`.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundaryNorm {
    boundaries: Vec<f64>,
    ncolors: usize,
}

impl BoundaryNorm {
    /// # Errors
    ///
    /// Returns `InvalidColormap` unless there are at least two strictly
    /// increasing boundaries and at least as many colors as bins.
    pub fn new(boundaries: Vec<f64>, ncolors: usize) -> Result<Self> {
        if boundaries.len() < 2 || boundaries.windows(2).any(|w| w[1] <= w[0]) {
            return Err(ClimVisError::InvalidColormap {
                message: "boundaries must be at least two increasing values".to_string(),
            });
        }
        let nbins = boundaries.len() - 1;
        if ncolors < nbins {
            return Err(ClimVisError::InvalidColormap {
                message: format!("{ncolors} colors cannot cover {nbins} bins"),
            });
        }
        Ok(Self {
            boundaries,
            ncolors,
        })
    }

    #[must_use]
    pub fn boundaries(&self) -> &[f64] {
        &self.boundaries
    }

    #[must_use]
    pub fn bins(&self) -> usize {
        self.boundaries.len() - 1
    }

    /// Map a value to its color index
    #[must_use]
    pub fn index(&self, value: f64) -> ColorIndex {
        if value.is_nan() {
            return ColorIndex::Bad;
        }
        let first = self.boundaries[0];
        let last = self.boundaries[self.boundaries.len() - 1];
        if value < first {
            return ColorIndex::Under;
        }
        if value >= last {
            return ColorIndex::Over;
        }
        // number of boundaries <= value, minus one
        let bin = self.boundaries.partition_point(|b| *b <= value) - 1;
        let nbins = self.bins();
        if nbins == 1 {
            return ColorIndex::Index(0);
        }
        let scale = (self.ncolors - 1) as f64 / (nbins - 1) as f64;
        ColorIndex::Index((bin as f64 * scale) as usize)
    }

    /// Color of `value` in `cmap`; out-of-range values take the end colors
    #[must_use]
    pub fn color(&self, value: f64, cmap: &Colormap) -> Rgba {
        match self.index(value) {
            ColorIndex::Under => cmap.color_at(0),
            ColorIndex::Over => cmap.color_at(cmap.len() - 1),
            ColorIndex::Index(i) => cmap.color_at(i),
            ColorIndex::Bad => Rgba::TRANSPARENT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn reversed_palette_swaps_ends() {
        let blues = ColormapRef::named(BaseColormap::Blues).to_colormap();
        let blues_r = ColormapRef::reversed(BaseColormap::Blues).to_colormap();
        assert_eq!(blues.len(), DEFAULT_COLORMAP_SIZE);
        assert_eq!(blues_r.name, "Blues_r");
        assert_eq!(blues.color_at(0), blues_r.color_at(255));
        // Blues runs from light to dark
        let first = blues.color_at(0);
        let last = blues.color_at(255);
        assert!(first.r + first.g + first.b > last.r + last.g + last.b);
    }

    #[test]
    fn anchor_palettes_hit_anchors() {
        let c = BaseColormap::Seismic.eval(0.5);
        assert_relative_eq!(c.r, 1.0);
        assert_relative_eq!(c.g, 1.0);
        assert_relative_eq!(c.b, 1.0);
        assert_eq!(BaseColormap::Gray.eval(0.0).to_hex(), "#000000");
        assert_eq!(BaseColormap::Gray.eval(1.0).to_hex(), "#ffffff");
    }

    #[test]
    fn clip_takes_fifty_colors_from_subrange() {
        let gray = ColormapRef::named(BaseColormap::Gray).to_colormap();
        let clipped = clip_colormap(&gray, 0.5, 1.0).unwrap();
        assert_eq!(clipped.len(), CLIP_SAMPLES);
        assert!(clipped.color_at(0).r >= 0.49);
        assert_relative_eq!(clipped.color_at(CLIP_SAMPLES - 1).r, 1.0);
    }

    #[test]
    fn clip_rejects_bad_range() {
        let gray = ColormapRef::named(BaseColormap::Gray).to_colormap();
        assert!(clip_colormap(&gray, 0.8, 0.2).is_err());
        assert!(clip_colormap(&gray, -0.1, 0.2).is_err());
    }

    #[test]
    fn combine_puts_low_palette_first() {
        let black = Colormap::listed("black", vec![Rgba::from_rgb8(0, 0, 0)]).unwrap();
        let white = Colormap::listed("white", vec![Rgba::from_rgb8(255, 255, 255)]).unwrap();
        let combined = combine_colormaps(&black, &white, [0.0, 1.0], [0.0, 1.0], 128, 128).unwrap();
        assert_eq!(combined.len(), DEFAULT_COLORMAP_SIZE);
        assert_eq!(combined.eval(0.1).to_hex(), "#000000");
        assert_eq!(combined.eval(0.9).to_hex(), "#ffffff");
        assert!(combine_colormaps(&black, &white, [0.0, 1.0], [0.0, 1.0], 0, 4).is_err());
    }

    #[test]
    fn boundary_norm_bins() {
        let norm = BoundaryNorm::new(linspace(0.0, 10.0, 11), 10).unwrap();
        assert_eq!(norm.index(-1.0), ColorIndex::Under);
        assert_eq!(norm.index(0.0), ColorIndex::Index(0));
        assert_eq!(norm.index(5.5), ColorIndex::Index(5));
        assert_eq!(norm.index(9.99), ColorIndex::Index(9));
        assert_eq!(norm.index(10.0), ColorIndex::Over);
        assert_eq!(norm.index(f64::NAN), ColorIndex::Bad);
    }

    #[test]
    fn boundary_norm_spreads_bins_over_colors() {
        let norm = BoundaryNorm::new(linspace(0.0, 1.0, 3), 256).unwrap();
        assert_eq!(norm.index(0.25), ColorIndex::Index(0));
        assert_eq!(norm.index(0.75), ColorIndex::Index(255));
        assert!(BoundaryNorm::new(vec![1.0, 1.0], 256).is_err());
        assert!(BoundaryNorm::new(linspace(0.0, 1.0, 30), 10).is_err());
    }
}
