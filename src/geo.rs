//! Longitude-convention conversion and regridding
//!
//! Two flip methods are offered. [`FlipMethod::Relabel`] rewrites each
//! longitude and re-sorts the samples; it works on any monotonic axis.
//! [`FlipMethod::Roll`] shifts the data by half the axis and relabels with a
//! linear axis, which is only valid on an even, uniformly spaced, global
//! grid, so those preconditions are checked first.

use crate::errors::{ClimVisError, Result};
use crate::field::{AxisRole, Coordinate, GriddedField};
use crate::utils::{approx_eq, linspace};
use chrono::Local;
use ndarray::{ArrayD, Axis, Dimension, IxDyn};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Longitude conventions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LongitudeConvention {
    /// Values on [-180, 180)
    Signed,
    /// Values on [0, 360)
    Positive,
}

impl LongitudeConvention {
    /// Detect the convention from the range of the values.
    ///
    /// Negative values mean [-180, 180); values above 180 mean [0, 360).
    /// Values entirely within [0, 180] fit both.
    ///
    /// # Errors
    ///
    /// Returns `AmbiguousLongitude` when the values fit both conventions or
    /// neither (negative values together with values above 180).
    pub fn detect(lons: &[f64]) -> Result<Self> {
        let min = lons.iter().copied().fold(f64::INFINITY, f64::min);
        let max = lons.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        if lons.is_empty() || !min.is_finite() || !max.is_finite() {
            return Err(ClimVisError::AmbiguousLongitude {
                message: "no finite longitude values".to_string(),
            });
        }
        match (min < 0.0, max > 180.0) {
            (true, false) => Ok(Self::Signed),
            (false, true) => Ok(Self::Positive),
            (true, true) => Err(ClimVisError::AmbiguousLongitude {
                message: format!("values span [{min}, {max}], mixing both conventions"),
            }),
            (false, false) => Err(ClimVisError::AmbiguousLongitude {
                message: format!("values span [{min}, {max}], valid in both conventions"),
            }),
        }
    }

    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Signed => Self::Positive,
            Self::Positive => Self::Signed,
        }
    }

    /// Map one longitude into this convention
    #[must_use]
    pub fn wrap(self, lon: f64) -> f64 {
        match self {
            Self::Positive => lon.rem_euclid(360.0),
            Self::Signed => (lon + 180.0).rem_euclid(360.0) - 180.0,
        }
    }
}

impl fmt::Display for LongitudeConvention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Signed => f.write_str("-180:180"),
            Self::Positive => f.write_str("0:360"),
        }
    }
}

/// Longitude flip algorithm
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlipMethod {
    /// Relabel each longitude and sort; works on regional grids
    #[default]
    Relabel,
    /// Circular shift by half the axis; global uniform grids only
    Roll,
}

impl std::str::FromStr for FlipMethod {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "relabel" => Ok(Self::Relabel),
            "roll" => Ok(Self::Roll),
            other => Err(format!("Unknown flip method '{other}', expected 'relabel' or 'roll'")),
        }
    }
}

/// Convert longitudes to the opposite convention and reorder samples.
///
/// # Errors
///
/// - `CoordinateNotFound` if the field has no longitude axis
/// - `InvalidCoordinate` if longitudes are not strictly increasing
/// - `AmbiguousLongitude` if the convention cannot be determined
/// - `NonGlobalGrid` if the roll method is used on a non-global grid
pub fn flip_longitude(field: &GriddedField, method: FlipMethod) -> Result<GriddedField> {
    let axis = field.axis_for(AxisRole::X)?;
    let lon = &field.coords[axis];
    if !lon.is_increasing() {
        return Err(ClimVisError::InvalidCoordinate {
            name: lon.name.clone(),
            message: "longitudes must be strictly increasing".to_string(),
        });
    }

    let (mut flipped, target) = match method {
        FlipMethod::Relabel => relabel_and_sort(field, axis)?,
        FlipMethod::Roll => roll_half(field, axis)?,
    };

    let timestamp = Local::now().format("%B %d, %Y, %r");
    flipped.push_history(format!("wrapped longitudes to {target} on {timestamp}"));
    tracing::info!(variable = %field.name, %target, ?method, "flipped longitudes");
    Ok(flipped)
}

fn relabel_and_sort(field: &GriddedField, axis: usize) -> Result<(GriddedField, LongitudeConvention)> {
    let lon = &field.coords[axis];
    let target = if lon.min() < 0.0 {
        LongitudeConvention::Positive
    } else {
        LongitudeConvention::Signed
    };

    let wrapped: Vec<f64> = lon.values.iter().map(|&x| target.wrap(x)).collect();
    let mut order: Vec<usize> = (0..wrapped.len()).collect();
    order.sort_by(|&a, &b| wrapped[a].total_cmp(&wrapped[b]));
    if order.windows(2).any(|w| wrapped[w[0]] == wrapped[w[1]]) {
        return Err(ClimVisError::InvalidCoordinate {
            name: lon.name.clone(),
            message: "longitudes overlap after wrapping (axis spans more than 360 degrees)"
                .to_string(),
        });
    }

    let mut flipped = field.select_along(axis, &order);
    flipped.coords[axis].values = order.iter().map(|&i| wrapped[i]).collect();
    Ok((flipped, target))
}

fn roll_half(field: &GriddedField, axis: usize) -> Result<(GriddedField, LongitudeConvention)> {
    let lon = &field.coords[axis];
    let nx = lon.len();
    let current = LongitudeConvention::detect(&lon.values)?;
    check_global(lon)?;

    let (min, max) = (lon.min(), lon.max());
    let new_lons = match current {
        LongitudeConvention::Signed => linspace(min + 180.0, max + 180.0, nx),
        LongitudeConvention::Positive => linspace(min - 180.0, max - 180.0, nx),
    };

    let shift = nx / 2;
    let order: Vec<usize> = (0..nx).map(|i| (i + nx - shift) % nx).collect();
    let mut flipped = field.select_along(axis, &order);
    flipped.coords[axis].values = new_lons;
    flipped
        .attributes
        .insert("original_lons".to_string(), format!("{:?}", lon.values));
    Ok((flipped, current.opposite()))
}

/// Even length, uniform spacing, and `nx * dx == 360`
fn check_global(lon: &Coordinate) -> Result<()> {
    let nx = lon.len();
    if nx < 2 || nx % 2 != 0 {
        return Err(ClimVisError::NonGlobalGrid {
            message: format!("'{}' has {nx} points, need an even count", lon.name),
        });
    }
    let dx = lon.values[1] - lon.values[0];
    if lon.values.windows(2).any(|w| !approx_eq(w[1] - w[0], dx, 1e-6)) {
        return Err(ClimVisError::NonGlobalGrid {
            message: format!("'{}' is not uniformly spaced", lon.name),
        });
    }
    if !approx_eq(dx * nx as f64, 360.0, 1e-6) {
        return Err(ClimVisError::NonGlobalGrid {
            message: format!(
                "'{}' covers {} degrees, expected 360",
                lon.name,
                dx * nx as f64
            ),
        });
    }
    Ok(())
}

/// Bracketing indices and weight of `x` on an ascending axis
fn bracket(axis: &[f64], x: f64) -> Option<(usize, usize, f64)> {
    let n = axis.len();
    if n == 0 || x.is_nan() || x < axis[0] || x > axis[n - 1] {
        return None;
    }
    if n == 1 {
        return Some((0, 0, 0.0));
    }
    let hi = axis.partition_point(|v| *v < x).clamp(1, n - 1);
    let lo = hi - 1;
    let span = axis[hi] - axis[lo];
    let w = if span > 0.0 { (x - axis[lo]) / span } else { 0.0 };
    Some((lo, hi, w))
}

/// Widest interval of `axis` that still counts as one grid cell.
///
/// A regional grid that crosses the 0 or 180 meridian is split in two by a
/// relabel flip; the interval across that gap is far wider than the median
/// spacing and must not be interpolated across.
fn max_cell_span(axis: &[f64]) -> f64 {
    let mut spans: Vec<f64> = axis.windows(2).map(|w| w[1] - w[0]).collect();
    if spans.is_empty() {
        return f64::INFINITY;
    }
    spans.sort_by(f64::total_cmp);
    spans[spans.len() / 2] * 1.5
}

/// Ascending view of a monotonic coordinate: values plus the index map back
fn ascending(coord: &Coordinate) -> Result<(Vec<f64>, Vec<usize>)> {
    let n = coord.len();
    if coord.is_increasing() {
        Ok((coord.values.clone(), (0..n).collect()))
    } else if coord.is_decreasing() {
        Ok((
            coord.values.iter().rev().copied().collect(),
            (0..n).rev().collect(),
        ))
    } else {
        Err(ClimVisError::InvalidCoordinate {
            name: coord.name.clone(),
            message: "coordinate must be monotonic for interpolation".to_string(),
        })
    }
}

fn overlaps(a: &Coordinate, b: &Coordinate) -> bool {
    a.min() <= b.max() && b.min() <= a.max()
}

/// Regrid `field` onto the horizontal grid of `reference`.
///
/// If the longitude conventions differ (sign of the minimum longitude),
/// `field` is flipped first with `method`. Horizontal axes take the
/// reference's names; values are bilinearly interpolated, NaN outside the
/// source domain. Non-horizontal axes are kept as they are.
///
/// # Errors
///
/// - `CoordinateNotFound` if either field lacks horizontal axes
/// - `DisjointDomains` if the grids do not overlap
/// - errors from [`flip_longitude`]
pub fn regrid_like(
    reference: &GriddedField,
    field: &GriddedField,
    method: FlipMethod,
) -> Result<GriddedField> {
    let (x_ref, y_ref) = reference.xy_coords()?;
    let (x_var, _) = field.xy_coords()?;

    let source = if x_ref.min().signum() != x_var.min().signum() {
        tracing::debug!(variable = %field.name, "longitude conventions differ, flipping");
        flip_longitude(field, method)?
    } else {
        field.clone()
    };

    let x_axis = source.axis_for(AxisRole::X)?;
    let y_axis = source.axis_for(AxisRole::Y)?;
    let (x_src, y_src) = (&source.coords[x_axis], &source.coords[y_axis]);

    if !overlaps(x_src, x_ref) || !overlaps(y_src, y_ref) {
        return Err(ClimVisError::DisjointDomains {
            message: format!(
                "source lon [{}, {}] lat [{}, {}] vs target lon [{}, {}] lat [{}, {}]",
                x_src.min(),
                x_src.max(),
                y_src.min(),
                y_src.max(),
                x_ref.min(),
                x_ref.max(),
                y_ref.min(),
                y_ref.max()
            ),
        });
    }

    let (xs, x_map) = ascending(x_src)?;
    let (ys, y_map) = ascending(y_src)?;
    let x_limit = max_cell_span(&xs);
    let x_brackets: Vec<_> = x_ref
        .values
        .iter()
        .map(|&x| bracket(&xs, x).filter(|&(lo, hi, _)| xs[hi] - xs[lo] <= x_limit))
        .collect();
    let y_brackets: Vec<_> = y_ref.values.iter().map(|&y| bracket(&ys, y)).collect();

    let mut out_shape = source.data.shape().to_vec();
    out_shape[x_axis] = x_ref.len();
    out_shape[y_axis] = y_ref.len();

    let data = ArrayD::from_shape_fn(IxDyn(&out_shape), |idx| {
        let (Some((x0, x1, wx)), Some((y0, y1, wy))) = (x_brackets[idx[x_axis]], y_brackets[idx[y_axis]]) else {
            return f64::NAN;
        };
        let mut src = idx.slice().to_vec();
        let mut sample = |yi: usize, xi: usize| {
            src[y_axis] = y_map[yi];
            src[x_axis] = x_map[xi];
            source.data[IxDyn(&src)]
        };
        let bottom = sample(y0, x0) * (1.0 - wx) + sample(y0, x1) * wx;
        let top = sample(y1, x0) * (1.0 - wx) + sample(y1, x1) * wx;
        bottom * (1.0 - wy) + top * wy
    });

    let mut coords = source.coords.clone();
    coords[x_axis] = x_ref.clone();
    coords[y_axis] = y_ref.clone();
    let mut regridded = GriddedField::new(source.name.clone(), data, coords)?;
    regridded.attributes = source.attributes.clone();
    tracing::info!(
        variable = %field.name,
        target = %reference.name,
        nlon = x_ref.len(),
        nlat = y_ref.len(),
        "regridded"
    );
    Ok(regridded)
}

/// Thin a field along both horizontal axes, keeping every `step`-th point.
///
/// Used to keep vector (quiver) plots legible on fine grids.
///
/// # Errors
///
/// Returns `CoordinateNotFound` for missing horizontal axes and
/// `InvalidConfig` for `step == 0`.
pub fn subsample_horizontal(field: &GriddedField, step: usize) -> Result<GriddedField> {
    if step == 0 {
        return Err(ClimVisError::InvalidConfig {
            message: "subsampling step must be at least 1".to_string(),
        });
    }
    let mut thinned = field.clone();
    for role in [AxisRole::X, AxisRole::Y] {
        let axis = thinned.axis_for(role)?;
        let keep: Vec<usize> = (0..thinned.data.len_of(Axis(axis))).step_by(step).collect();
        thinned = thinned.select_along(axis, &keep);
    }
    Ok(thinned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn global_field(lons: Vec<f64>) -> GriddedField {
        let lats = vec![-60.0, 0.0, 60.0];
        let data = ArrayD::from_shape_fn(IxDyn(&[lats.len(), lons.len()]), |idx| {
            lats[idx[0]] * 1000.0 + lons[idx[1]]
        });
        GriddedField::new(
            "ts",
            data,
            vec![Coordinate::new("lat", lats), Coordinate::new("lon", lons)],
        )
        .unwrap()
    }

    #[test]
    fn detects_conventions() {
        assert_eq!(
            LongitudeConvention::detect(&[-180.0, 0.0, 90.0]).unwrap(),
            LongitudeConvention::Signed
        );
        assert_eq!(
            LongitudeConvention::detect(&[0.0, 180.0, 270.0]).unwrap(),
            LongitudeConvention::Positive
        );
        assert!(LongitudeConvention::detect(&[0.0, 90.0]).is_err());
        assert!(LongitudeConvention::detect(&[-10.0, 200.0]).is_err());
    }

    #[test]
    fn relabel_flip_sorts_and_keeps_values_attached() {
        let field = global_field(vec![-180.0, -90.0, 0.0, 90.0]);
        let flipped = flip_longitude(&field, FlipMethod::Relabel).unwrap();
        assert_eq!(flipped.coords[1].values, vec![0.0, 90.0, 180.0, 270.0]);
        // data value encodes its original longitude
        assert_eq!(flipped.data[[1, 2]], -180.0);
        assert_eq!(flipped.data[[1, 3]], -90.0);
        assert!(flipped.attributes["history"].contains("0:360"));
    }

    #[test]
    fn relabel_flip_is_an_involution() {
        let lons: Vec<f64> = (0..72).map(|i| -180.0 + 5.0 * i as f64).collect();
        let field = global_field(lons.clone());
        let there = flip_longitude(&field, FlipMethod::Relabel).unwrap();
        let back = flip_longitude(&there, FlipMethod::Relabel).unwrap();
        for (a, b) in back.coords[1].values.iter().zip(&lons) {
            assert_relative_eq!(*a, *b, epsilon = 1e-9);
        }
        assert_eq!(back.data, field.data);
    }

    #[test]
    fn roll_flip_on_global_grid() {
        let lons: Vec<f64> = (0..8).map(|i| 45.0 * i as f64).collect();
        let field = global_field(lons);
        let flipped = flip_longitude(&field, FlipMethod::Roll).unwrap();
        assert_eq!(flipped.coords[1].values[0], -180.0);
        // first column now holds what was at 180
        assert_eq!(flipped.data[[1, 0]], 180.0);
    }

    #[test]
    fn roll_flip_rejects_regional_grid() {
        let field = global_field(vec![190.0, 200.0, 210.0, 220.0]);
        assert!(matches!(
            flip_longitude(&field, FlipMethod::Roll),
            Err(ClimVisError::NonGlobalGrid { .. })
        ));
        let odd = global_field((0..9).map(|i| 40.0 * i as f64).collect());
        assert!(matches!(
            flip_longitude(&odd, FlipMethod::Roll),
            Err(ClimVisError::NonGlobalGrid { .. })
        ));
    }

    #[test]
    fn flip_requires_monotonic_longitudes() {
        let field = global_field(vec![0.0, 90.0, 45.0, 270.0]);
        assert!(matches!(
            flip_longitude(&field, FlipMethod::Relabel),
            Err(ClimVisError::InvalidCoordinate { .. })
        ));
    }

    #[test]
    fn regrid_onto_own_grid_is_identity() {
        let field = global_field(vec![0.0, 90.0, 180.0, 270.0]);
        let regridded = regrid_like(&field, &field, FlipMethod::Relabel).unwrap();
        assert_eq!(regridded.data, field.data);
    }

    #[test]
    fn regrid_interpolates_bilinearly() {
        let source = global_field(vec![0.0, 90.0, 180.0, 270.0]);
        let target = GriddedField::new(
            "grid",
            ArrayD::zeros(IxDyn(&[2, 2])),
            vec![
                Coordinate::new("latitude", vec![-30.0, 30.0]),
                Coordinate::new("longitude", vec![45.0, 135.0]),
            ],
        )
        .unwrap();
        let regridded = regrid_like(&target, &source, FlipMethod::Relabel).unwrap();
        assert_eq!(regridded.dim_names(), vec!["latitude", "longitude"]);
        assert_relative_eq!(regridded.data[[0, 0]], -30_000.0 + 45.0, epsilon = 1e-9);
        assert_relative_eq!(regridded.data[[1, 1]], 30_000.0 + 135.0, epsilon = 1e-9);
    }

    #[test]
    fn regrid_flips_mismatched_conventions() {
        let source = global_field(vec![-180.0, -90.0, 0.0, 90.0]);
        let target = global_field(vec![0.0, 90.0, 180.0, 270.0]);
        let regridded = regrid_like(&target, &source, FlipMethod::Relabel).unwrap();
        assert_eq!(regridded.data[[0, 1]], -60_000.0 + 90.0);
        assert_eq!(regridded.data[[0, 2]], -60_000.0 - 180.0);
        assert_eq!(regridded.data[[0, 3]], -60_000.0 - 90.0);
    }

    #[test]
    fn regrid_leaves_gap_of_seam_crossing_source_empty() {
        let lons: Vec<f64> = (0..9).map(|i| -20.0 + 5.0 * i as f64).collect();
        let source = global_field(lons);
        let target = GriddedField::new(
            "grid",
            ArrayD::zeros(IxDyn(&[1, 3])),
            vec![
                Coordinate::new("lat", vec![0.0]),
                Coordinate::new("lon", vec![10.0, 180.0, 350.0]),
            ],
        )
        .unwrap();
        let regridded = regrid_like(&target, &source, FlipMethod::Relabel).unwrap();
        assert_relative_eq!(regridded.data[[0, 0]], 10.0, epsilon = 1e-9);
        assert!(regridded.data[[0, 1]].is_nan());
        assert_relative_eq!(regridded.data[[0, 2]], -10.0, epsilon = 1e-9);
    }

    #[test]
    fn regrid_rejects_disjoint_domains() {
        let source = global_field(vec![0.0, 10.0, 20.0]);
        let target = global_field(vec![100.0, 110.0, 120.0]);
        assert!(matches!(
            regrid_like(&target, &source, FlipMethod::Relabel),
            Err(ClimVisError::DisjointDomains { .. })
        ));
    }

    #[test]
    fn subsample_keeps_every_nth_point() {
        let field = global_field((0..8).map(|i| 45.0 * i as f64).collect());
        let thinned = subsample_horizontal(&field, 2).unwrap();
        assert_eq!(thinned.data.shape(), &[2, 4]);
        assert_eq!(thinned.coords[1].values, vec![0.0, 90.0, 180.0, 270.0]);
        assert!(subsample_horizontal(&field, 0).is_err());
    }
}
