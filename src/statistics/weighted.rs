//! Area-weighted and zonal means
//!
//! Grid cells shrink toward the poles, so spatial means weight each latitude
//! row by `cos(latitude)`.

use super::parallel::{parallel_mean_axis, parallel_weighted_mean_axis};
use crate::errors::{ClimVisError, Result};
use crate::field::{AxisRole, Coordinate, GriddedField};
use ndarray::Axis;

/// Which horizontal axes a weighted mean collapses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WeightedReduction {
    /// Collapse latitude only, e.g. zonal-mean `[time x lat]` data
    Latitude,
    /// Collapse latitude and longitude
    #[default]
    LatitudeLongitude,
}

/// Per-latitude weights `cos(lat)`.
///
/// # Errors
///
/// Returns `InvalidCoordinate` for latitudes outside `[-90, 90]`, which
/// would produce negative weights.
pub fn latitude_weights(lat: &Coordinate) -> Result<Vec<f64>> {
    if let Some(bad) = lat.values.iter().find(|v| !(-90.0..=90.0).contains(*v)) {
        return Err(ClimVisError::InvalidCoordinate {
            name: lat.name.clone(),
            message: format!("latitude {bad} outside [-90, 90]"),
        });
    }
    Ok(lat
        .values
        .iter()
        .map(|v| v.to_radians().cos().max(0.0))
        .collect())
}

/// Latitude-weighted mean of a field.
///
/// The result is a weighted arithmetic mean: the denominator is the sum of
/// the weights of the non-missing samples. Other axes are kept.
///
/// # Errors
///
/// Returns `CoordinateNotFound` if a required horizontal axis is missing and
/// `InvalidCoordinate` for out-of-range latitudes.
pub fn latitude_weighted_mean(
    field: &GriddedField,
    reduction: WeightedReduction,
) -> Result<GriddedField> {
    let lat_axis = field.axis_for(AxisRole::Y)?;
    let weights = latitude_weights(&field.coords[lat_axis])?;

    match reduction {
        WeightedReduction::Latitude => {
            let data = parallel_weighted_mean_axis(&field.data, lat_axis, &weights)?;
            tracing::debug!(variable = %field.name, "area-weighted mean over lat");
            Ok(field.with_axis_removed(lat_axis, data))
        }
        WeightedReduction::LatitudeLongitude => {
            let lon_axis = field.axis_for(AxisRole::X)?;
            tracing::debug!(variable = %field.name, "area-weighted mean over lat/lon");
            weighted_over_lat_lon(field, lat_axis, lon_axis, &weights)
        }
    }
}

fn weighted_over_lat_lon(
    field: &GriddedField,
    lat_axis: usize,
    lon_axis: usize,
    weights: &[f64],
) -> Result<GriddedField> {
    // Merge lat and lon into one trailing axis so a single weighted mean
    // handles missing cells correctly.
    let rest: Vec<usize> = (0..field.data.ndim())
        .filter(|&a| a != lat_axis && a != lon_axis)
        .collect();
    let mut order = rest.clone();
    order.push(lat_axis);
    order.push(lon_axis);

    let permuted = field.data.view().permuted_axes(order);
    let nlat = field.data.len_of(Axis(lat_axis));
    let nlon = field.data.len_of(Axis(lon_axis));
    let mut shape: Vec<usize> = rest.iter().map(|&a| field.data.len_of(Axis(a))).collect();
    shape.push(nlat * nlon);

    let merged = permuted
        .as_standard_layout()
        .into_owned()
        .into_shape(shape.clone())?;
    let cell_weights: Vec<f64> = weights
        .iter()
        .flat_map(|&w| std::iter::repeat(w).take(nlon))
        .collect();
    let data = parallel_weighted_mean_axis(&merged, shape.len() - 1, &cell_weights)?;

    let coords = rest.iter().map(|&a| field.coords[a].clone()).collect();
    let mut reduced = GriddedField::new(field.name.clone(), data, coords)?;
    reduced.attributes = field.attributes.clone();
    Ok(reduced)
}

/// Unweighted mean over longitude (zonal mean).
///
/// # Errors
///
/// Returns `CoordinateNotFound` if the field has no longitude axis.
pub fn zonal_mean(field: &GriddedField) -> Result<GriddedField> {
    let lon_axis = field.axis_for(AxisRole::X)?;
    let data = parallel_mean_axis(&field.data, lon_axis)?;
    Ok(field.with_axis_removed(lon_axis, data))
}
