//! Calendar-aware seasonal averaging of monthly time series
//!
//! Each month contributes in proportion to its length in days under the
//! series' calendar, rather than a flat third of the season.

use super::parallel::parallel_weighted_mean_axis;
use crate::calendar::{Calendar, MonthStamp};
use crate::errors::{ClimVisError, Result};
use crate::field::{AxisRole, Coordinate, GriddedField};
use crate::season::{Season, METEOROLOGICAL_SEASONS};
use ndarray::{stack, ArrayD, Axis};
use std::collections::BTreeMap;

fn time_axis(field: &GriddedField, stamps: &[MonthStamp]) -> Result<usize> {
    let axis = field.axis_for(AxisRole::T)?;
    let steps = field.data.len_of(Axis(axis));
    if stamps.len() != steps {
        return Err(ClimVisError::SampleSizeMismatch {
            message: format!(
                "{} month stamps for a time axis of {steps} steps",
                stamps.len()
            ),
        });
    }
    if let Some(bad) = stamps.iter().find(|s| !(1..=12).contains(&s.month)) {
        return Err(ClimVisError::InvalidCoordinate {
            name: field.coords[axis].name.clone(),
            message: format!("month {} of year {} out of range", bad.month, bad.year),
        });
    }
    Ok(axis)
}

/// Day-weighted mean over the time steps in `indices`, time axis removed
fn weighted_mean_of(
    field: &GriddedField,
    axis: usize,
    stamps: &[MonthStamp],
    indices: &[usize],
    calendar: Calendar,
) -> Result<ArrayD<f64>> {
    let weights: Vec<f64> = indices
        .iter()
        .map(|&i| f64::from(calendar.days_in_month(stamps[i].year, stamps[i].month)))
        .collect();
    let selected = field.data.select(Axis(axis), indices);
    parallel_weighted_mean_axis(&selected, axis, &weights)
}

/// Climatological DJF/MAM/JJA/SON means, each month weighted by its length.
///
/// Seasons with no months in the series are absent from the result.
///
/// # Errors
///
/// Returns `CoordinateNotFound` if the field has no time axis and
/// `SampleSizeMismatch` if `stamps` does not match its length.
pub fn season_climatology(
    field: &GriddedField,
    stamps: &[MonthStamp],
    calendar: Calendar,
) -> Result<BTreeMap<Season, GriddedField>> {
    let axis = time_axis(field, stamps)?;
    let mut means = BTreeMap::new();
    for season in METEOROLOGICAL_SEASONS {
        let indices: Vec<usize> = stamps
            .iter()
            .enumerate()
            .filter(|(_, s)| Season::of_month(s.month) == season)
            .map(|(i, _)| i)
            .collect();
        if indices.is_empty() {
            continue;
        }
        let data = weighted_mean_of(field, axis, stamps, &indices, calendar)?;
        means.insert(season, field.with_axis_removed(axis, data));
    }
    tracing::debug!(variable = %field.name, %calendar, seasons = means.len(), "seasonal climatology");
    Ok(means)
}

/// Year-by-year DJF/MAM/JJA/SON means, each month weighted by its length.
///
/// December belongs to the following year's DJF. A DJF group without its
/// December (the first winter of a series starting in January) is dropped,
/// as is a trailing group holding only December. The time axis is replaced
/// by a `year` axis at the same position.
///
/// # Errors
///
/// Returns `CoordinateNotFound` if the field has no time axis and
/// `SampleSizeMismatch` if `stamps` does not match its length.
pub fn annual_season_means(
    field: &GriddedField,
    stamps: &[MonthStamp],
    calendar: Calendar,
) -> Result<BTreeMap<Season, GriddedField>> {
    let axis = time_axis(field, stamps)?;
    let mut series = BTreeMap::new();

    for season in METEOROLOGICAL_SEASONS {
        let mut groups: BTreeMap<i32, Vec<usize>> = BTreeMap::new();
        for (i, stamp) in stamps.iter().enumerate() {
            if Season::of_month(stamp.month) != season {
                continue;
            }
            let season_year = if stamp.month == 12 { stamp.year + 1 } else { stamp.year };
            groups.entry(season_year).or_default().push(i);
        }

        if season == Season::Djf {
            groups.retain(|year, indices| {
                let has_december = indices.iter().any(|&i| stamps[i].month == 12);
                let has_winter = indices.iter().any(|&i| stamps[i].month != 12);
                if !(has_december && has_winter) {
                    tracing::debug!(year, "dropping incomplete DJF");
                }
                has_december && has_winter
            });
        }
        if groups.is_empty() {
            continue;
        }

        let mut years = Vec::with_capacity(groups.len());
        let mut means = Vec::with_capacity(groups.len());
        for (year, indices) in &groups {
            years.push(f64::from(*year));
            means.push(weighted_mean_of(field, axis, stamps, indices, calendar)?);
        }
        let views: Vec<_> = means.iter().map(ArrayD::view).collect();
        let data = stack(Axis(axis), &views)?;

        let mut coords = field.coords.clone();
        coords[axis] = Coordinate::new("year", years);
        let mut result = GriddedField::new(field.name.clone(), data, coords)?;
        result.attributes = field.attributes.clone();
        series.insert(season, result);
    }
    Ok(series)
}
