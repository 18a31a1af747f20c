//! Season selection for monthly climatologies
//!
//! A [`Season`] names the months averaged to produce a seasonal or annual
//! mean. `None` in an `Option<Season>` means "no seasonal reduction".

use crate::errors::{ClimVisError, Result};
use crate::field::{AxisRole, GriddedField};
use crate::statistics::parallel::parallel_mean_axis;
use std::fmt;
use std::str::FromStr;

/// Season tokens understood by the plotting helpers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Season {
    /// Annual mean, all twelve months
    Annual,
    Djf,
    Jfm,
    Mam,
    Jja,
    Jjas,
    Jas,
    Son,
}

/// The four meteorological seasons in calendar order
pub const METEOROLOGICAL_SEASONS: [Season; 4] = [Season::Djf, Season::Mam, Season::Jja, Season::Son];

impl Season {
    /// Month indices (0 = January) averaged for this season
    #[must_use]
    pub const fn months(self) -> &'static [usize] {
        match self {
            Self::Annual => &[0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11],
            Self::Djf => &[0, 1, 11],
            Self::Jfm => &[0, 1, 2],
            Self::Mam => &[2, 3, 4],
            Self::Jja => &[5, 6, 7],
            Self::Jjas => &[5, 6, 7, 8],
            Self::Jas => &[6, 7, 8],
            Self::Son => &[8, 9, 10],
        }
    }

    /// Canonical upper-case token
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Annual => "ANN",
            Self::Djf => "DJF",
            Self::Jfm => "JFM",
            Self::Mam => "MAM",
            Self::Jja => "JJA",
            Self::Jjas => "JJAS",
            Self::Jas => "JAS",
            Self::Son => "SON",
        }
    }

    /// Meteorological season (DJF/MAM/JJA/SON) a 1-based calendar month belongs to
    #[must_use]
    pub const fn of_month(month: u32) -> Self {
        match month {
            12 | 1 | 2 => Self::Djf,
            3..=5 => Self::Mam,
            6..=8 => Self::Jja,
            _ => Self::Son,
        }
    }

    /// Parse a token, treating anything unrecognized as the annual mean.
    #[must_use]
    pub fn parse_lenient(token: &str) -> Self {
        token.parse().unwrap_or_else(|_| {
            tracing::warn!(token, "unrecognized season, using annual mean");
            Self::Annual
        })
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Season {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ANN" | "ANNUAL" => Ok(Self::Annual),
            "DJF" => Ok(Self::Djf),
            "JFM" => Ok(Self::Jfm),
            "MAM" => Ok(Self::Mam),
            "JJA" => Ok(Self::Jja),
            "JJAS" => Ok(Self::Jjas),
            "JAS" => Ok(Self::Jas),
            "SON" => Ok(Self::Son),
            other => Err(format!("Unknown season '{other}'")),
        }
    }
}

/// Months selected by an optional season token.
///
/// `None` returns `None`: the caller should not reduce over time. Unknown
/// tokens select the annual mean.
#[must_use]
pub fn season_months(season: Option<&str>) -> Option<&'static [usize]> {
    season.map(|token| Season::parse_lenient(token).months())
}

/// Average a 12-month climatology over the months of `season`.
///
/// The month axis is located by role (see [`AxisRole::T`]) and removed from
/// the result. With `season == None` the field is returned unchanged.
///
/// # Errors
///
/// Returns `CoordinateNotFound` if the field has no month axis and
/// `InvalidClimatology` if that axis does not hold twelve months.
pub fn season_average(field: &GriddedField, season: Option<Season>) -> Result<GriddedField> {
    let Some(season) = season else {
        return Ok(field.clone());
    };

    let axis = field.axis_for(AxisRole::T)?;
    let n_months = field.data.shape()[axis];
    if n_months != 12 {
        return Err(ClimVisError::InvalidClimatology {
            message: format!(
                "axis '{}' of '{}' has {n_months} steps, expected 12",
                field.coords[axis].name, field.name
            ),
        });
    }

    let selected = field.select_along(axis, season.months());
    let mean = parallel_mean_axis(&selected.data, axis)?;
    tracing::debug!(variable = %field.name, %season, "seasonal average");
    Ok(field.with_axis_removed(axis, mean))
}
