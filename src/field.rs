//! Labeled gridded fields
//!
//! A [`GriddedField`] is an `ndarray` of samples plus one [`Coordinate`] per
//! dimension and a set of string attributes. Horizontal and time axes are
//! located by their semantic role rather than by a hardcoded name.

use crate::errors::{ClimVisError, Result};
use ndarray::{ArrayD, Axis};
use std::collections::BTreeMap;

/// Semantic role of a coordinate axis
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxisRole {
    /// Longitude / x
    X,
    /// Latitude / y
    Y,
    /// Time or month of a climatology
    T,
}

impl AxisRole {
    /// CF `axis` attribute value for this role
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::X => "X",
            Self::Y => "Y",
            Self::T => "T",
        }
    }

    fn units(self) -> &'static [&'static str] {
        match self {
            Self::X => &[
                "degrees_east",
                "degree_east",
                "degree_e",
                "degrees_e",
                "degreee",
                "degreese",
            ],
            Self::Y => &[
                "degrees_north",
                "degree_north",
                "degree_n",
                "degrees_n",
                "degreen",
                "degreesn",
            ],
            Self::T => &[],
        }
    }

    fn standard_names(self) -> &'static [&'static str] {
        match self {
            Self::X => &["longitude", "grid_longitude", "projection_x_coordinate"],
            Self::Y => &["latitude", "grid_latitude", "projection_y_coordinate"],
            Self::T => &["time"],
        }
    }

    fn names(self) -> &'static [&'static str] {
        match self {
            Self::X => &["lon", "longitude", "x", "nav_lon", "xt_ocean", "lon_rho"],
            Self::Y => &["lat", "latitude", "y", "nav_lat", "yt_ocean", "lat_rho"],
            Self::T => &["time", "month", "t", "year"],
        }
    }
}

/// A 1-D coordinate attached to one dimension of a field
#[derive(Debug, Clone, PartialEq)]
pub struct Coordinate {
    pub name: String,
    pub values: Vec<f64>,
    pub attributes: BTreeMap<String, String>,
}

impl Coordinate {
    /// Create a coordinate without attributes
    pub fn new(name: impl Into<String>, values: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            values,
            attributes: BTreeMap::new(),
        }
    }

    /// Builder-style attribute setter
    #[must_use]
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Smallest value ignoring NaN, NaN for an empty coordinate
    #[must_use]
    pub fn min(&self) -> f64 {
        self.values.iter().copied().fold(f64::NAN, f64::min)
    }

    /// Largest value ignoring NaN, NaN for an empty coordinate
    #[must_use]
    pub fn max(&self) -> f64 {
        self.values.iter().copied().fold(f64::NAN, f64::max)
    }

    /// Whether the values are strictly increasing
    #[must_use]
    pub fn is_increasing(&self) -> bool {
        self.values.windows(2).all(|w| w[1] > w[0])
    }

    /// Whether the values are strictly decreasing
    #[must_use]
    pub fn is_decreasing(&self) -> bool {
        self.values.windows(2).all(|w| w[1] < w[0])
    }

    /// Score how strongly this coordinate matches a role. Zero means no match.
    fn role_score(&self, role: AxisRole) -> u8 {
        if let Some(axis) = self.attributes.get("axis") {
            if axis.eq_ignore_ascii_case(role.as_str()) {
                return 4;
            }
        }
        if let Some(units) = self.attributes.get("units") {
            let units = units.to_ascii_lowercase();
            if role.units().contains(&units.as_str()) {
                return 3;
            }
            if role == AxisRole::T && units.contains(" since ") {
                return 3;
            }
        }
        if let Some(standard_name) = self.attributes.get("standard_name") {
            if role.standard_names().contains(&standard_name.as_str()) {
                return 2;
            }
        }
        let name = self.name.to_ascii_lowercase();
        if role.names().contains(&name.as_str()) {
            return 1;
        }
        0
    }
}

/// A gridded geophysical field with its coordinates and attributes
#[derive(Debug, Clone)]
pub struct GriddedField {
    pub name: String,
    pub data: ArrayD<f64>,
    pub coords: Vec<Coordinate>,
    pub attributes: BTreeMap<String, String>,
}

impl GriddedField {
    /// Create a field, checking that there is one coordinate per dimension
    /// and that each coordinate matches its dimension length.
    ///
    /// # Errors
    ///
    /// Returns `SampleSizeMismatch` when coordinates and data disagree.
    pub fn new(name: impl Into<String>, data: ArrayD<f64>, coords: Vec<Coordinate>) -> Result<Self> {
        let name = name.into();
        if coords.len() != data.ndim() {
            return Err(ClimVisError::SampleSizeMismatch {
                message: format!(
                    "variable '{name}' has {} dimensions but {} coordinates",
                    data.ndim(),
                    coords.len()
                ),
            });
        }
        for (coord, &len) in coords.iter().zip(data.shape()) {
            if coord.len() != len {
                return Err(ClimVisError::SampleSizeMismatch {
                    message: format!(
                        "coordinate '{}' has {} values but dimension length is {len}",
                        coord.name,
                        coord.len()
                    ),
                });
            }
        }
        Ok(Self {
            name,
            data,
            coords,
            attributes: BTreeMap::new(),
        })
    }

    /// Builder-style attribute setter
    #[must_use]
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Physical units, if recorded
    #[must_use]
    pub fn units(&self) -> Option<&str> {
        self.attributes.get("units").map(String::as_str)
    }

    /// Dimension names in axis order
    #[must_use]
    pub fn dim_names(&self) -> Vec<String> {
        self.coords.iter().map(|c| c.name.clone()).collect()
    }

    /// Axis index of the dimension with the given name
    #[must_use]
    pub fn axis_of(&self, name: &str) -> Option<usize> {
        self.coords.iter().position(|c| c.name == name)
    }

    /// Locate the axis playing `role`, preferring explicit metadata over names.
    ///
    /// # Errors
    ///
    /// Returns `CoordinateNotFound` when no coordinate matches.
    pub fn axis_for(&self, role: AxisRole) -> Result<usize> {
        self.coords
            .iter()
            .enumerate()
            .map(|(i, c)| (i, c.role_score(role)))
            .filter(|&(_, score)| score > 0)
            .max_by_key(|&(i, score)| (score, std::cmp::Reverse(i)))
            .map(|(i, _)| i)
            .ok_or_else(|| ClimVisError::CoordinateNotFound {
                axis: role.as_str().to_string(),
                variable: self.name.clone(),
            })
    }

    /// Horizontal coordinates as `(x / longitude, y / latitude)`.
    ///
    /// # Errors
    ///
    /// Returns `CoordinateNotFound` when either axis is missing.
    pub fn xy_coords(&self) -> Result<(&Coordinate, &Coordinate)> {
        let x = self.axis_for(AxisRole::X)?;
        let y = self.axis_for(AxisRole::Y)?;
        Ok((&self.coords[x], &self.coords[y]))
    }

    /// Copy of this field with `axis` removed from data and coordinates.
    pub(crate) fn with_axis_removed(&self, axis: usize, data: ArrayD<f64>) -> Self {
        let mut coords = self.coords.clone();
        coords.remove(axis);
        Self {
            name: self.name.clone(),
            data,
            coords,
            attributes: self.attributes.clone(),
        }
    }

    /// Copy of this field with samples along `axis` taken in `indices` order
    pub(crate) fn select_along(&self, axis: usize, indices: &[usize]) -> Self {
        let data = self.data.select(Axis(axis), indices);
        let mut coords = self.coords.clone();
        coords[axis].values = indices.iter().map(|&i| self.coords[axis].values[i]).collect();
        Self {
            name: self.name.clone(),
            data,
            coords,
            attributes: self.attributes.clone(),
        }
    }

    /// Append a line to the `history` attribute
    pub(crate) fn push_history(&mut self, message: String) {
        let history = match self.attributes.get("history") {
            Some(previous) if !previous.is_empty() => format!("{previous}\n{message}"),
            _ => message,
        };
        self.attributes.insert("history".to_string(), history);
    }
}
