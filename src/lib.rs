//! ClimVis: analysis and colour-scale helpers for climate-model fields
//!
//! A Rust library for preparing gridded climate-model output for plotting:
//! season selection, calendar-aware seasonal means, area-weighted means,
//! longitude convention conversion, regridding, significance testing, and
//! field-specific preset colour scales.
//!
//! ## Key Features
//!
//! - **Seasons**: month sets for ANN, DJF, JFM, MAM, JJA, JJAS, JAS and SON
//! - **Field styles**: tuned colormap, bounds and level count per field, for
//!   absolute and difference plots, with configurable overrides
//! - **Colormaps**: clipping, combining and `BoundaryNorm` discretization
//! - **Geography**: role-based coordinate lookup, longitude flips, bilinear regridding
//! - **Statistics**: cos-latitude weighted means, day-weighted seasonal means
//!   for every CF calendar, paired and Welch t-tests, computed in parallel with Rayon
//! - **NetCDF I/O**: fields read and written with coordinates and attributes
//!
//! ## Module Organization
//!
//! - [`field`]: gridded fields, coordinates and axis roles
//! - [`season`]: season tokens and climatology averaging
//! - [`style`]: field style presets and overrides
//! - [`colormap`]: colormaps and discretized color mapping
//! - [`geo`]: longitude conventions, flipping and regridding
//! - [`calendar`]: CF calendars and month lengths
//! - [`statistics`]: weighted, seasonal and significance computations
//! - [`netcdf_io`]: NetCDF reading and writing
//! - [`config`]: JSON configuration
//! - [`parallel`]: parallel processing configuration
//! - [`errors`]: centralized error handling
//!
//! ## Usage
//!
//! ```rust,no_run
//! use clim_vis::prelude::*;
//!
//! let file = netcdf::open("ts_monthly.nc").unwrap();
//! let ts = read_field(&file, "ts").unwrap();
//!
//! let stamps = MonthStamp::new(1979, 1).series(ts.data.shape()[0]);
//! let seasons = season_climatology(&ts, &stamps, Calendar::NoLeap).unwrap();
//! let djf_mean = latitude_weighted_mean(&seasons[&Season::Djf], WeightedReduction::default()).unwrap();
//!
//! let style = field_style("ts", false).unwrap();
//! println!("{} {} {}", style.colormap, style.vmin, style.vmax);
//! # let _ = djf_mean;
//! ```

pub mod calendar;
pub mod colormap;
pub mod config;
pub mod errors;
pub mod field;
pub mod geo;
pub mod netcdf_io;
pub mod parallel;
pub mod season;
pub mod statistics;
pub mod style;

mod utils;

pub use errors::{ClimVisError, Result};

/// Commonly used imports for convenience
pub mod prelude {
    pub use crate::calendar::{Calendar, MonthStamp};
    pub use crate::colormap::{
        clip_colormap, combine_colormaps, BoundaryNorm, ColorIndex, Colormap, ColormapRef, Rgba,
    };
    pub use crate::config::ClimVisConfig;
    pub use crate::errors::{ClimVisError, Result};
    pub use crate::field::{AxisRole, Coordinate, GriddedField};
    pub use crate::geo::{flip_longitude, regrid_like, subsample_horizontal, FlipMethod, LongitudeConvention};
    pub use crate::netcdf_io::{read_field, write_field};
    pub use crate::parallel::{ParallelConfig, ParallelInfo};
    pub use crate::season::{season_average, season_months, Season};
    pub use crate::statistics::{
        annual_season_means, latitude_weighted_mean, parallel_mean_axis, season_climatology,
        significance_test, zonal_mean, SignificanceResult, TestKind, WeightedReduction,
        DEFAULT_SIGNIFICANCE_LEVEL,
    };
    pub use crate::style::{custom_levels, default_colormap, field_style, Field, FieldStyle, StyleTable};
}
