//! Statistical reductions over gridded fields
//!
//! - [`parallel`]: rayon-backed (weighted) means along one axis
//! - [`weighted`]: cos-latitude area means and zonal means
//! - [`seasonal`]: calendar-aware, day-weighted seasonal means
//! - [`significance`]: paired and Welch t-tests per grid point

pub mod parallel;
pub mod seasonal;
pub mod significance;
pub mod weighted;

pub use parallel::{parallel_mean_axis, parallel_weighted_mean_axis};
pub use seasonal::{annual_season_means, season_climatology};
pub use significance::{
    paired_t_test, significance_test, welch_t_test, SignificanceResult, TTest, TestKind,
    DEFAULT_SIGNIFICANCE_LEVEL,
};
pub use weighted::{latitude_weighted_mean, latitude_weights, zonal_mean, WeightedReduction};
