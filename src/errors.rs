//! Centralized error handling for ClimVis
//!
//! Every failure is raised where it is detected, as one of the structured
//! variants below, instead of surfacing later from half-initialized state.

use thiserror::Error;

/// Main error type for ClimVis operations
#[derive(Debug, Error)]
pub enum ClimVisError {
    /// Field key with no preset style
    #[error("Field '{field}' not recognized")]
    UnknownField { field: String },

    /// A coordinate with the requested role is missing from the field
    #[error("No {axis} coordinate found on variable '{variable}'")]
    CoordinateNotFound { axis: String, variable: String },

    /// Longitude values do not identify a single convention
    #[error("Ambiguous longitude convention: {message}")]
    AmbiguousLongitude { message: String },

    /// Grid is not a uniformly spaced, global longitude axis
    #[error("Grid is not global: {message}")]
    NonGlobalGrid { message: String },

    /// Source and target grids do not overlap
    #[error("Disjoint domains: {message}")]
    DisjointDomains { message: String },

    /// Samples or fields with incompatible sizes
    #[error("Sample size mismatch: {message}")]
    SampleSizeMismatch { message: String },

    /// Coordinate values outside their physical range or not monotonic
    #[error("Invalid coordinate '{name}': {message}")]
    InvalidCoordinate { name: String, message: String },

    /// Month axis that is not a 12-step climatology
    #[error("Invalid climatology: {message}")]
    InvalidClimatology { message: String },

    /// Bad colormap clip range or sample count
    #[error("Invalid colormap: {message}")]
    InvalidColormap { message: String },

    /// Configuration value out of range
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// Statistics computation errors
    #[error("Statistics computation error: {0}")]
    StatisticsError(String),

    /// Thread pool configuration error
    #[error("Thread pool error: {0}")]
    ThreadPoolError(String),

    /// Variable not found in NetCDF file
    #[error("Variable '{var}' not found in file")]
    VariableNotFound { var: String },

    /// NetCDF file operation errors
    #[error("NetCDF error: {0}")]
    NetCDFError(#[from] netcdf::Error),

    /// I/O operation errors
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Array shape or dimension error
    #[error("Array error: {0}")]
    ArrayError(#[from] ndarray::ShapeError),

    /// Configuration file parse error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Result type alias for ClimVis operations
pub type Result<T> = std::result::Result<T, ClimVisError>;
