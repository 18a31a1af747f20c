//! Defines command-line interface options using `clap` for the climvis binary.

use clap::{Args, Parser, Subcommand};
use clim_vis::calendar::{Calendar, MonthStamp};
use clim_vis::geo::FlipMethod;
use clim_vis::statistics::TestKind;
use std::path::PathBuf;

/// Utilities for climate-model fields stored in NetCDF files
#[derive(Parser, Debug)]
#[command(
    name = "climvis",
    version,
    about = "Seasonal and area-weighted means, longitude flips, regridding, significance tests and colour scales for climate fields"
)]
pub struct Cli {
    /// JSON configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Number of threads to use for parallel processing. Defaults to number of CPU cores.
    #[arg(short = 't', long, global = true)]
    pub threads: Option<usize>,

    /// Enable debug logging (overridden by RUST_LOG)
    #[arg(short, long, global = true, default_value_t = false)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Input variable and optional NetCDF output shared by field subcommands
#[derive(Args, Debug, Clone)]
pub struct FieldIo {
    /// Path to the NetCDF file
    #[arg(short, long)]
    pub file: PathBuf,

    /// Variable to process
    #[arg(long)]
    pub var: String,

    /// Path to save result as NetCDF. If not set, prints a summary.
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show the preset colour scale of a field
    Style {
        /// Field key or alias, e.g. sst, precip, prec
        field: String,

        /// Use the difference (anomaly) preset
        #[arg(long)]
        diff: bool,

        /// Print the bins and their colours
        #[arg(long)]
        levels: bool,
    },

    /// Average a 12-month climatology over a season (ANN, DJF, JFM, MAM, JJA, JJAS, JAS, SON)
    SeasonMean {
        #[command(flatten)]
        io: FieldIo,

        #[arg(long)]
        season: String,
    },

    /// Cos-latitude weighted mean over latitude and longitude
    WeightedMean {
        #[command(flatten)]
        io: FieldIo,

        /// Collapse latitude only
        #[arg(long)]
        lat_only: bool,
    },

    /// Mean over longitude
    ZonalMean {
        #[command(flatten)]
        io: FieldIo,
    },

    /// Convert longitudes between -180:180 and 0:360
    Flip {
        #[command(flatten)]
        io: FieldIo,

        /// relabel or roll; defaults to the configured method
        #[arg(long)]
        method: Option<FlipMethod>,
    },

    /// Bilinearly interpolate onto the grid of a reference variable
    Regrid {
        #[command(flatten)]
        io: FieldIo,

        /// NetCDF file holding the reference grid
        #[arg(long)]
        reference: PathBuf,

        /// Reference variable, defaults to --var
        #[arg(long)]
        reference_var: Option<String>,

        /// relabel or roll; defaults to the configured method
        #[arg(long)]
        method: Option<FlipMethod>,
    },

    /// Day-weighted DJF/MAM/JJA/SON means of a monthly series
    Seasonal {
        #[command(flatten)]
        io: FieldIo,

        /// First month of the series, YYYY-MM
        #[arg(long)]
        start: MonthStamp,

        /// CF calendar of the series
        #[arg(long, default_value = "standard")]
        calendar: Calendar,

        /// One mean per season and year instead of a climatology
        #[arg(long)]
        per_year: bool,
    },

    /// Test the difference of two samples per grid point (sample axis first)
    Sigtest {
        /// NetCDF file with the first sample
        #[arg(long)]
        first: PathBuf,

        /// NetCDF file with the second sample
        #[arg(long)]
        second: PathBuf,

        /// Variable in both files
        #[arg(long)]
        var: String,

        /// paired or welch
        #[arg(long, default_value = "paired")]
        kind: TestKind,

        /// Significance level; defaults to the configured level
        #[arg(long)]
        level: Option<f64>,

        /// Path to save the masked difference as NetCDF
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}
