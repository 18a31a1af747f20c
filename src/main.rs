//! Entry point for the climvis application.
//! Handles CLI parsing, configuration, file loading, and dispatches the field operations.

use clap::Parser;
use clim_vis::prelude::*;
use netcdf::open;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

mod cli;

use cli::{Cli, Command, FieldIo};

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn load(io: &FieldIo) -> Result<GriddedField> {
    let file = open(&io.file)?;
    tracing::info!(path = %io.file.display(), "opened NetCDF file");
    read_field(&file, &io.var)
}

fn describe(field: &GriddedField) {
    let dims: Vec<String> = field
        .coords
        .iter()
        .map(|c| format!("{}={}", c.name, c.len()))
        .collect();
    let valid: Vec<f64> = field.data.iter().copied().filter(|v| v.is_finite()).collect();
    println!("{} [{}]", field.name, dims.join(", "));
    if valid.is_empty() {
        println!("  no valid (finite) values");
        return;
    }
    if field.data.len() == 1 {
        println!("  value: {:.6}", valid[0]);
        return;
    }
    let min = valid.iter().copied().fold(f64::INFINITY, f64::min);
    let max = valid.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let mean = valid.iter().sum::<f64>() / valid.len() as f64;
    println!("  min {min:.4}  max {max:.4}  mean {mean:.4}  valid {}/{}", valid.len(), field.data.len());
}

fn emit(field: &GriddedField, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            write_field(field, path)?;
            println!("Saved {} to {}", field.name, path.display());
        }
        None => describe(field),
    }
    Ok(())
}

/// `out.nc` becomes `out_DJF.nc`
fn season_path(path: &Path, season: Season) -> PathBuf {
    let stem = path.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();
    let name = match path.extension() {
        Some(ext) => format!("{stem}_{season}.{}", ext.to_string_lossy()),
        None => format!("{stem}_{season}"),
    };
    path.with_file_name(name)
}

fn run(command: Command, config: &ClimVisConfig) -> Result<()> {
    match command {
        Command::Style { field, diff, levels } => {
            let style = config.style_table()?.field_style(&field, diff)?;
            println!(
                "{field} ({}): colormap {}, vmin {}, vmax {}, {} levels",
                if diff { "difference" } else { "absolute" },
                style.colormap.name,
                style.vmin,
                style.vmax,
                style.level_count
            );
            if levels {
                let norm = style.norm()?;
                for bin in norm.boundaries().windows(2) {
                    let mid = 0.5 * (bin[0] + bin[1]);
                    println!("  [{:>10.4}, {:>10.4})  {}", bin[0], bin[1], norm.color(mid, &style.colormap).to_hex());
                }
            }
        }
        Command::SeasonMean { io, season } => {
            let season = Season::parse_lenient(&season);
            let field = season_average(&load(&io)?, Some(season))?;
            emit(&field, io.output.as_deref())?;
        }
        Command::WeightedMean { io, lat_only } => {
            let reduction = if lat_only {
                WeightedReduction::Latitude
            } else {
                WeightedReduction::LatitudeLongitude
            };
            let field = latitude_weighted_mean(&load(&io)?, reduction)?;
            emit(&field, io.output.as_deref())?;
        }
        Command::ZonalMean { io } => {
            let field = zonal_mean(&load(&io)?)?;
            emit(&field, io.output.as_deref())?;
        }
        Command::Flip { io, method } => {
            let field = flip_longitude(&load(&io)?, method.unwrap_or(config.flip_method))?;
            emit(&field, io.output.as_deref())?;
        }
        Command::Regrid {
            io,
            reference,
            reference_var,
            method,
        } => {
            let reference_file = open(&reference)?;
            let target = read_field(&reference_file, reference_var.as_deref().unwrap_or(&io.var))?;
            let field = regrid_like(&target, &load(&io)?, method.unwrap_or(config.flip_method))?;
            emit(&field, io.output.as_deref())?;
        }
        Command::Seasonal {
            io,
            start,
            calendar,
            per_year,
        } => {
            let field = load(&io)?;
            let steps = field.data.shape()[field.axis_for(AxisRole::T)?];
            let stamps = start.series(steps);
            let means = if per_year {
                annual_season_means(&field, &stamps, calendar)?
            } else {
                season_climatology(&field, &stamps, calendar)?
            };
            for (season, mean) in &means {
                println!("{season}:");
                match &io.output {
                    Some(path) => emit(mean, Some(season_path(path, *season).as_path()))?,
                    None => describe(mean),
                }
            }
        }
        Command::Sigtest {
            first,
            second,
            var,
            kind,
            level,
            output,
        } => {
            let sample1 = read_field(&open(&first)?, &var)?;
            let sample2 = read_field(&open(&second)?, &var)?;
            let mean1 = parallel_mean_axis(&sample1.data, 0)?;
            let mean2 = parallel_mean_axis(&sample2.data, 0)?;
            let level = level.unwrap_or(config.significance_level);
            let result = significance_test(&sample1.data, &sample2.data, &mean1, &mean2, kind, level)?;
            println!(
                "{kind} t-test at level {level}: {} of {} points significant",
                result.significant_count(),
                result.mask.len()
            );
            let diff = GriddedField::new(
                format!("{var}_diff"),
                result.masked_difference,
                sample1.coords[1..].to_vec(),
            )?
            .with_attribute("test", kind.to_string())
            .with_attribute("significance_level", level.to_string());
            emit(&diff, output.as_deref())?;
        }
    }
    Ok(())
}

fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = match &cli.config {
        Some(path) => ClimVisConfig::from_path(path)?,
        None => ClimVisConfig::default(),
    };
    if cli.threads.is_some() {
        config.threads = cli.threads;
    }
    ParallelConfig::new(config.threads).setup_global_pool()?;
    ParallelInfo::current().log();

    run(cli.command, &config)?;
    Ok(())
}
