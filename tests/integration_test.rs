use approx::assert_relative_eq;
use clim_vis::prelude::*;
use ndarray::{Array1, Array3, Axis, IxDyn};
use netcdf::{create, open};
use std::path::Path;
use tempfile::tempdir;

/// Monthly `ts[time, lat, lon]` with CF coordinate variables.
/// Each value is `month + 100 * year_index`, constant in space.
fn write_monthly_file(path: &Path, years: usize, lons: &[f64]) {
    let lats = [-45.0, 0.0, 45.0];
    let months = years * 12;
    let mut file = create(path).expect("Failed to create NetCDF file");

    file.add_dimension("time", months).expect("Failed to add dimension time");
    file.add_dimension("lat", lats.len()).expect("Failed to add dimension lat");
    file.add_dimension("lon", lons.len()).expect("Failed to add dimension lon");

    let time: Vec<f64> = (0..months).map(|m| 15.0 + 30.0 * m as f64).collect();
    let mut var = file.add_variable::<f64>("time", &["time"]).expect("Failed to add time");
    var.put_attribute("units", "days since 2000-01-01").expect("attr");
    var.put_attribute("calendar", "noleap").expect("attr");
    var.put(Array1::from(time).into_dyn().view(), ..).expect("Failed to write time");

    let mut var = file.add_variable::<f64>("lat", &["lat"]).expect("Failed to add lat");
    var.put_attribute("units", "degrees_north").expect("attr");
    var.put(Array1::from(lats.to_vec()).into_dyn().view(), ..).expect("Failed to write lat");

    let mut var = file.add_variable::<f64>("lon", &["lon"]).expect("Failed to add lon");
    var.put_attribute("units", "degrees_east").expect("attr");
    var.put(Array1::from(lons.to_vec()).into_dyn().view(), ..).expect("Failed to write lon");

    let data = Array3::from_shape_fn((months, lats.len(), lons.len()), |(t, _, _)| {
        ((t % 12) + 1 + 100 * (t / 12)) as f32
    });
    let mut var = file
        .add_variable::<f32>("ts", &["time", "lat", "lon"])
        .expect("Failed to add variable");
    var.put_attribute("units", "K").expect("attr");
    var.put_attribute("long_name", "Surface temperature").expect("attr");
    var.put(data.view(), ..).expect("Failed to write data");
}

#[test]
fn test_read_seasonal_write_roundtrip() -> Result<()> {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let input = temp_dir.path().join("ts_monthly.nc");
    let output = temp_dir.path().join("ts_jja.nc");
    write_monthly_file(&input, 2, &[0.0, 90.0, 180.0, 270.0]);

    let file = open(&input)?;
    let ts = read_field(&file, "ts")?;
    assert_eq!(ts.dim_names(), vec!["time", "lat", "lon"]);
    assert_eq!(ts.units(), Some("K"));
    assert_eq!(ts.axis_for(AxisRole::T)?, 0);
    assert_eq!(ts.axis_for(AxisRole::X)?, 2);

    let stamps = MonthStamp::new(2000, 1).series(24);
    let clim = season_climatology(&ts, &stamps, Calendar::NoLeap)?;
    let jja = &clim[&Season::Jja];
    // June 30 days, July and August 31; years 0 and 1 average to +50
    let expected = (6.0 * 30.0 + 7.0 * 31.0 + 8.0 * 31.0) / 92.0 + 50.0;
    assert_relative_eq!(jja.data[[1, 2]], expected, epsilon = 1e-9);

    write_field(jja, &output)?;
    let written = open(&output)?;
    let back = read_field(&written, "ts")?;
    assert_eq!(back.dim_names(), vec!["lat", "lon"]);
    assert_eq!(back.coords[0].values, vec![-45.0, 0.0, 45.0]);
    assert_eq!(back.coords[0].attributes.get("units").map(String::as_str), Some("degrees_north"));
    assert_eq!(back.attributes.get("long_name").map(String::as_str), Some("Surface temperature"));
    assert_relative_eq!(back.data[[0, 0]], expected, epsilon = 1e-9);

    let history = written.attribute("history").expect("history attribute");
    match history.value()? {
        netcdf::AttributeValue::Str(text) => assert!(text.contains("Created by climvis")),
        other => panic!("unexpected history value {other:?}"),
    }
    Ok(())
}

#[test]
fn test_flip_through_file() -> Result<()> {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let input = temp_dir.path().join("ts_signed.nc");
    let output = temp_dir.path().join("ts_positive.nc");
    let lons: Vec<f64> = (0..8).map(|i| -180.0 + 45.0 * i as f64).collect();
    write_monthly_file(&input, 1, &lons);

    let ts = read_field(&open(&input)?, "ts")?;
    let flipped = flip_longitude(&ts, FlipMethod::Roll)?;
    write_field(&flipped, &output)?;

    let written = open(&output)?;
    let back = read_field(&written, "ts")?;
    assert_eq!(
        back.coords[2].values,
        vec![0.0, 45.0, 90.0, 135.0, 180.0, 225.0, 270.0, 315.0]
    );
    // first longitude now holds what was at 0 degrees east
    assert_eq!(back.data[[3, 1, 0]], ts.data[[3, 1, 4]]);
    assert_eq!(back.data, flipped.data);
    assert!(!back.attributes.contains_key("history"));

    let history = written.attribute("history").expect("history attribute");
    match history.value()? {
        netcdf::AttributeValue::Str(text) => {
            assert!(text.contains("wrapped longitudes to 0:360"));
            assert!(text.lines().last().unwrap_or_default().starts_with("Created by climvis"));
        }
        other => panic!("unexpected history value {other:?}"),
    }
    Ok(())
}

#[test]
fn test_sigtest_between_files() -> Result<()> {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let first = temp_dir.path().join("control.nc");
    let second = temp_dir.path().join("experiment.nc");
    write_monthly_file(&first, 3, &[0.0, 180.0]);
    write_monthly_file(&second, 3, &[0.0, 180.0]);

    let control = read_field(&open(&first)?, "ts")?;
    let experiment = read_field(&open(&second)?, "ts")?;
    let stamps = MonthStamp::new(2000, 1).series(36);

    let control_mam = annual_season_means(&control, &stamps, Calendar::NoLeap)?
        .remove(&Season::Mam)
        .expect("MAM present");
    let mut experiment_mam = annual_season_means(&experiment, &stamps, Calendar::NoLeap)?
        .remove(&Season::Mam)
        .expect("MAM present");
    // +2 K everywhere, grid point (0, 0) perturbed by year
    for (year, mut slab) in experiment_mam.data.axis_iter_mut(Axis(0)).enumerate() {
        slab.mapv_inplace(|v| v + 2.0);
        slab[[0, 0]] += [-3.0, 4.0, -1.0][year];
    }

    let mean1 = parallel_mean_axis(&control_mam.data, 0)?;
    let mean2 = parallel_mean_axis(&experiment_mam.data, 0)?;
    let result = significance_test(
        &experiment_mam.data,
        &control_mam.data,
        &mean2,
        &mean1,
        TestKind::Paired,
        DEFAULT_SIGNIFICANCE_LEVEL,
    )?;

    assert_eq!(result.difference.shape(), &[3, 2]);
    assert!(result.mask[IxDyn(&[0, 0])]);
    assert_eq!(result.significant_count(), 5);
    assert_relative_eq!(result.masked_difference[[2, 1]], 2.0, epsilon = 1e-9);
    Ok(())
}
