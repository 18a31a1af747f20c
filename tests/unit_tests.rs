//! Cross-module properties of the public API
//!
//! Module-level behaviour is tested next to each module; these tests check
//! the guarantees callers rely on across the season, style, geography and
//! statistics layers.

use approx::assert_relative_eq;
use clim_vis::prelude::*;
use clim_vis::season::METEOROLOGICAL_SEASONS;
use ndarray::{ArrayD, Axis, IxDyn};

fn global_grid(nlat: usize, nlon: usize, lon0: f64) -> (Vec<f64>, Vec<f64>) {
    let dlat = 180.0 / nlat as f64;
    let dlon = 360.0 / nlon as f64;
    let lats = (0..nlat).map(|j| -90.0 + dlat * (j as f64 + 0.5)).collect();
    let lons = (0..nlon).map(|i| lon0 + dlon * i as f64).collect();
    (lats, lons)
}

#[test]
fn test_season_month_sets() {
    let expected: [(&str, &[usize]); 8] = [
        ("ANN", &[0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11]),
        ("DJF", &[0, 1, 11]),
        ("JFM", &[0, 1, 2]),
        ("MAM", &[2, 3, 4]),
        ("JJA", &[5, 6, 7]),
        ("JJAS", &[5, 6, 7, 8]),
        ("JAS", &[6, 7, 8]),
        ("SON", &[8, 9, 10]),
    ];
    for (token, months) in expected {
        assert_eq!(season_months(Some(token)), Some(months), "{token}");
        assert_eq!(season_months(Some(&token.to_lowercase())), Some(months));
    }
    // unknown tokens behave like the annual mean, absence means no reduction
    assert_eq!(season_months(Some("monsoon")), season_months(Some("ANN")));
    assert_eq!(season_months(None), None);
}

#[test]
fn test_every_field_style_is_well_formed() -> Result<()> {
    for field in Field::ALL {
        for diff in [false, true] {
            let style = field_style(field.key(), diff)?;
            assert!(style.vmin < style.vmax, "{field} diff={diff}");
            assert!(style.level_count >= 2, "{field} diff={diff}");
            let norm = style.norm()?;
            assert_eq!(norm.bins(), style.level_count - 1);
        }
    }
    Ok(())
}

#[test]
fn test_precip_presets() -> Result<()> {
    let absolute = field_style("precip", false)?;
    assert_eq!(absolute.colormap.name, "Blues");
    assert_eq!((absolute.vmin, absolute.vmax, absolute.level_count), (0.0, 10.0, 21));

    let diff = field_style("precip", true)?;
    assert_eq!(diff.colormap.name, "BrBG+Blues");
    assert_eq!((diff.vmin, diff.vmax, diff.level_count), (-6.0, 6.0, 25));

    assert!(matches!(
        field_style("not_a_field", false),
        Err(ClimVisError::UnknownField { .. })
    ));
    Ok(())
}

#[test]
fn test_longitude_flip_is_involution() -> Result<()> {
    let (lats, lons) = global_grid(4, 12, -180.0);
    let data = ArrayD::from_shape_fn(IxDyn(&[4, 12]), |idx| (idx[0] * 100 + idx[1]) as f64);
    let field = GriddedField::new(
        "ts",
        data,
        vec![Coordinate::new("lat", lats), Coordinate::new("lon", lons.clone())],
    )?;

    for method in [FlipMethod::Relabel, FlipMethod::Roll] {
        let positive = flip_longitude(&field, method)?;
        let lon = &positive.coords[1].values;
        assert!(lon.iter().all(|v| (0.0..360.0).contains(v)), "{method:?}");
        assert!(lon.windows(2).all(|w| w[0] < w[1]));

        let back = flip_longitude(&positive, method)?;
        for (a, b) in back.coords[1].values.iter().zip(&lons) {
            assert_relative_eq!(*a, *b, epsilon = 1e-9);
        }
        assert_eq!(back.data, field.data);
    }
    Ok(())
}

#[test]
fn test_weighted_mean_of_constant_field() -> Result<()> {
    let (lats, lons) = global_grid(9, 18, 0.0);
    let field = GriddedField::new(
        "sst",
        ArrayD::from_elem(IxDyn(&[3, 9, 18]), 288.15),
        vec![
            Coordinate::new("time", vec![0.0, 1.0, 2.0]),
            Coordinate::new("lat", lats),
            Coordinate::new("lon", lons),
        ],
    )?;
    for reduction in [WeightedReduction::Latitude, WeightedReduction::LatitudeLongitude] {
        let mean = latitude_weighted_mean(&field, reduction)?;
        assert!(mean.data.iter().all(|v| (v - 288.15).abs() < 1e-9));
    }
    Ok(())
}

#[test]
fn test_seasonal_means_of_constant_series() -> Result<()> {
    let months = 5 * 12;
    let field = GriddedField::new(
        "ts",
        ArrayD::from_elem(IxDyn(&[months, 2]), -4.5),
        vec![
            Coordinate::new("time", (0..months).map(|i| i as f64).collect())
                .with_attribute("units", "days since 1850-01-01"),
            Coordinate::new("lat", vec![-30.0, 30.0]),
        ],
    )?;
    let stamps = MonthStamp::new(1850, 1).series(months);
    for calendar in [
        Calendar::Standard,
        Calendar::ProlepticGregorian,
        Calendar::Julian,
        Calendar::NoLeap,
        Calendar::AllLeap,
        Calendar::Day360,
    ] {
        let clim = season_climatology(&field, &stamps, calendar)?;
        let annual = annual_season_means(&field, &stamps, calendar)?;
        for season in METEOROLOGICAL_SEASONS {
            assert!(clim[&season].data.iter().all(|v| (v + 4.5).abs() < 1e-12));
            assert!(annual[&season].data.iter().all(|v| (v + 4.5).abs() < 1e-12));
        }
        // first winter lacks December 1849 and the last December is alone
        assert_eq!(annual[&Season::Djf].data.len_of(Axis(0)), 4);
        assert_eq!(annual[&Season::Mam].data.len_of(Axis(0)), 5);
    }
    Ok(())
}

#[test]
fn test_identical_samples_are_not_significant() -> Result<()> {
    let sample = ArrayD::from_shape_fn(IxDyn(&[10, 3, 4]), |idx| {
        ((idx[0] * 7 + idx[1] * 3 + idx[2]) % 5) as f64
    });
    let mean = parallel_mean_axis(&sample, 0)?;
    let result = significance_test(&sample, &sample, &mean, &mean, TestKind::Paired, DEFAULT_SIGNIFICANCE_LEVEL)?;
    assert!(result.p_value.iter().all(|p| (p - 1.0).abs() < 1e-9));
    assert_eq!(result.significant_count(), 0);
    assert!(result.masked_difference.iter().all(|v| v.is_nan()));
    Ok(())
}

#[test]
fn test_regrid_onto_coarser_grid() -> Result<()> {
    // linear in lat and lon, so bilinear interpolation is exact
    let (lats, lons) = global_grid(18, 36, 0.0);
    let source = GriddedField::new(
        "ts",
        ArrayD::from_shape_fn(IxDyn(&[18, 36]), |idx| lats[idx[0]] + 0.1 * lons[idx[1]]),
        vec![Coordinate::new("lat", lats.clone()), Coordinate::new("lon", lons.clone())],
    )?;
    let target_lats = vec![-40.0, 0.0, 40.0];
    let target_lons = vec![20.0, 100.0, 200.0];
    let reference = GriddedField::new(
        "grid",
        ArrayD::zeros(IxDyn(&[3, 3])),
        vec![
            Coordinate::new("latitude", target_lats.clone()),
            Coordinate::new("longitude", target_lons.clone()),
        ],
    )?;
    let regridded = regrid_like(&reference, &source, FlipMethod::Relabel)?;
    assert_eq!(regridded.dim_names(), vec!["latitude", "longitude"]);
    for (j, lat) in target_lats.iter().enumerate() {
        for (i, lon) in target_lons.iter().enumerate() {
            assert_relative_eq!(regridded.data[[j, i]], lat + 0.1 * lon, epsilon = 1e-9);
        }
    }
    Ok(())
}
