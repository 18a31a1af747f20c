//! Parallel axis reductions shared by the seasonal, zonal and weighted means
//!
//! All reductions skip NaN and infinite samples and return NaN where a lane
//! has no valid data.

use crate::errors::{ClimVisError, Result};
use ndarray::{ArrayD, ArrayView1, Axis};
use rayon::prelude::*;

/// Computes the mean along an axis using parallel processing
///
/// # Errors
///
/// Returns an error if the axis is out of bounds or reshaping fails.
pub fn parallel_mean_axis(data: &ArrayD<f64>, axis: usize) -> Result<ArrayD<f64>> {
    let weights = vec![1.0; axis_len(data, axis)?];
    parallel_weighted_mean_axis(data, axis, &weights)
}

/// Computes a weighted arithmetic mean along an axis using parallel processing
///
/// The denominator for each output element is the sum of the weights of the
/// samples that were actually used, so missing values do not bias the mean
/// toward zero.
///
/// # Errors
///
/// Returns an error if the axis is out of bounds, the weight count does not
/// match the axis length, or any weight is negative.
pub fn parallel_weighted_mean_axis(
    data: &ArrayD<f64>,
    axis: usize,
    weights: &[f64],
) -> Result<ArrayD<f64>> {
    let axis_len = axis_len(data, axis)?;
    if weights.len() != axis_len {
        return Err(ClimVisError::SampleSizeMismatch {
            message: format!(
                "{} weights supplied for an axis of length {axis_len}",
                weights.len()
            ),
        });
    }
    if weights.iter().any(|w| *w < 0.0 || !w.is_finite()) {
        return Err(ClimVisError::StatisticsError(
            "weights must be finite and non-negative".to_string(),
        ));
    }

    let mut new_shape = data.shape().to_vec();
    new_shape.remove(axis);

    // One lane per output element, in logical order of the remaining axes
    let lanes: Vec<ArrayView1<'_, f64>> = data.lanes(Axis(axis)).into_iter().collect();

    tracing::debug!(
        elements = lanes.len(),
        threads = rayon::current_num_threads(),
        "weighted mean over axis {axis}"
    );

    let result: Vec<f64> = lanes
        .par_iter()
        .map(|lane| {
            let mut sum = 0.0_f64;
            let mut weight_sum = 0.0_f64;
            for (value, &w) in lane.iter().zip(weights) {
                if value.is_finite() {
                    sum += value * w;
                    weight_sum += w;
                }
            }
            if weight_sum > 0.0 {
                sum / weight_sum
            } else {
                f64::NAN
            }
        })
        .collect();

    Ok(ArrayD::from_shape_vec(new_shape, result)?)
}

fn axis_len(data: &ArrayD<f64>, axis: usize) -> Result<usize> {
    if axis >= data.ndim() {
        return Err(ClimVisError::StatisticsError(format!(
            "Axis {axis} is out of bounds for array with {} dimensions",
            data.ndim()
        )));
    }
    Ok(data.shape()[axis])
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array2};

    #[test]
    fn mean_skips_nan() {
        let data = array![[1.0, f64::NAN], [3.0, 4.0]].into_dyn();
        let mean = parallel_mean_axis(&data, 0).unwrap();
        assert_eq!(mean.shape(), &[2]);
        assert_eq!(mean[[0]], 2.0);
        assert_eq!(mean[[1]], 4.0);
    }

    #[test]
    fn all_missing_lane_is_nan() {
        let data = Array2::from_elem((3, 2), f64::NAN).into_dyn();
        let mean = parallel_mean_axis(&data, 1).unwrap();
        assert!(mean.iter().all(|v| v.is_nan()));
    }

    #[test]
    fn weighted_mean_divides_by_weight_sum() {
        let data = array![[2.0, 4.0]].into_dyn();
        let mean = parallel_weighted_mean_axis(&data, 1, &[1.0, 3.0]).unwrap();
        assert_eq!(mean[[0]], 3.5);
    }

    #[test]
    fn rejects_bad_axis_and_weights() {
        let data = array![[1.0, 2.0]].into_dyn();
        assert!(parallel_mean_axis(&data, 2).is_err());
        assert!(parallel_weighted_mean_axis(&data, 1, &[1.0]).is_err());
        assert!(parallel_weighted_mean_axis(&data, 1, &[1.0, -1.0]).is_err());
    }
}
