//! Small numeric helpers shared across modules

/// `n` evenly spaced values from `start` to `end`, both inclusive.
///
/// `n == 1` yields `[start]`, `n == 0` an empty vector.
pub fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (n - 1) as f64;
            (0..n)
                .map(|i| if i == n - 1 { end } else { start + step * i as f64 })
                .collect()
        }
    }
}

/// Relative comparison used for grid spacing checks
pub fn approx_eq(a: f64, b: f64, rel_tol: f64) -> bool {
    let scale = a.abs().max(b.abs()).max(1.0);
    (a - b).abs() <= rel_tol * scale
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linspace_endpoints() {
        assert_eq!(linspace(0.0, 10.0, 21).len(), 21);
        assert_eq!(linspace(0.0, 10.0, 21)[1], 0.5);
        assert_eq!(linspace(-6.0, 6.0, 25)[24], 6.0);
        assert_eq!(linspace(3.0, 4.0, 1), vec![3.0]);
        assert!(linspace(3.0, 4.0, 0).is_empty());
    }

    #[test]
    fn approx_eq_scales() {
        assert!(approx_eq(360.0, 360.0 + 1e-9, 1e-6));
        assert!(!approx_eq(1.0, 1.1, 1e-6));
    }
}
