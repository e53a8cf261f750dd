//! Fit-quality metrics.
//!
//! All functions are pure in `(A, x, b)`; none of them can fail. The condition
//! number degrades to `+inf` instead of erroring: a design whose conditioning
//! cannot be estimated is unusable for inference, not a broken run.

use nalgebra::{DMatrix, DVector};

use crate::domain::FitQuality;

/// Iteration cap for the SVD used by [`condition_number`].
const SVD_MAX_ITER: usize = 1_000;

/// `A x - b`.
pub fn residuals(a: &DMatrix<f64>, x: &DVector<f64>, b: &DVector<f64>) -> DVector<f64> {
    a * x - b
}

/// `||A x - b||₂`.
pub fn residual_norm(a: &DMatrix<f64>, x: &DVector<f64>, b: &DVector<f64>) -> f64 {
    residuals(a, x, b).norm()
}

/// `sqrt(mean((A x - b)²))`. NaN for an empty system.
pub fn rmse(a: &DMatrix<f64>, x: &DVector<f64>, b: &DVector<f64>) -> f64 {
    let r = residuals(a, x, b);
    if r.is_empty() {
        return f64::NAN;
    }
    (r.norm_squared() / r.len() as f64).sqrt()
}

/// Ratio of the largest to the smallest singular value of `A`.
pub fn condition_number(a: &DMatrix<f64>) -> f64 {
    if a.is_empty() || a.iter().any(|v| !v.is_finite()) {
        return f64::INFINITY;
    }

    let Some(svd) = a.clone().try_svd(false, false, f64::EPSILON, SVD_MAX_ITER) else {
        log::debug!("condition number: SVD did not converge");
        return f64::INFINITY;
    };

    let s = &svd.singular_values;
    let max = s.max();
    let min = s.min();
    if min <= 0.0 {
        return f64::INFINITY;
    }
    let cond = max / min;
    if cond.is_finite() { cond } else { f64::INFINITY }
}

/// All three diagnostics at once.
pub fn evaluate(a: &DMatrix<f64>, x: &DVector<f64>, b: &DVector<f64>) -> FitQuality {
    FitQuality {
        residual_norm: residual_norm(a, x, b),
        rmse: rmse(a, x, b),
        condition_number: condition_number(a),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line_fit() -> (DMatrix<f64>, DVector<f64>, DVector<f64>) {
        let a = DMatrix::from_row_slice(3, 2, &[1.0, 1.0, 1.0, 2.0, 1.0, 3.0]);
        let b = DVector::from_row_slice(&[2.0, 3.0, 5.0]);
        let x = DVector::from_row_slice(&[1.0 / 3.0, 1.5]);
        (a, b, x)
    }

    #[test]
    fn residual_norm_matches_direct_computation() {
        let (a, b, x) = line_fit();
        let direct = {
            let mut ss = 0.0;
            for i in 0..3 {
                let pred = a[(i, 0)] * x[0] + a[(i, 1)] * x[1];
                ss += (pred - b[i]).powi(2);
            }
            ss.sqrt()
        };
        assert!((residual_norm(&a, &x, &b) - direct).abs() < 1e-12);
        assert!((residual_norm(&a, &x, &b) - 0.408_248_290_463_863).abs() < 1e-9);
    }

    #[test]
    fn rmse_is_norm_over_sqrt_rows() {
        let (a, b, x) = line_fit();
        let expected = residual_norm(&a, &x, &b) / 3.0f64.sqrt();
        assert!((rmse(&a, &x, &b) - expected).abs() < 1e-12);
    }

    #[test]
    fn condition_number_of_scaled_identity_is_one() {
        let mut a = DMatrix::zeros(3, 2);
        a[(0, 0)] = 2.0;
        a[(1, 1)] = 2.0;
        assert!((condition_number(&a) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn condition_number_of_diagonal_is_ratio() {
        let mut a = DMatrix::zeros(4, 2);
        a[(0, 0)] = 10.0;
        a[(1, 1)] = 0.1;
        assert!((condition_number(&a) - 100.0).abs() < 1e-9);
    }

    #[test]
    fn degenerate_matrix_has_infinite_condition_number() {
        let a = DMatrix::from_row_slice(3, 2, &[1.0, 0.0, 1.0, 0.0, 1.0, 0.0]);
        let cond = condition_number(&a);
        assert!(cond.is_infinite() || cond > 1e12);
        assert!(condition_number(&DMatrix::zeros(0, 0)).is_infinite());
        assert!(condition_number(&DMatrix::from_element(3, 2, f64::NAN)).is_infinite());
    }

    #[test]
    fn evaluate_bundles_metrics() {
        let (a, b, x) = line_fit();
        let q = evaluate(&a, &x, &b);
        assert_eq!(q.residual_norm, residual_norm(&a, &x, &b));
        assert_eq!(q.rmse, rmse(&a, &x, &b));
        assert!(q.condition_number.is_finite() && q.condition_number > 1.0);
    }
}
