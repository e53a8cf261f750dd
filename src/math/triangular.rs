//! Upper-triangular solves shared by both QR strategies.

use nalgebra::{DMatrix, DVector};

use crate::error::FitError;

/// Solve `R x = d` for upper-triangular `R` by back-substitution.
///
/// Works from the last equation to the first:
///
/// ```text
/// x[i] = (d[i] - Σ_{k>i} R[i,k] x[k]) / R[i,i]
/// ```
///
/// Fails with `SingularMatrix` at the first (highest) index whose diagonal is
/// exactly zero.
///
/// # Panics
/// Panics if `R` is not square or `d` is shorter than `R`.
pub fn back_substitute(r: &DMatrix<f64>, d: &DVector<f64>) -> Result<DVector<f64>, FitError> {
    let n = r.nrows();
    assert_eq!(r.ncols(), n, "back-substitution needs a square R");
    assert!(d.len() >= n, "right-hand side shorter than R");

    let mut x = DVector::zeros(n);
    for i in (0..n).rev() {
        let pivot = r[(i, i)];
        if pivot == 0.0 {
            return Err(FitError::SingularMatrix { index: i, size: n });
        }
        let mut acc = d[i];
        for k in (i + 1)..n {
            acc -= r[(i, k)] * x[k];
        }
        x[i] = acc / pivot;
    }
    Ok(x)
}
