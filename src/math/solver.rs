//! The least-squares strategy seam.
//!
//! Both QR strategies solve `min ||A x - b||₂` for the same `(A, b)` and return
//! a `Solution`; callers pick one through `solver_for` or use both and compare.

use nalgebra::{DMatrix, DVector};

use crate::domain::Strategy;
use crate::error::FitError;
use crate::math::gram_schmidt::GramSchmidtSolver;
use crate::math::householder::HouseholderSolver;

/// Factorization by-products kept for diagnostics.
#[derive(Debug, Clone)]
pub enum Factors {
    /// Explicit orthonormal factor (`m x n`).
    GramSchmidt { q: DMatrix<f64> },
    /// Implicit orthogonal factor: reflector vectors (one per column of `u`)
    /// and their scaling coefficients.
    Householder { u: DMatrix<f64>, beta: DVector<f64> },
}

/// Result of a single least-squares solve.
#[derive(Debug, Clone)]
pub struct Solution {
    /// Coefficients, one per column of `A`.
    pub x: DVector<f64>,
    /// Upper-triangular factor. `n x n` for Gram–Schmidt; the full `m x n`
    /// eliminated working matrix for Householder.
    pub r: DMatrix<f64>,
    /// `Qᵗ b`. Length `n` for Gram–Schmidt, `m` for Householder.
    pub d: DVector<f64>,
    pub factors: Factors,
}

impl Solution {
    /// Square triangular block `R[0..n, 0..n]` and matching `d[0..n]`.
    pub fn triangular_system(&self) -> (DMatrix<f64>, DVector<f64>) {
        let n = self.x.len();
        (
            self.r.view((0, 0), (n, n)).into_owned(),
            self.d.rows(0, n).into_owned(),
        )
    }
}

/// A QR-based least-squares strategy.
pub trait LeastSquaresSolver: Send + Sync {
    fn strategy(&self) -> Strategy;

    fn solve(&self, a: &DMatrix<f64>, b: &DVector<f64>) -> Result<Solution, FitError>;
}

pub fn solver_for(strategy: Strategy) -> Box<dyn LeastSquaresSolver> {
    match strategy {
        Strategy::GramSchmidt => Box::new(GramSchmidtSolver),
        Strategy::Householder => Box::new(HouseholderSolver),
    }
}

/// Shape checks common to both strategies: `b` matches `A`, and `m > n`.
pub(crate) fn ensure_overdetermined(a: &DMatrix<f64>, b: &DVector<f64>) -> Result<(), FitError> {
    let (m, n) = a.shape();
    if b.len() != m {
        return Err(FitError::validation(format!(
            "target has {} entries but the design matrix has {m} rows",
            b.len()
        )));
    }
    if m <= n {
        return Err(FitError::InputShape { rows: m, cols: n });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn solver_for_returns_requested_strategy() {
        for strategy in [Strategy::GramSchmidt, Strategy::Householder] {
            assert_eq!(solver_for(strategy).strategy(), strategy);
        }
    }

    #[test]
    fn mismatched_target_length_is_rejected() {
        let a = DMatrix::from_element(4, 2, 1.0);
        let b = DVector::from_element(3, 1.0);
        assert!(matches!(
            ensure_overdetermined(&a, &b),
            Err(FitError::Validation { .. })
        ));
    }
}
