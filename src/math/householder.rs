//! Least squares via Householder triangularization.
//!
//! Each pivot column `k` is reduced by a reflector
//!
//! ```text
//! H_k = I - u_k u_kᵗ / beta_k
//! ```
//!
//! that maps `A[k.., k]` onto a multiple of the first unit vector. The reflectors
//! are applied to the remaining columns in place and later to `b`, so the
//! orthogonal factor `Q = H_0 H_1 … H_{p-1}` only ever exists implicitly as
//! `(U, beta)`.
//!
//! No vector is normalized along the way, which keeps this strategy well
//! behaved on ill-conditioned designs where Gram–Schmidt loses orthogonality.

use nalgebra::{DMatrix, DVector, DVectorViewMut};

use crate::domain::Strategy;
use crate::error::FitError;
use crate::math::solver::{Factors, LeastSquaresSolver, Solution, ensure_overdetermined};
use crate::math::triangular::back_substitute;

/// Output of [`triangularize`].
#[derive(Debug, Clone)]
pub struct Triangularization {
    /// The working matrix after elimination (`m x n`); zero below the diagonal.
    pub r: DMatrix<f64>,
    /// Reflector vectors, one per column (`m x p`, `p = min(m - 1, n)`).
    pub u: DMatrix<f64>,
    /// Reflector coefficients (length `p`). Zero marks a skipped column.
    pub beta: DVector<f64>,
}

/// Reduce `A` to upper-triangular form with Householder reflectors.
///
/// A pivot whose sub-column `A[k.., k]` is already zero is skipped and gets
/// `beta[k] = 0`.
pub fn triangularize(a: &DMatrix<f64>) -> Triangularization {
    let mut r = a.clone();
    let (m, n) = r.shape();
    let p = n.min(m.saturating_sub(1));

    let mut u = DMatrix::zeros(m, p);
    let mut beta = DVector::zeros(p);

    for k in 0..p {
        let norm = r.view((k, k), (m - k, 1)).norm();
        if norm == 0.0 {
            continue;
        }

        // Same sign as the diagonal so `u[k]` is a sum, never a difference.
        let akk = r[(k, k)];
        let sigma = if akk < 0.0 { -norm } else { norm };

        u[(k, k)] = akk + sigma;
        for i in (k + 1)..m {
            u[(i, k)] = r[(i, k)];
        }
        beta[k] = sigma * u[(k, k)];

        r[(k, k)] = -sigma;
        for i in (k + 1)..m {
            r[(i, k)] = 0.0;
        }

        for j in (k + 1)..n {
            reflect(&u, k, beta[k], r.column_mut(j));
        }
    }

    Triangularization { r, u, beta }
}

/// Compute `d = Qᵗ b` by applying the first `n` reflectors to a copy of `b`.
pub fn apply_to_target(b: &DVector<f64>, u: &DMatrix<f64>, beta: &DVector<f64>, n: usize) -> DVector<f64> {
    let mut d = b.clone();
    for k in 0..n.min(beta.len()) {
        if beta[k] == 0.0 {
            continue;
        }
        reflect(u, k, beta[k], d.column_mut(0));
    }
    d
}

/// `y[k..] -= (u_kᵗ y[k..] / beta) u_k`, with `u_k = u[k.., k]`.
fn reflect(u: &DMatrix<f64>, k: usize, beta: f64, mut y: DVectorViewMut<'_, f64>) {
    let m = y.nrows();
    let mut dot = 0.0;
    for i in k..m {
        dot += u[(i, k)] * y[i];
    }
    let tau = dot / beta;
    for i in k..m {
        y[i] -= tau * u[(i, k)];
    }
}

/// Least-squares strategy backed by [`triangularize`].
#[derive(Debug, Clone, Copy, Default)]
pub struct HouseholderSolver;

impl LeastSquaresSolver for HouseholderSolver {
    fn strategy(&self) -> Strategy {
        Strategy::Householder
    }

    fn solve(&self, a: &DMatrix<f64>, b: &DVector<f64>) -> Result<Solution, FitError> {
        ensure_overdetermined(a, b)?;
        let n = a.ncols();

        let Triangularization { r, u, beta } = triangularize(a);
        let d = apply_to_target(b, &u, &beta, n);

        let r0 = r.view((0, 0), (n, n)).into_owned();
        let d0 = d.rows(0, n).into_owned();
        let x = back_substitute(&r0, &d0)?;

        Ok(Solution {
            x,
            r,
            d,
            factors: Factors::Householder { u, beta },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::gram_schmidt::GramSchmidtSolver;
    use rand::prelude::*;
    use rand::rngs::StdRng;

    fn random_system(m: usize, n: usize, seed: u64) -> (DMatrix<f64>, DVector<f64>) {
        let mut rng = StdRng::seed_from_u64(seed);
        let a = DMatrix::from_fn(m, n, |_, j| if j == 0 { 1.0 } else { rng.gen_range(-5.0..5.0) });
        let b = DVector::from_fn(m, |_, _| rng.gen_range(80.0..100.0));
        (a, b)
    }

    #[test]
    fn fits_line_through_three_points() {
        let a = DMatrix::from_row_slice(3, 2, &[1.0, 1.0, 1.0, 2.0, 1.0, 3.0]);
        let b = DVector::from_row_slice(&[2.0, 3.0, 5.0]);

        let sol = HouseholderSolver.solve(&a, &b).unwrap();
        assert!((sol.x[0] - 1.0 / 3.0).abs() < 1e-10);
        assert!((sol.x[1] - 1.5).abs() < 1e-10);
        assert_eq!(sol.r.shape(), (3, 2));
        assert_eq!(sol.d.len(), 3);
        // Last entry of Qᵗb is the part of b the model cannot explain.
        assert!((sol.d[2].abs() - (1.0f64 / 6.0).sqrt()).abs() < 1e-10);
    }

    #[test]
    fn eliminates_below_diagonal() {
        let (a, _) = random_system(8, 4, 7);
        let tri = triangularize(&a);

        for j in 0..4 {
            for i in (j + 1)..8 {
                assert_eq!(tri.r[(i, j)], 0.0);
            }
        }
        assert_eq!(tri.u.shape(), (8, 4));
        assert_eq!(tri.beta.len(), 4);
    }

    #[test]
    fn reflectors_preserve_norm_of_target() {
        let (a, b) = random_system(10, 3, 11);
        let tri = triangularize(&a);
        let d = apply_to_target(&b, &tri.u, &tri.beta, 3);
        assert!((d.norm() - b.norm()).abs() < 1e-9 * b.norm());
    }

    #[test]
    fn zero_subcolumn_is_skipped() {
        let a = DMatrix::from_row_slice(3, 2, &[0.0, 1.0, 0.0, 2.0, 0.0, 3.0]);
        let tri = triangularize(&a);
        assert_eq!(tri.beta[0], 0.0);
        assert!(tri.beta[1] != 0.0);
    }

    #[test]
    fn solve_through_skipped_reflector_reports_singular_pivot() {
        let a = DMatrix::from_row_slice(4, 2, &[
            0.0, 1.0, //
            0.0, 2.0, //
            0.0, 3.0, //
            0.0, 5.0,
        ]);
        let b = DVector::from_row_slice(&[90.0, 91.0, 92.5, 94.0]);

        let tri = triangularize(&a);
        assert_eq!(tri.beta[0], 0.0);
        // The skipped reflector leaves `b` alone; the second one still rotates it.
        let d = apply_to_target(&b, &tri.u, &tri.beta, 2);
        assert!((d.norm() - b.norm()).abs() < 1e-9 * b.norm());
        let only_first = apply_to_target(&b, &tri.u, &tri.beta, 1);
        assert_eq!(only_first, b);

        assert_eq!(
            HouseholderSolver.solve(&a, &b).unwrap_err(),
            FitError::SingularMatrix { index: 0, size: 2 }
        );
    }

    #[test]
    fn zero_diagonal_with_nonzero_subcolumn_is_reflected() {
        let a = DMatrix::from_row_slice(3, 1, &[0.0, 3.0, 4.0]);
        let tri = triangularize(&a);
        assert!((tri.r[(0, 0)].abs() - 5.0).abs() < 1e-12);
        assert_eq!(tri.r[(1, 0)], 0.0);
    }

    #[test]
    fn agrees_with_gram_schmidt_on_full_rank_inputs() {
        for seed in 0..5 {
            let (a, b) = random_system(40, 5, seed);
            let gs = GramSchmidtSolver.solve(&a, &b).unwrap();
            let hh = HouseholderSolver.solve(&a, &b).unwrap();

            for i in 0..5 {
                let scale = gs.x[i].abs().max(1.0);
                assert!((gs.x[i] - hh.x[i]).abs() <= 1e-8 * scale, "seed {seed}, coef {i}");
            }
        }
    }

    #[test]
    fn triangular_block_is_consistent() {
        let (a, b) = random_system(12, 3, 3);
        let sol = HouseholderSolver.solve(&a, &b).unwrap();
        let (r0, d0) = sol.triangular_system();
        assert!((&r0 * &sol.x - &d0).norm() < 1e-9);
    }

    #[test]
    fn dependent_columns_are_singular() {
        let a = DMatrix::from_row_slice(4, 3, &[
            1.0, 1.0, 0.0, //
            1.0, 1.0, 0.0, //
            1.0, 1.0, 0.0, //
            1.0, 1.0, 0.0,
        ]);
        let b = DVector::from_row_slice(&[1.0, 2.0, 3.0, 4.0]);
        assert!(matches!(
            HouseholderSolver.solve(&a, &b),
            Err(FitError::SingularMatrix { .. })
        ));
    }

    #[test]
    fn underdetermined_system_is_rejected() {
        let a = DMatrix::from_row_slice(2, 3, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        let b = DVector::from_row_slice(&[1.0, 2.0]);
        assert_eq!(
            HouseholderSolver.solve(&a, &b).unwrap_err(),
            FitError::InputShape { rows: 2, cols: 3 }
        );
    }
}
