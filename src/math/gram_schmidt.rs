//! Least squares via modified Gram–Schmidt QR.
//!
//! Columns are orthogonalized left to right. Each new column has its projection
//! onto every earlier orthonormal column removed one at a time, against the
//! partially reduced vector (the "modified" variant), which loses far less
//! orthogonality than subtracting all projections of the original column.
//!
//! Rank test: a pivot `R[j,j]` counts as zero when it is no larger than
//! `RANK_TOLERANCE * ||A[:,j]||`. An exact-zero comparison would let columns that
//! are dependent up to rounding noise through and produce huge coefficients.

use nalgebra::{DMatrix, DVector};

use crate::domain::Strategy;
use crate::error::FitError;
use crate::math::solver::{Factors, LeastSquaresSolver, Solution, ensure_overdetermined};
use crate::math::triangular::back_substitute;

/// Relative size below which a pivot is treated as vanished.
pub const RANK_TOLERANCE: f64 = 1e-10;

/// Thin QR factorization `A = Q R` with `Q` (`m x n`) orthonormal and `R`
/// (`n x n`) upper triangular.
pub fn factorize(a: &DMatrix<f64>) -> Result<(DMatrix<f64>, DMatrix<f64>), FitError> {
    let (m, n) = a.shape();
    let mut q = DMatrix::zeros(m, n);
    let mut r = DMatrix::zeros(n, n);

    for j in 0..n {
        let mut v: DVector<f64> = a.column(j).into_owned();
        let column_norm = v.norm();

        for i in 0..j {
            let rij = q.column(i).dot(&v);
            r[(i, j)] = rij;
            v.axpy(-rij, &q.column(i), 1.0);
        }

        let rjj = v.norm();
        r[(j, j)] = rjj;
        if rjj <= RANK_TOLERANCE * column_norm {
            log::debug!("gram-schmidt: pivot {j} vanished ({rjj:.3e} vs column norm {column_norm:.3e})");
            return Err(FitError::RankDeficient {
                pivot: j,
                norm: rjj,
                rows: m,
                cols: n,
            });
        }

        q.set_column(j, &(v / rjj));
    }

    Ok((q, r))
}

/// Least-squares strategy backed by [`factorize`].
#[derive(Debug, Clone, Copy, Default)]
pub struct GramSchmidtSolver;

impl LeastSquaresSolver for GramSchmidtSolver {
    fn strategy(&self) -> Strategy {
        Strategy::GramSchmidt
    }

    fn solve(&self, a: &DMatrix<f64>, b: &DVector<f64>) -> Result<Solution, FitError> {
        ensure_overdetermined(a, b)?;

        let (q, r) = factorize(a)?;
        let d = q.tr_mul(b);
        let x = back_substitute(&r, &d)?;

        Ok(Solution {
            x,
            r,
            d,
            factors: Factors::GramSchmidt { q },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line_fit() -> (DMatrix<f64>, DVector<f64>) {
        let a = DMatrix::from_row_slice(3, 2, &[1.0, 1.0, 1.0, 2.0, 1.0, 3.0]);
        let b = DVector::from_row_slice(&[2.0, 3.0, 5.0]);
        (a, b)
    }

    #[test]
    fn fits_line_through_three_points() {
        let (a, b) = line_fit();
        let sol = GramSchmidtSolver.solve(&a, &b).unwrap();

        assert!((sol.x[0] - 1.0 / 3.0).abs() < 1e-10);
        assert!((sol.x[1] - 1.5).abs() < 1e-10);
        assert_eq!(sol.r.shape(), (2, 2));
        assert_eq!(sol.d.len(), 2);
    }

    #[test]
    fn q_is_orthonormal_and_reproduces_a() {
        let a = DMatrix::from_row_slice(
            5,
            3,
            &[
                1.0, 3.0, 20.1, //
                1.0, 4.0, 20.9, //
                1.0, 5.0, 23.4, //
                1.0, 6.0, 22.2, //
                1.0, 7.0, 25.0,
            ],
        );
        let (q, r) = factorize(&a).unwrap();

        let qtq = q.tr_mul(&q);
        assert!((qtq - DMatrix::<f64>::identity(3, 3)).norm() < 1e-10);
        assert!((&q * &r - &a).norm() < 1e-10);
        for i in 0..3 {
            for j in 0..i {
                assert_eq!(r[(i, j)], 0.0);
            }
        }
    }

    #[test]
    fn triangular_system_is_consistent() {
        let (a, b) = line_fit();
        let sol = GramSchmidtSolver.solve(&a, &b).unwrap();
        assert!((&sol.r * &sol.x - &sol.d).norm() < 1e-10);
    }

    #[test]
    fn duplicate_columns_are_rank_deficient() {
        let a = DMatrix::from_row_slice(4, 3, &[
            1.0, 2.0, 2.0, //
            1.0, 3.0, 3.0, //
            1.0, 5.0, 5.0, //
            1.0, 8.0, 8.0,
        ]);
        let b = DVector::from_row_slice(&[1.0, 2.0, 3.0, 4.0]);

        match GramSchmidtSolver.solve(&a, &b) {
            Err(FitError::RankDeficient { pivot, rows, cols, .. }) => {
                assert_eq!(pivot, 2);
                assert_eq!((rows, cols), (4, 3));
            }
            other => panic!("expected rank deficiency, got {other:?}"),
        }
    }

    #[test]
    fn zero_column_is_rank_deficient() {
        let a = DMatrix::from_row_slice(3, 2, &[1.0, 0.0, 1.0, 0.0, 1.0, 0.0]);
        assert!(matches!(factorize(&a), Err(FitError::RankDeficient { pivot: 1, .. })));
    }

    #[test]
    fn square_system_is_rejected() {
        let a = DMatrix::from_row_slice(2, 2, &[1.0, 0.0, 0.0, 1.0]);
        let b = DVector::from_row_slice(&[1.0, 1.0]);
        assert_eq!(
            GramSchmidtSolver.solve(&a, &b).unwrap_err(),
            FitError::InputShape { rows: 2, cols: 2 }
        );
    }
}
