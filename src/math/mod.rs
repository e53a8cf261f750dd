//! Numeric core: QR least-squares strategies, triangular solves and metrics.

pub mod gram_schmidt;
pub mod householder;
pub mod metrics;
pub mod solver;
pub mod triangular;

pub use gram_schmidt::GramSchmidtSolver;
pub use householder::HouseholderSolver;
pub use solver::*;
pub use triangular::back_substitute;
