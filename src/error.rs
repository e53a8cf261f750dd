//! Error types.
//!
//! - `FitError`: failures of the numeric core (feature building, factorization,
//!   triangular solves). Each variant carries enough context to diagnose.
//! - `AppError`: what the binary reports, with the process exit code to use.

use thiserror::Error;

/// Exit code for unreadable input or bad options.
pub const EXIT_INPUT: u8 = 2;
/// Exit code for data that cannot produce a design matrix.
pub const EXIT_VALIDATION: u8 = 3;
/// Exit code for numerical failures during a solve.
pub const EXIT_NUMERIC: u8 = 4;

/// Failures of the least-squares core.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FitError {
    /// The record set cannot produce a usable design matrix.
    #[error("validation failed: {reason}")]
    Validation { reason: String },

    /// The system is not overdetermined.
    #[error("system must be overdetermined (m > n), got a {rows}x{cols} design matrix")]
    InputShape { rows: usize, cols: usize },

    /// A Gram–Schmidt pivot vanished: the columns are linearly dependent.
    #[error(
        "design matrix ({rows}x{cols}) is rank deficient: column {pivot} is linearly dependent on earlier columns (pivot norm {norm:.3e})"
    )]
    RankDeficient {
        pivot: usize,
        norm: f64,
        rows: usize,
        cols: usize,
    },

    /// A zero on the diagonal of an upper-triangular system.
    #[error("triangular system ({size}x{size}) is singular: zero diagonal entry at index {index}")]
    SingularMatrix { index: usize, size: usize },
}

impl FitError {
    pub fn validation(reason: impl Into<String>) -> Self {
        FitError::Validation {
            reason: reason.into(),
        }
    }
}

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<FitError> for AppError {
    fn from(err: FitError) -> Self {
        let exit_code = match err {
            FitError::Validation { .. } => EXIT_VALIDATION,
            FitError::InputShape { .. }
            | FitError::RankDeficient { .. }
            | FitError::SingularMatrix { .. } => EXIT_NUMERIC,
        };
        AppError::new(exit_code, err.to_string())
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}
