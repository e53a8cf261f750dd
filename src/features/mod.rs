//! Feature engineering: record set -> design matrix.
//!
//! Only the whitelisted predictors in `domain::Feature` are recognized.

pub mod builder;

pub use builder::*;
