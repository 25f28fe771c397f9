//! State-count selection strategies.
//!
//! Responsibilities:
//!
//! - wrap the fitting seam so per-candidate failures become skips, not errors
//! - search the configured state-count range under one of four criteria
//!   (constant, BIC, DIC, cross-validated mean log-likelihood)
//! - return the single best fitted model, or nothing when no candidate
//!   survives

pub mod candidates;
pub mod criteria;
pub mod folds;
pub mod strategy;

pub use candidates::*;
pub use criteria::*;
pub use folds::*;
pub use strategy::*;
