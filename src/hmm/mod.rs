//! Gaussian-emission HMM model contract and fitting seam.
//!
//! Responsibilities:
//!
//! - define the model contract the selectors score against (`HmmModel`)
//! - define the black-box fitting seam (`HmmFitter`) with explicit failure
//!   values (`FitError`) instead of panics
//! - provide a concrete diagonal-covariance model (`GaussianHmm`) scored via
//!   the log-space forward algorithm
//! - provide a deterministic reference fitter (`SegmentalFitter`) so the
//!   binary and the end-to-end tests have a working collaborator

pub mod fitter;
pub mod model;

pub use fitter::*;
pub use model::*;
