//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - used in-memory during selection
//! - exported to JSON/CSV
//! - echoed back in reports for reproducibility

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Which selection criterion decides the state count for a word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SelectorKind {
    /// Always use the configured constant state count (baseline/control).
    Constant,
    /// Minimize the Bayesian Information Criterion over the search range.
    Bic,
    /// Maximize the Discriminative Information Criterion over the search range.
    Dic,
    /// Maximize the mean held-out log-likelihood over k folds.
    Cv,
}

impl SelectorKind {
    pub const ALL: [SelectorKind; 4] = [
        SelectorKind::Constant,
        SelectorKind::Bic,
        SelectorKind::Dic,
        SelectorKind::Cv,
    ];

    pub fn display_name(&self) -> &'static str {
        match self {
            SelectorKind::Constant => "constant",
            SelectorKind::Bic => "BIC",
            SelectorKind::Dic => "DIC",
            SelectorKind::Cv => "CV",
        }
    }
}

/// Configuration shared by every selection strategy.
///
/// Search-range semantics differ between strategies; existing consumers
/// depend on the difference, so both bounds are kept as-is:
///
/// - BIC and DIC search `min_n_components..max_n_components` (max exclusive)
/// - CV searches `min_n_components..=max_n_components` (max inclusive)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectConfig {
    /// Which criterion to apply.
    pub strategy: SelectorKind,
    /// Fixed state count used by the `constant` strategy.
    pub n_constant: usize,
    /// Lower bound of the state-count search range (must be >= 1).
    pub min_n_components: usize,
    /// Upper bound of the state-count search range.
    pub max_n_components: usize,
    /// Number of folds used by the `cv` strategy.
    pub n_folds: usize,
    /// Seed forwarded to the fitter for reproducible runs.
    pub random_state: u64,
    /// Log per-candidate fit success/failure to stderr.
    pub verbose: bool,
}

impl Default for SelectConfig {
    fn default() -> Self {
        Self {
            strategy: SelectorKind::Bic,
            n_constant: 3,
            min_n_components: 2,
            max_n_components: 10,
            n_folds: 3,
            random_state: 14,
            verbose: false,
        }
    }
}

impl SelectConfig {
    /// Validate the configuration before any fitting happens.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.min_n_components < 1 {
            return Err(AppError::config("min_n_components must be >= 1."));
        }
        if self.n_constant < 1 {
            return Err(AppError::config("n_constant must be >= 1."));
        }
        if self.n_folds < 2 {
            return Err(AppError::config("n_folds must be >= 2."));
        }
        Ok(())
    }
}

/// Outcome of selecting a state count for one vocabulary word.
///
/// `n_states` is `None` when no candidate in the search range fit and scored
/// successfully. That is an expected outcome for rare/short words, not an
/// error.
#[derive(Debug, Clone, Serialize)]
pub struct WordSelection {
    pub word: String,
    pub strategy: SelectorKind,
    pub n_states: Option<usize>,
    /// Log-likelihood of the winning model on the word's own full data.
    pub log_likelihood: Option<f64>,
    pub n_sequences: usize,
    pub n_frames: usize,
}

/// A full selection run, in exportable form.
#[derive(Debug, Clone, Serialize)]
pub struct SelectionReport {
    pub config: SelectConfig,
    pub results: Vec<WordSelection>,
}
