//! Scoring criteria for candidate models.
//!
//! BIC (minimized): `-2 * logL + p * ln(N)` where `N` is the number of
//! training sequences and `p` the free-parameter count of a diagonal-covariance
//! Gaussian HMM.
//!
//! DIC (maximized): the model's log-likelihood on its own word minus the mean
//! log-likelihood it assigns to the rest of the vocabulary. Rewards models
//! that fit their word while discriminating against competitors.

/// Free parameters of an `n`-state HMM with `d`-dimensional diagonal
/// Gaussian emissions.
///
/// `n*n` transition entries plus `2*n*d` Gaussian parameters (means and
/// diagonal variances), minus one normalization constraint.
pub fn free_parameters(n_states: usize, n_features: usize) -> usize {
    n_states * n_states + 2 * n_states * n_features - 1
}

/// Bayesian Information Criterion. Lower is better.
pub fn bic(log_likelihood: f64, free_params: usize, n_sequences: usize) -> f64 {
    -2.0 * log_likelihood + free_params as f64 * (n_sequences as f64).ln()
}

/// Discriminative Information Criterion. Higher is better.
///
/// `total_log_likelihood` is the sum of the model's scores over every word
/// in the vocabulary, including its own; `n_words` must be >= 2 (the caller
/// guards this before any fitting happens).
pub fn dic(log_likelihood: f64, total_log_likelihood: f64, n_words: usize) -> f64 {
    let competitors = (n_words - 1) as f64;
    log_likelihood - (total_log_likelihood - log_likelihood) / competitors
}
