//! Candidate fitting with catch-and-skip failure handling.
//!
//! Model selection must survive individual candidates being untrainable
//! (typically at low or high state counts, or with little data). Every fit
//! attempt therefore resolves to `Some(model)` or `None`; a failure for one
//! candidate never aborts the search over the remaining candidates.

use nalgebra::DMatrix;

use crate::hmm::HmmFitter;

/// Wraps the fitting seam for one target word.
#[derive(Debug, Clone)]
pub struct CandidateFitter<'a, F> {
    fitter: &'a F,
    word: &'a str,
    random_state: u64,
    verbose: bool,
}

impl<'a, F: HmmFitter> CandidateFitter<'a, F> {
    pub fn new(fitter: &'a F, word: &'a str, random_state: u64, verbose: bool) -> Self {
        Self {
            fitter,
            word,
            random_state,
            verbose,
        }
    }

    /// Fit one candidate, converting any failure into `None`.
    pub fn fit(&self, x: &DMatrix<f64>, lengths: &[usize], n_states: usize) -> Option<F::Model> {
        match self.fitter.fit(x, lengths, n_states, self.random_state) {
            Ok(model) => {
                if self.verbose {
                    eprintln!("model created for {} with {} states", self.word, n_states);
                }
                Some(model)
            }
            Err(err) => {
                if self.verbose {
                    eprintln!("failure on {} with {} states: {err}", self.word, n_states);
                }
                None
            }
        }
    }
}
