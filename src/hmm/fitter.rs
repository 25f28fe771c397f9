//! Fitting seam and the bundled reference fitter.
//!
//! The selection strategies treat fitting as a black box behind `HmmFitter`:
//! given a concatenated observation matrix, segment lengths, and a state
//! count, produce a trained model or an explicit `FitError`. Any fitter
//! satisfying the trait can be substituted; the iterative optimization
//! internals are deliberately outside this crate's contract.
//!
//! `SegmentalFitter` is a deterministic flat-start estimator kept here so the
//! binary and the end-to-end tests have a working collaborator:
//!
//! - divide each segment uniformly into `n_states` chunks
//! - estimate per-state diagonal Gaussian moments (with a variance floor)
//! - estimate smoothed transition/start probabilities from the chunk labels
//!
//! It fails, as a real trainer would, when the data cannot populate every
//! state: too few frames overall, or every segment shorter than the state
//! count. High state counts therefore genuinely fail on short words, which
//! is exactly the regime the selectors must survive.

use nalgebra::{DMatrix, DVector};
use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;

use crate::hmm::model::GaussianHmm;

/// Additive smoothing for transition/start probability rows.
///
/// Keeps every transition strictly positive so scoring a model against
/// another word's data yields a finite log-likelihood instead of `-inf`.
const PROB_SMOOTHING: f64 = 1e-3;

/// Why fitting a candidate failed.
///
/// Fitting failures are sentinel values, never propagated as process errors:
/// the selection strategies convert them into "this candidate is absent."
#[derive(Debug, Clone, PartialEq)]
pub enum FitError {
    /// Requested zero hidden states.
    NoStates,
    /// Not enough frames to estimate moments for every state.
    TooFewFrames { rows: usize, needed: usize },
    /// Segment lengths do not sum to the matrix row count, or a segment is empty.
    LengthMismatch { rows: usize, total: usize },
    /// A state received no frames under the segmentation.
    EmptyState { state: usize },
    /// Estimated parameters failed validation.
    InvalidModel(String),
}

impl std::fmt::Display for FitError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FitError::NoStates => write!(f, "state count must be >= 1"),
            FitError::TooFewFrames { rows, needed } => {
                write!(f, "only {rows} frames, need at least {needed}")
            }
            FitError::LengthMismatch { rows, total } => {
                write!(f, "segment lengths sum to {total} but matrix has {rows} rows")
            }
            FitError::EmptyState { state } => {
                write!(f, "state {state} received no frames")
            }
            FitError::InvalidModel(msg) => write!(f, "invalid model parameters: {msg}"),
        }
    }
}

impl std::error::Error for FitError {}

/// The black-box fitting operation the selectors search over.
pub trait HmmFitter {
    type Model: crate::hmm::model::HmmModel;

    /// Fit an HMM with `n_states` hidden states to the concatenated data.
    ///
    /// `seed` makes the fit reproducible across runs for a fixed input.
    fn fit(
        &self,
        x: &DMatrix<f64>,
        lengths: &[usize],
        n_states: usize,
        seed: u64,
    ) -> Result<Self::Model, FitError>;
}

/// Deterministic flat-start segmental estimator.
#[derive(Debug, Clone)]
pub struct SegmentalFitter {
    /// Floor applied to every diagonal variance.
    pub min_variance: f64,
    /// Scale of the seeded mean perturbation, relative to each state's
    /// standard deviation. Breaks ties between states estimated from
    /// identical chunks.
    pub mean_jitter: f64,
}

impl Default for SegmentalFitter {
    fn default() -> Self {
        Self {
            min_variance: 1e-3,
            mean_jitter: 1e-3,
        }
    }
}

impl HmmFitter for SegmentalFitter {
    type Model = GaussianHmm;

    fn fit(
        &self,
        x: &DMatrix<f64>,
        lengths: &[usize],
        n_states: usize,
        seed: u64,
    ) -> Result<GaussianHmm, FitError> {
        if n_states == 0 {
            return Err(FitError::NoStates);
        }
        let rows = x.nrows();
        let total: usize = lengths.iter().sum();
        if total != rows || lengths.contains(&0) || lengths.is_empty() {
            return Err(FitError::LengthMismatch { rows, total });
        }
        // Two frames per state is the minimum for a variance estimate.
        let needed = 2 * n_states;
        if rows < needed {
            return Err(FitError::TooFewFrames { rows, needed });
        }

        let d = x.ncols();
        let mut counts = vec![0.0f64; n_states];
        let mut sums = DMatrix::<f64>::zeros(n_states, d);
        let mut sq_sums = DMatrix::<f64>::zeros(n_states, d);
        let mut trans_counts = DMatrix::<f64>::zeros(n_states, n_states);
        let mut start_counts = vec![0.0f64; n_states];

        let mut offset = 0usize;
        for &len in lengths {
            let mut prev_state = None;
            for j in 0..len {
                // Uniform chunking: frame j of a length-len segment belongs
                // to state floor(j * n / len).
                let state = (j * n_states) / len;
                let row = offset + j;

                counts[state] += 1.0;
                for c in 0..d {
                    let v = x[(row, c)];
                    sums[(state, c)] += v;
                    sq_sums[(state, c)] += v * v;
                }
                if let Some(prev) = prev_state {
                    trans_counts[(prev, state)] += 1.0;
                } else {
                    start_counts[state] += 1.0;
                }
                prev_state = Some(state);
            }
            offset += len;
        }

        if let Some(state) = counts.iter().position(|&c| c == 0.0) {
            return Err(FitError::EmptyState { state });
        }

        let mut rng = StdRng::seed_from_u64(seed);
        let normal = Normal::new(0.0, 1.0)
            .map_err(|e| FitError::InvalidModel(format!("jitter distribution: {e}")))?;

        let mut means = DMatrix::<f64>::zeros(n_states, d);
        let mut variances = DMatrix::<f64>::zeros(n_states, d);
        for s in 0..n_states {
            for c in 0..d {
                let mean = sums[(s, c)] / counts[s];
                let var = (sq_sums[(s, c)] / counts[s] - mean * mean).max(self.min_variance);
                let z: f64 = normal.sample(&mut rng);
                means[(s, c)] = mean + z * self.mean_jitter * var.sqrt();
                variances[(s, c)] = var;
            }
        }

        let transition = normalize_rows(&trans_counts);
        let start = normalize_counts(&start_counts);

        GaussianHmm::new(start, transition, means, variances)
    }
}

/// Smooth and normalize transition counts into a row-stochastic matrix.
fn normalize_rows(counts: &DMatrix<f64>) -> DMatrix<f64> {
    let n = counts.nrows();
    let mut out = DMatrix::<f64>::zeros(n, n);
    for i in 0..n {
        let row_total: f64 = counts.row(i).iter().sum();
        let denom = row_total + n as f64 * PROB_SMOOTHING;
        for j in 0..n {
            out[(i, j)] = (counts[(i, j)] + PROB_SMOOTHING) / denom;
        }
    }
    out
}

fn normalize_counts(counts: &[f64]) -> DVector<f64> {
    let n = counts.len();
    let total: f64 = counts.iter().sum();
    let denom = total + n as f64 * PROB_SMOOTHING;
    DVector::from_iterator(n, counts.iter().map(|&c| (c + PROB_SMOOTHING) / denom))
}
