//! Fitted Gaussian-emission HMM and its scoring contract.
//!
//! Scoring computes the log-likelihood of a concatenated observation matrix
//! under the model, one segment at a time, via the forward algorithm.
//!
//! Numerical notes:
//! - All recursion state is kept in log space; probabilities of long
//!   sequences underflow `f64` almost immediately otherwise.
//! - `log_sum_exp` guards the `-inf` cases explicitly so unreachable states
//!   (zero transition probability) do not poison the recursion with NaNs.

use nalgebra::{DMatrix, DVector};

use crate::hmm::fitter::FitError;

const LN_2PI: f64 = 1.8378770664093453;

/// Why scoring a model against a matrix failed.
///
/// Scoring failures are recoverable by design: the selection strategies drop
/// the offending candidate and continue the search.
#[derive(Debug, Clone, PartialEq)]
pub enum ScoreError {
    /// The matrix has a different feature count than the model was trained on.
    DimensionMismatch { expected: usize, found: usize },
    /// Segment lengths do not sum to the matrix row count, or a segment is empty.
    BadSegmentation { rows: usize, total: usize },
    /// No frames or no segments to score.
    Empty,
    /// The log-likelihood came out NaN or infinite.
    NonFinite,
}

impl std::fmt::Display for ScoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScoreError::DimensionMismatch { expected, found } => {
                write!(f, "feature dimension mismatch: model has {expected}, data has {found}")
            }
            ScoreError::BadSegmentation { rows, total } => {
                write!(f, "segment lengths sum to {total} but matrix has {rows} rows")
            }
            ScoreError::Empty => write!(f, "no observations to score"),
            ScoreError::NonFinite => write!(f, "log-likelihood is not finite"),
        }
    }
}

impl std::error::Error for ScoreError {}

/// Contract every fitted candidate must satisfy.
///
/// The selection strategies only ever need the state count, the feature
/// count (for the BIC parameter penalty), and a log-likelihood score.
pub trait HmmModel {
    fn n_states(&self) -> usize;
    fn n_features(&self) -> usize;

    /// Total log-likelihood of the concatenated observations.
    ///
    /// `lengths` partitions the rows of `x` into independent segments; the
    /// result is the sum of per-segment log-likelihoods.
    fn score(&self, x: &DMatrix<f64>, lengths: &[usize]) -> Result<f64, ScoreError>;
}

/// A fitted HMM with diagonal-covariance Gaussian emissions.
#[derive(Debug, Clone)]
pub struct GaussianHmm {
    /// Initial state distribution (length = state count).
    start: DVector<f64>,
    /// Row-stochastic transition matrix (state count x state count).
    transition: DMatrix<f64>,
    /// Per-state emission means (state count x feature count).
    means: DMatrix<f64>,
    /// Per-state diagonal variances (state count x feature count).
    variances: DMatrix<f64>,
}

impl GaussianHmm {
    /// Build a model from trained parameters, validating stochasticity.
    pub fn new(
        start: DVector<f64>,
        transition: DMatrix<f64>,
        means: DMatrix<f64>,
        variances: DMatrix<f64>,
    ) -> Result<Self, FitError> {
        let n = means.nrows();
        if n == 0 || means.ncols() == 0 {
            return Err(FitError::InvalidModel("empty parameter matrices".into()));
        }
        if start.len() != n || transition.nrows() != n || transition.ncols() != n {
            return Err(FitError::InvalidModel(format!(
                "parameter shape mismatch for {n} states"
            )));
        }
        if variances.nrows() != n || variances.ncols() != means.ncols() {
            return Err(FitError::InvalidModel(
                "variance matrix shape does not match means".into(),
            ));
        }
        if means.iter().any(|v| !v.is_finite()) {
            return Err(FitError::InvalidModel("non-finite emission mean".into()));
        }
        if variances.iter().any(|v| !(v.is_finite() && *v > 0.0)) {
            return Err(FitError::InvalidModel("non-positive emission variance".into()));
        }
        validate_distribution(start.iter().copied(), "start distribution")?;
        for i in 0..n {
            validate_distribution(transition.row(i).iter().copied(), "transition row")?;
        }

        Ok(Self {
            start,
            transition,
            means,
            variances,
        })
    }

    pub fn start(&self) -> &DVector<f64> {
        &self.start
    }

    pub fn transition(&self) -> &DMatrix<f64> {
        &self.transition
    }

    pub fn means(&self) -> &DMatrix<f64> {
        &self.means
    }

    pub fn variances(&self) -> &DMatrix<f64> {
        &self.variances
    }

    /// Log-density of one frame under one state's diagonal Gaussian.
    fn log_emission(&self, state: usize, x: &DMatrix<f64>, row: usize) -> f64 {
        let mut acc = 0.0;
        for d in 0..self.n_features() {
            let var = self.variances[(state, d)];
            let diff = x[(row, d)] - self.means[(state, d)];
            acc -= 0.5 * (LN_2PI + var.ln() + diff * diff / var);
        }
        acc
    }

    /// Forward-algorithm log-likelihood of one segment of `x`.
    fn segment_log_likelihood(&self, x: &DMatrix<f64>, offset: usize, len: usize) -> f64 {
        let n = self.n_states();
        let mut alpha: Vec<f64> = (0..n)
            .map(|i| self.start[i].ln() + self.log_emission(i, x, offset))
            .collect();

        let mut terms = vec![f64::NEG_INFINITY; n];
        for t in 1..len {
            let row = offset + t;
            let mut next = vec![f64::NEG_INFINITY; n];
            for (j, slot) in next.iter_mut().enumerate() {
                for i in 0..n {
                    terms[i] = alpha[i] + self.transition[(i, j)].ln();
                }
                *slot = log_sum_exp(&terms) + self.log_emission(j, x, row);
            }
            alpha = next;
        }

        log_sum_exp(&alpha)
    }
}

impl HmmModel for GaussianHmm {
    fn n_states(&self) -> usize {
        self.means.nrows()
    }

    fn n_features(&self) -> usize {
        self.means.ncols()
    }

    fn score(&self, x: &DMatrix<f64>, lengths: &[usize]) -> Result<f64, ScoreError> {
        if x.ncols() != self.n_features() {
            return Err(ScoreError::DimensionMismatch {
                expected: self.n_features(),
                found: x.ncols(),
            });
        }
        if x.nrows() == 0 || lengths.is_empty() {
            return Err(ScoreError::Empty);
        }
        let total: usize = lengths.iter().sum();
        if total != x.nrows() || lengths.contains(&0) {
            return Err(ScoreError::BadSegmentation {
                rows: x.nrows(),
                total,
            });
        }

        let mut log_likelihood = 0.0;
        let mut offset = 0usize;
        for &len in lengths {
            log_likelihood += self.segment_log_likelihood(x, offset, len);
            offset += len;
        }

        if log_likelihood.is_finite() {
            Ok(log_likelihood)
        } else {
            Err(ScoreError::NonFinite)
        }
    }
}

fn validate_distribution(
    probs: impl Iterator<Item = f64>,
    what: &str,
) -> Result<(), FitError> {
    let mut sum = 0.0;
    for p in probs {
        if !(p.is_finite() && (0.0..=1.0).contains(&p)) {
            return Err(FitError::InvalidModel(format!(
                "{what} contains an invalid probability"
            )));
        }
        sum += p;
    }
    if (sum - 1.0).abs() > 1e-6 {
        return Err(FitError::InvalidModel(format!(
            "{what} sums to {sum}, expected 1"
        )));
    }
    Ok(())
}

/// Numerically stable `log(Σ exp(x_i))` over a slice.
fn log_sum_exp(xs: &[f64]) -> f64 {
    let max = xs.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    if max == f64::NEG_INFINITY {
        return f64::NEG_INFINITY;
    }
    let sum: f64 = xs.iter().map(|&x| (x - max).exp()).sum();
    max + sum.ln()
}
