//! In-memory vocabulary corpus.
//!
//! A corpus maps each vocabulary word to:
//!
//! - its utterances: one feature matrix per utterance (rows = frames)
//! - a flattened form: all utterances concatenated into a single matrix plus
//!   the per-utterance segment lengths, which is the layout the fitter and
//!   the scoring contract consume
//!
//! Both forms are built once, validated, and never mutated afterwards. Word
//! order is kept deterministic (`BTreeMap`) so corpus-wide sums and reports
//! are stable across runs.

use std::collections::BTreeMap;

use nalgebra::DMatrix;

use crate::error::AppError;

/// A concatenated observation matrix with its segment lengths.
///
/// Invariant: `lengths` sums to `x.nrows()` and contains no zeros.
#[derive(Debug, Clone)]
pub struct FlatSeries {
    pub x: DMatrix<f64>,
    pub lengths: Vec<usize>,
}

impl FlatSeries {
    pub fn n_frames(&self) -> usize {
        self.x.nrows()
    }

    pub fn n_sequences(&self) -> usize {
        self.lengths.len()
    }
}

/// Vocabulary corpus holding both the per-utterance and the flattened form.
#[derive(Debug, Clone)]
pub struct Corpus {
    sequences: BTreeMap<String, Vec<DMatrix<f64>>>,
    flattened: BTreeMap<String, FlatSeries>,
    n_features: usize,
}

impl Corpus {
    /// Build a corpus from per-word utterance lists.
    ///
    /// Validates that the corpus is non-empty, that every word has at least
    /// one non-empty utterance, and that every utterance across the whole
    /// vocabulary shares one feature dimensionality (models trained on one
    /// word are scored against every other word's data by the DIC strategy).
    pub fn from_sequences(
        sequences: BTreeMap<String, Vec<DMatrix<f64>>>,
    ) -> Result<Self, AppError> {
        if sequences.is_empty() {
            return Err(AppError::data("Corpus has no vocabulary words."));
        }

        let mut n_features = 0usize;
        for (word, utterances) in &sequences {
            if utterances.is_empty() {
                return Err(AppError::data(format!("Word '{word}' has no utterances.")));
            }
            for (i, utterance) in utterances.iter().enumerate() {
                if utterance.nrows() == 0 {
                    return Err(AppError::data(format!(
                        "Word '{word}' utterance {i} has no frames."
                    )));
                }
                if utterance.iter().any(|v| !v.is_finite()) {
                    return Err(AppError::data(format!(
                        "Word '{word}' utterance {i} contains non-finite values."
                    )));
                }
                if n_features == 0 {
                    n_features = utterance.ncols();
                } else if utterance.ncols() != n_features {
                    return Err(AppError::data(format!(
                        "Word '{word}' utterance {i} has {} features, expected {n_features}.",
                        utterance.ncols()
                    )));
                }
            }
        }
        if n_features == 0 {
            return Err(AppError::data("Corpus has no feature columns."));
        }

        let mut flattened = BTreeMap::new();
        for (word, utterances) in &sequences {
            let all: Vec<usize> = (0..utterances.len()).collect();
            let flat = combine_sequences(&all, utterances)?;
            flattened.insert(word.clone(), flat);
        }

        Ok(Self {
            sequences,
            flattened,
            n_features,
        })
    }

    /// Number of vocabulary words.
    pub fn len(&self) -> usize {
        self.sequences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequences.is_empty()
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// Words in deterministic (sorted) order.
    pub fn words(&self) -> impl Iterator<Item = &str> {
        self.sequences.keys().map(String::as_str)
    }

    pub fn contains(&self, word: &str) -> bool {
        self.sequences.contains_key(word)
    }

    pub fn sequences_of(&self, word: &str) -> Option<&[DMatrix<f64>]> {
        self.sequences.get(word).map(Vec::as_slice)
    }

    pub fn flat_of(&self, word: &str) -> Option<&FlatSeries> {
        self.flattened.get(word)
    }

    /// Flattened data for every word, in deterministic order.
    pub fn flattened(&self) -> impl Iterator<Item = (&str, &FlatSeries)> {
        self.flattened.iter().map(|(w, f)| (w.as_str(), f))
    }
}

/// Concatenate the selected utterances into one matrix plus segment lengths.
///
/// The fitter requires a contiguous per-segment memory layout rather than a
/// list of variable-length sequences, so this helper is used both when the
/// corpus is built and per fold by the cross-validated strategy.
pub fn combine_sequences(
    indices: &[usize],
    utterances: &[DMatrix<f64>],
) -> Result<FlatSeries, AppError> {
    if indices.is_empty() {
        return Err(AppError::data("No utterance indices to combine."));
    }

    let mut total_rows = 0usize;
    let mut n_features = 0usize;
    for &idx in indices {
        let utterance = utterances.get(idx).ok_or_else(|| {
            AppError::data(format!(
                "Utterance index {idx} out of range (have {}).",
                utterances.len()
            ))
        })?;
        if n_features == 0 {
            n_features = utterance.ncols();
        } else if utterance.ncols() != n_features {
            return Err(AppError::data(format!(
                "Utterance {idx} has {} features, expected {n_features}.",
                utterance.ncols()
            )));
        }
        total_rows += utterance.nrows();
    }

    let mut x = DMatrix::<f64>::zeros(total_rows, n_features);
    let mut lengths = Vec::with_capacity(indices.len());
    let mut offset = 0usize;
    for &idx in indices {
        let utterance = &utterances[idx];
        for r in 0..utterance.nrows() {
            for c in 0..n_features {
                x[(offset + r, c)] = utterance[(r, c)];
            }
        }
        offset += utterance.nrows();
        lengths.push(utterance.nrows());
    }

    Ok(FlatSeries { x, lengths })
}
