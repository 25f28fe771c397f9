//! Seeded synthetic vocabulary generation.
//!
//! Each word gets its own sequence of hidden-state emission means; each
//! utterance walks those states in order, emitting Gaussian frames around
//! the state mean. Utterance lengths vary slightly so the corpus exercises
//! the variable-length handling of the selectors.
//!
//! Generation is fully determined by the seed: the same configuration always
//! produces the same corpus.

use std::collections::BTreeMap;

use nalgebra::DMatrix;
use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;

use crate::corpus::Corpus;
use crate::error::AppError;

/// Spread of the per-state emission means around the origin.
const MEAN_SPREAD: f64 = 4.0;

#[derive(Debug, Clone)]
pub struct SyntheticConfig {
    pub n_words: usize,
    pub utterances_per_word: usize,
    pub n_features: usize,
    /// Hidden states each word's generator walks through.
    pub true_states: usize,
    /// Frames emitted per state, before the per-utterance length jitter.
    pub frames_per_state: usize,
    /// Standard deviation of the frame noise around each state mean.
    pub noise: f64,
    pub seed: u64,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            n_words: 8,
            utterances_per_word: 6,
            n_features: 2,
            true_states: 3,
            frames_per_state: 4,
            noise: 0.3,
            seed: 42,
        }
    }
}

/// Generate a synthetic corpus.
pub fn generate_corpus(config: &SyntheticConfig) -> Result<Corpus, AppError> {
    if config.n_words == 0 || config.utterances_per_word == 0 {
        return Err(AppError::config("Synthetic corpus needs words and utterances."));
    }
    if config.n_features == 0 {
        return Err(AppError::config("Synthetic corpus needs at least 1 feature."));
    }
    if config.true_states == 0 || config.frames_per_state == 0 {
        return Err(AppError::config(
            "Synthetic corpus needs at least 1 state and 1 frame per state.",
        ));
    }
    if !(config.noise.is_finite() && config.noise > 0.0) {
        return Err(AppError::config("Synthetic noise must be finite and > 0."));
    }

    let mut rng = StdRng::seed_from_u64(config.seed);
    let normal = Normal::new(0.0, 1.0)
        .map_err(|e| AppError::numeric(format!("Noise distribution error: {e}")))?;

    let mut sequences = BTreeMap::new();
    for w in 0..config.n_words {
        // Per-word state means; words differ by their mean trajectories.
        let means: Vec<Vec<f64>> = (0..config.true_states)
            .map(|_| {
                (0..config.n_features)
                    .map(|_| MEAN_SPREAD * normal.sample(&mut rng))
                    .collect()
            })
            .collect();

        let mut utterances = Vec::with_capacity(config.utterances_per_word);
        for _ in 0..config.utterances_per_word {
            let mut frames: Vec<f64> = Vec::new();
            let mut n_rows = 0usize;
            for state_mean in &means {
                let reps = config.frames_per_state + rng.gen_range(0..=2);
                for _ in 0..reps {
                    for &m in state_mean {
                        frames.push(m + config.noise * normal.sample(&mut rng));
                    }
                    n_rows += 1;
                }
            }
            utterances.push(DMatrix::from_row_slice(n_rows, config.n_features, &frames));
        }
        sequences.insert(format!("W{:02}", w + 1), utterances);
    }

    Corpus::from_sequences(sequences)
}
