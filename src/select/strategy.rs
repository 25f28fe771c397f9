//! The four selection strategies behind one `select()` entry point.
//!
//! Search-range and tie-break semantics are asymmetric between strategies,
//! and downstream consumers depend on them staying that way:
//!
//! - BIC and DIC search `min_n..max_n` (max exclusive) and keep the FIRST
//!   candidate on ties (replacement only on strict improvement)
//! - CV searches `min_n..=max_n` (max inclusive) and keeps the LAST
//!   candidate on ties (replacement on greater-or-equal)
//!
//! The asymmetries look accidental rather than designed, but compatibility
//! wins here; see DESIGN.md before unifying them.
//!
//! Every fit and score call resolves to a value, never a panic: a failing
//! candidate is simply absent from the comparison. `select()` returning
//! `Ok(None)` is an expected outcome for rare/short words.

use nalgebra::DMatrix;

use crate::corpus::{Corpus, FlatSeries, combine_sequences};
use crate::domain::{SelectConfig, SelectorKind};
use crate::error::AppError;
use crate::hmm::{HmmFitter, HmmModel};
use crate::select::candidates::CandidateFitter;
use crate::select::criteria::{bic, dic, free_parameters};
use crate::select::folds::KFold;

/// Selects the hidden-state count for one vocabulary word.
///
/// Holds read-only views into the corpus; nothing is mutated during
/// selection, so independent selectors may run concurrently across words.
pub struct ModelSelector<'a, F: HmmFitter> {
    corpus: &'a Corpus,
    word: &'a str,
    sequences: &'a [DMatrix<f64>],
    flat: &'a FlatSeries,
    config: &'a SelectConfig,
    fitter: CandidateFitter<'a, F>,
}

impl<'a, F: HmmFitter> ModelSelector<'a, F> {
    pub fn new(
        corpus: &'a Corpus,
        word: &'a str,
        config: &'a SelectConfig,
        fitter: &'a F,
    ) -> Result<Self, AppError> {
        config.validate()?;
        let sequences = corpus
            .sequences_of(word)
            .ok_or_else(|| AppError::data(format!("Word '{word}' is not in the corpus.")))?;
        let flat = corpus
            .flat_of(word)
            .ok_or_else(|| AppError::data(format!("Word '{word}' has no flattened data.")))?;

        Ok(Self {
            corpus,
            word,
            sequences,
            flat,
            config,
            fitter: CandidateFitter::new(fitter, word, config.random_state, config.verbose),
        })
    }

    pub fn word(&self) -> &str {
        self.word
    }

    /// Run the configured strategy and return the winning fitted model.
    ///
    /// `Ok(None)` means no candidate in the search range fit and scored
    /// successfully. The only hard error is a degenerate configuration
    /// (currently: DIC over a single-word corpus).
    pub fn select(&self) -> Result<Option<F::Model>, AppError> {
        match self.config.strategy {
            SelectorKind::Constant => Ok(self.select_constant()),
            SelectorKind::Bic => Ok(self.select_bic()),
            SelectorKind::Dic => self.select_dic(),
            SelectorKind::Cv => Ok(self.select_cross_validated()),
        }
    }

    /// Baseline policy: one fit at the configured constant state count.
    fn select_constant(&self) -> Option<F::Model> {
        self.fitter
            .fit(&self.flat.x, &self.flat.lengths, self.config.n_constant)
    }

    /// Minimize BIC over `min_n..max_n`.
    fn select_bic(&self) -> Option<F::Model> {
        let mut best: Option<(F::Model, f64)> = None;

        for n in self.config.min_n_components..self.config.max_n_components {
            let Some(model) = self.fitter.fit(&self.flat.x, &self.flat.lengths, n) else {
                continue;
            };
            let Ok(log_l) = model.score(&self.flat.x, &self.flat.lengths) else {
                continue;
            };
            let p = free_parameters(n, model.n_features());
            let score = bic(log_l, p, self.flat.n_sequences());

            // Strict improvement only: ties keep the lowest state count.
            if best.as_ref().is_none_or(|(_, b)| score < *b) {
                best = Some((model, score));
            }
        }

        best.map(|(model, _)| model)
    }

    /// Maximize DIC over `min_n..max_n`.
    fn select_dic(&self) -> Result<Option<F::Model>, AppError> {
        let n_words = self.corpus.len();
        if n_words < 2 {
            return Err(AppError::config(format!(
                "DIC needs at least 2 vocabulary words to compare against, corpus has {n_words}."
            )));
        }

        let mut best: Option<(F::Model, f64)> = None;

        'candidates: for n in self.config.min_n_components..self.config.max_n_components {
            let Some(model) = self.fitter.fit(&self.flat.x, &self.flat.lengths, n) else {
                continue;
            };
            let Ok(log_l) = model.score(&self.flat.x, &self.flat.lengths) else {
                continue;
            };

            // Corpus-wide sum, own word included; dic() subtracts it back out.
            let mut total = 0.0;
            for (_, flat) in self.corpus.flattened() {
                match model.score(&flat.x, &flat.lengths) {
                    Ok(value) => total += value,
                    Err(_) => continue 'candidates,
                }
            }

            let score = dic(log_l, total, n_words);
            if best.as_ref().is_none_or(|(_, b)| score > *b) {
                best = Some((model, score));
            }
        }

        Ok(best.map(|(model, _)| model))
    }

    /// Maximize the mean held-out log-likelihood over `min_n..=max_n`.
    fn select_cross_validated(&self) -> Option<F::Model> {
        let kfold = KFold::new(self.config.n_folds);
        let mut best: Option<(F::Model, f64)> = None;

        for n in self.config.min_n_components..=self.config.max_n_components {
            let candidate = if self.sequences.len() > 2 {
                self.evaluate_folds(&kfold, n)
            } else {
                // Too few utterances to hold any out: fit on the full data and
                // score against the training data itself. A documented
                // approximation for sparse words, not a bug.
                self.evaluate_on_full_data(n)
            };
            let Some((model, score)) = candidate else {
                continue;
            };

            // Greater-or-equal: ties keep the most recent candidate.
            if best.as_ref().is_none_or(|(_, b)| score >= *b) {
                best = Some((model, score));
            }
        }

        best.map(|(model, _)| model)
    }

    /// One candidate's k-fold evaluation.
    ///
    /// Returns the mean held-out log-likelihood paired with the model from
    /// the last fold (no full-data refit; callers accept the approximation).
    /// Any failure inside the fold loop drops the whole candidate.
    fn evaluate_folds(&self, kfold: &KFold, n_states: usize) -> Option<(F::Model, f64)> {
        let splits = kfold.split(self.sequences.len()).ok()?;

        let mut scores = Vec::with_capacity(splits.len());
        let mut last_model = None;
        for (train_idx, test_idx) in &splits {
            let train = combine_sequences(train_idx, self.sequences).ok()?;
            let test = combine_sequences(test_idx, self.sequences).ok()?;

            let model = self.fitter.fit(&train.x, &train.lengths, n_states)?;
            let log_l = model.score(&test.x, &test.lengths).ok()?;

            scores.push(log_l);
            last_model = Some(model);
        }

        let mean = scores.iter().sum::<f64>() / scores.len() as f64;
        last_model.map(|model| (model, mean))
    }

    fn evaluate_on_full_data(&self, n_states: usize) -> Option<(F::Model, f64)> {
        let model = self
            .fitter
            .fit(&self.flat.x, &self.flat.lengths, n_states)?;
        let log_l = model.score(&self.flat.x, &self.flat.lengths).ok()?;
        Some((model, log_l))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hmm::{FitError, ScoreError, SegmentalFitter};
    use std::cell::RefCell;
    use std::collections::BTreeMap;

    #[derive(Debug)]
    struct StubModel {
        n_states: usize,
        value: f64,
    }

    impl HmmModel for StubModel {
        fn n_states(&self) -> usize {
            self.n_states
        }

        fn n_features(&self) -> usize {
            1
        }

        fn score(&self, _x: &DMatrix<f64>, _lengths: &[usize]) -> Result<f64, ScoreError> {
            Ok(self.value)
        }
    }

    /// Scripted fitter: `scores` maps a state count to the log-likelihood its
    /// model reports; missing state counts fail to fit. Records every
    /// requested state count in order.
    struct StubFitter {
        scores: BTreeMap<usize, f64>,
        calls: RefCell<Vec<usize>>,
    }

    impl StubFitter {
        fn new(scores: &[(usize, f64)]) -> Self {
            Self {
                scores: scores.iter().copied().collect(),
                calls: RefCell::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<usize> {
            self.calls.borrow().clone()
        }
    }

    impl HmmFitter for StubFitter {
        type Model = StubModel;

        fn fit(
            &self,
            _x: &DMatrix<f64>,
            _lengths: &[usize],
            n_states: usize,
            _seed: u64,
        ) -> Result<StubModel, FitError> {
            self.calls.borrow_mut().push(n_states);
            match self.scores.get(&n_states) {
                Some(&value) => Ok(StubModel {
                    n_states,
                    value,
                }),
                None => Err(FitError::EmptyState { state: 0 }),
            }
        }
    }

    fn utterance(rows: usize) -> DMatrix<f64> {
        DMatrix::from_fn(rows, 1, |r, _| r as f64)
    }

    /// Corpus of `(word, utterance_count)` pairs, each utterance 4 frames.
    fn corpus(words: &[(&str, usize)]) -> Corpus {
        let mut sequences = BTreeMap::new();
        for &(word, count) in words {
            sequences.insert(word.to_string(), (0..count).map(|_| utterance(4)).collect());
        }
        Corpus::from_sequences(sequences).unwrap()
    }

    fn config(strategy: SelectorKind, min_n: usize, max_n: usize) -> SelectConfig {
        SelectConfig {
            strategy,
            min_n_components: min_n,
            max_n_components: max_n,
            ..SelectConfig::default()
        }
    }

    #[test]
    fn bic_search_excludes_the_upper_bound() {
        let corpus = corpus(&[("A", 2), ("B", 2)]);
        let fitter = StubFitter::new(&[(2, -10.0), (3, -10.0), (4, -10.0)]);
        let config = config(SelectorKind::Bic, 2, 4);

        let selector = ModelSelector::new(&corpus, "A", &config, &fitter).unwrap();
        selector.select().unwrap();
        assert_eq!(fitter.calls(), vec![2, 3]);
    }

    #[test]
    fn dic_search_excludes_the_upper_bound() {
        let corpus = corpus(&[("A", 2), ("B", 2)]);
        let fitter = StubFitter::new(&[(2, -10.0), (3, -10.0), (4, -10.0)]);
        let config = config(SelectorKind::Dic, 2, 4);

        let selector = ModelSelector::new(&corpus, "A", &config, &fitter).unwrap();
        selector.select().unwrap();
        assert_eq!(fitter.calls(), vec![2, 3]);
    }

    #[test]
    fn cv_search_includes_the_upper_bound() {
        // Two utterances: the fallback path makes exactly one fit per count.
        let corpus = corpus(&[("A", 2), ("B", 2)]);
        let fitter = StubFitter::new(&[(2, -10.0), (3, -10.0), (4, -10.0)]);
        let config = config(SelectorKind::Cv, 2, 4);

        let selector = ModelSelector::new(&corpus, "A", &config, &fitter).unwrap();
        selector.select().unwrap();
        assert_eq!(fitter.calls(), vec![2, 3, 4]);
    }

    #[test]
    fn bic_empty_range_returns_none_without_fitting() {
        let corpus = corpus(&[("A", 2), ("B", 2)]);
        let fitter = StubFitter::new(&[(5, -10.0)]);
        let config = config(SelectorKind::Bic, 5, 5);

        let selector = ModelSelector::new(&corpus, "A", &config, &fitter).unwrap();
        assert!(selector.select().unwrap().is_none());
        assert!(fitter.calls().is_empty());
    }

    #[test]
    fn bic_tie_keeps_the_lowest_state_count() {
        // One training sequence: ln(1) = 0 kills the parameter penalty, so
        // equal log-likelihoods produce exactly equal BIC scores.
        let corpus = corpus(&[("A", 1), ("B", 1)]);
        let fitter = StubFitter::new(&[(2, -10.0), (3, -10.0)]);
        let config = config(SelectorKind::Bic, 2, 4);

        let selector = ModelSelector::new(&corpus, "A", &config, &fitter).unwrap();
        let model = selector.select().unwrap().unwrap();
        assert_eq!(model.n_states(), 2);
    }

    #[test]
    fn dic_tie_keeps_the_lowest_state_count() {
        // The stub scores every word identically, so DIC is 0 for each
        // candidate and the first one evaluated must win.
        let corpus = corpus(&[("A", 2), ("B", 2), ("C", 2)]);
        let fitter = StubFitter::new(&[(2, -5.0), (3, -5.0)]);
        let config = config(SelectorKind::Dic, 2, 4);

        let selector = ModelSelector::new(&corpus, "A", &config, &fitter).unwrap();
        let model = selector.select().unwrap().unwrap();
        assert_eq!(model.n_states(), 2);
    }

    #[test]
    fn cv_tie_keeps_the_most_recent_candidate() {
        let corpus = corpus(&[("A", 2), ("B", 2)]);
        let fitter = StubFitter::new(&[(2, -10.0), (3, -10.0), (4, -10.0)]);
        let config = config(SelectorKind::Cv, 2, 4);

        let selector = ModelSelector::new(&corpus, "A", &config, &fitter).unwrap();
        let model = selector.select().unwrap().unwrap();
        assert_eq!(model.n_states(), 4);
    }

    #[test]
    fn cv_prefers_the_higher_scoring_candidate() {
        let corpus = corpus(&[("A", 2), ("B", 2)]);
        let fitter = StubFitter::new(&[(2, -5.0), (3, -20.0), (4, -20.0)]);
        let config = config(SelectorKind::Cv, 2, 4);

        let selector = ModelSelector::new(&corpus, "A", &config, &fitter).unwrap();
        let model = selector.select().unwrap().unwrap();
        assert_eq!(model.n_states(), 2);
    }

    #[test]
    fn cv_runs_one_fit_per_fold_with_enough_utterances() {
        let corpus = corpus(&[("A", 3), ("B", 2)]);
        let fitter = StubFitter::new(&[(2, -10.0)]);
        let config = config(SelectorKind::Cv, 2, 2);

        let selector = ModelSelector::new(&corpus, "A", &config, &fitter).unwrap();
        selector.select().unwrap();
        // Three folds over three utterances, candidate count 2 only.
        assert_eq!(fitter.calls(), vec![2, 2, 2]);
    }

    #[test]
    fn cv_two_utterances_skips_fold_splitting() {
        let corpus = corpus(&[("A", 2), ("B", 2)]);
        let fitter = StubFitter::new(&[(2, -10.0)]);
        let config = config(SelectorKind::Cv, 2, 2);

        let selector = ModelSelector::new(&corpus, "A", &config, &fitter).unwrap();
        let model = selector.select().unwrap().unwrap();
        assert_eq!(model.n_states(), 2);
        assert_eq!(fitter.calls(), vec![2]);
    }

    #[test]
    fn dic_on_a_single_word_corpus_is_a_configuration_error() {
        let corpus = corpus(&[("A", 2)]);
        let fitter = StubFitter::new(&[(2, -10.0)]);
        let config = config(SelectorKind::Dic, 2, 4);

        let selector = ModelSelector::new(&corpus, "A", &config, &fitter).unwrap();
        let err = selector.select().unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn all_failing_candidates_return_none_for_every_strategy() {
        let corpus = corpus(&[("A", 3), ("B", 2)]);
        for strategy in SelectorKind::ALL {
            let fitter = StubFitter::new(&[]);
            let config = config(strategy, 2, 4);
            let selector = ModelSelector::new(&corpus, "A", &config, &fitter).unwrap();
            assert!(selector.select().unwrap().is_none(), "{strategy:?}");
        }
    }

    #[test]
    fn constant_fits_exactly_once_at_the_fixed_count() {
        let corpus = corpus(&[("A", 2), ("B", 2)]);
        let fitter = StubFitter::new(&[(3, -10.0)]);
        let config = config(SelectorKind::Constant, 2, 10);

        let selector = ModelSelector::new(&corpus, "A", &config, &fitter).unwrap();
        let model = selector.select().unwrap().unwrap();
        assert_eq!(model.n_states(), 3);
        assert_eq!(fitter.calls(), vec![3]);
    }

    #[test]
    fn unknown_word_is_rejected_at_construction() {
        let corpus = corpus(&[("A", 2)]);
        let fitter = StubFitter::new(&[]);
        let config = config(SelectorKind::Bic, 2, 4);
        assert!(ModelSelector::new(&corpus, "MISSING", &config, &fitter).is_err());
    }

    /// End-to-end over real data with the bundled fitter: every strategy
    /// returns either nothing or a model whose state count lies inside the
    /// range that strategy actually evaluates.
    #[test]
    fn selected_state_counts_stay_in_range_with_a_real_fitter() {
        let mut sequences = BTreeMap::new();
        // Five short 2-dimensional utterances per word, two-phase shape.
        for (word, lo, hi) in [("HELLO", -2.0, 2.0), ("WORLD", 6.0, 12.0)] {
            let utterances: Vec<DMatrix<f64>> = (0..5)
                .map(|i| {
                    DMatrix::from_fn(8, 2, |r, c| {
                        let base = if r < 4 { lo } else { hi };
                        base + 0.05 * (i + r + c) as f64
                    })
                })
                .collect();
            sequences.insert(word.to_string(), utterances);
        }
        let corpus = Corpus::from_sequences(sequences).unwrap();
        let fitter = SegmentalFitter::default();

        for strategy in SelectorKind::ALL {
            let config = config(strategy, 2, 4);
            let selector = ModelSelector::new(&corpus, "HELLO", &config, &fitter).unwrap();
            let Some(model) = selector.select().unwrap() else {
                continue;
            };
            match strategy {
                SelectorKind::Constant => assert_eq!(model.n_states(), 3),
                SelectorKind::Bic | SelectorKind::Dic => {
                    assert!((2..4).contains(&model.n_states()), "{strategy:?}")
                }
                SelectorKind::Cv => {
                    assert!((2..=4).contains(&model.n_states()), "{strategy:?}")
                }
            }
        }
    }
}
