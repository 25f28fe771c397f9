//! Deterministic k-fold index splitting.
//!
//! Folds are contiguous index blocks with no shuffling, so a given corpus
//! always produces the same splits. The first `n_items % n_splits` folds get
//! one extra item, mirroring the conventional k-fold layout.

use crate::error::AppError;

/// K-fold splitter over `0..n_items`.
#[derive(Debug, Clone, Copy)]
pub struct KFold {
    n_splits: usize,
}

impl Default for KFold {
    fn default() -> Self {
        Self { n_splits: 3 }
    }
}

impl KFold {
    pub fn new(n_splits: usize) -> Self {
        Self { n_splits }
    }

    pub fn n_splits(&self) -> usize {
        self.n_splits
    }

    /// Produce `(train_indices, test_indices)` pairs covering `0..n_items`.
    ///
    /// Each index appears in exactly one test fold.
    pub fn split(&self, n_items: usize) -> Result<Vec<(Vec<usize>, Vec<usize>)>, AppError> {
        if self.n_splits < 2 {
            return Err(AppError::config("KFold requires at least 2 splits."));
        }
        if n_items < self.n_splits {
            return Err(AppError::data(format!(
                "Cannot split {n_items} items into {} folds.",
                self.n_splits
            )));
        }

        let base = n_items / self.n_splits;
        let remainder = n_items % self.n_splits;

        let mut out = Vec::with_capacity(self.n_splits);
        let mut start = 0usize;
        for fold in 0..self.n_splits {
            let size = base + usize::from(fold < remainder);
            let stop = start + size;
            let test: Vec<usize> = (start..stop).collect();
            let train: Vec<usize> = (0..start).chain(stop..n_items).collect();
            out.push((train, test));
            start = stop;
        }

        Ok(out)
    }
}
