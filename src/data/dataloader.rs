use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use thiserror::Error;

use super::dataset::Dataset;
use crate::math::Matrix;
use crate::rng::seeded;

#[derive(Debug, Error, PartialEq)]
pub enum LoaderError {
    #[error("batch size must be at least 1")]
    ZeroBatchSize,
    #[error("sample index {index} is out of range for {len} samples")]
    IndexOutOfRange { index: usize, len: usize },
}

/// One mini-batch: `inputs` is `batch x (height*width)`, `targets[i]` is the
/// label of row `i`.
#[derive(Clone, Debug, PartialEq)]
pub struct Batch {
    pub inputs: Matrix,
    pub targets: Vec<usize>,
}

impl Batch {
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

/// Batches over a subset of a [`Dataset`].
///
/// `reset` starts a new pass; with `shuffle` enabled it also draws a fresh
/// order from the loader's own seeded generator. The final batch of a pass
/// may be short.
pub struct DataLoader<'a> {
    data: &'a Dataset,
    order: Vec<usize>,
    batch_size: usize,
    shuffle: bool,
    rng: StdRng,
    index: usize,
}

impl<'a> DataLoader<'a> {
    pub fn new(
        data: &'a Dataset,
        indices: &[usize],
        batch_size: usize,
        shuffle: bool,
        seed: u64,
    ) -> Result<Self, LoaderError> {
        if batch_size == 0 {
            return Err(LoaderError::ZeroBatchSize);
        }
        if let Some(&index) = indices.iter().find(|&&i| i >= data.len()) {
            return Err(LoaderError::IndexOutOfRange {
                index,
                len: data.len(),
            });
        }
        let mut loader = Self {
            data,
            order: indices.to_vec(),
            batch_size,
            shuffle,
            rng: seeded(seed),
            index: 0,
        };
        loader.reset();
        Ok(loader)
    }

    /// Rewind to the first batch, reshuffling when enabled.
    pub fn reset(&mut self) {
        if self.shuffle {
            self.order.shuffle(&mut self.rng);
        }
        self.index = 0;
    }

    /// Number of samples per pass.
    pub fn num_samples(&self) -> usize {
        self.order.len()
    }

    /// Number of batches per pass.
    pub fn num_batches(&self) -> usize {
        self.order.len().div_ceil(self.batch_size)
    }

    /// Sample indices in the current pass order.
    pub fn order(&self) -> &[usize] {
        &self.order
    }

    fn assemble(&self, idx: &[usize]) -> Batch {
        let shape = self.data.shape;
        let mut inputs = Matrix::zeros(idx.len(), shape.len());
        let mut targets = Vec::with_capacity(idx.len());
        for (row, &i) in idx.iter().enumerate() {
            self.data
                .layout
                .write_row(&self.data.features[i], inputs.row_mut(row));
            targets.push(self.data.labels[i]);
        }
        Batch { inputs, targets }
    }
}

impl Iterator for DataLoader<'_> {
    type Item = Batch;

    fn next(&mut self) -> Option<Self::Item> {
        if self.index >= self.order.len() {
            return None;
        }
        let end = (self.index + self.batch_size).min(self.order.len());
        let batch = self.assemble(&self.order[self.index..end]);
        self.index = end;
        Some(batch)
    }
}
