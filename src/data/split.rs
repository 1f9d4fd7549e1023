use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::rng::seeded;

#[derive(Debug, Error, PartialEq)]
pub enum SplitError {
    #[error("{name} must lie strictly between 0 and 1, got {value}")]
    InvalidFraction { name: &'static str, value: f64 },
    #[error("{partition} split is empty for {n} samples")]
    EmptyPartition { partition: &'static str, n: usize },
}

/// Proportions and seeds for the two-stage split.
///
/// The first cut takes `test_fraction` of everything as the test set, the
/// second takes `val_fraction` of what is left as validation. Both seeds
/// default to 42, which reuses the same shuffle seed for both cuts.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitConfig {
    pub test_fraction: f64,
    pub val_fraction: f64,
    pub test_seed: u64,
    pub val_seed: u64,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            test_fraction: 0.3,
            val_fraction: 0.2,
            test_seed: 42,
            val_seed: 42,
        }
    }
}

impl SplitConfig {
    pub fn validate(&self) -> Result<(), SplitError> {
        check_fraction("test_fraction", self.test_fraction)?;
        check_fraction("val_fraction", self.val_fraction)
    }
}

/// Sample indices of each partition, in the order the shuffle produced.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DatasetSplit {
    pub train: Vec<usize>,
    pub val: Vec<usize>,
    pub test: Vec<usize>,
}

impl DatasetSplit {
    /// `(train, val, test)` sizes.
    pub fn sizes(&self) -> (usize, usize, usize) {
        (self.train.len(), self.val.len(), self.test.len())
    }
}

fn check_fraction(name: &'static str, value: f64) -> Result<(), SplitError> {
    if value.is_finite() && value > 0.0 && value < 1.0 {
        Ok(())
    } else {
        Err(SplitError::InvalidFraction { name, value })
    }
}

/// Shuffle `indices` with `seed` and cut off `ceil(test_fraction * n)` of
/// them as the held-out part. Returns `(train, test)`.
pub fn train_test_split(
    indices: &[usize],
    test_fraction: f64,
    seed: u64,
) -> Result<(Vec<usize>, Vec<usize>), SplitError> {
    check_fraction("test_fraction", test_fraction)?;
    let n = indices.len();
    let n_test = ((test_fraction * n as f64).ceil() as usize).min(n);
    let mut shuffled = indices.to_vec();
    shuffled.shuffle(&mut seeded(seed));
    let train = shuffled.split_off(n_test);
    Ok((train, shuffled))
}

/// Partition `0..n` into train, validation and test sets.
pub fn split_dataset(n: usize, cfg: &SplitConfig) -> Result<DatasetSplit, SplitError> {
    cfg.validate()?;
    let all: Vec<usize> = (0..n).collect();
    let (rest, test) = train_test_split(&all, cfg.test_fraction, cfg.test_seed)?;
    let (train, val) = train_test_split(&rest, cfg.val_fraction, cfg.val_seed)?;
    for (partition, part) in [("train", &train), ("validation", &val), ("test", &test)] {
        if part.is_empty() {
            return Err(SplitError::EmptyPartition { partition, n });
        }
    }
    Ok(DatasetSplit { train, val, test })
}
