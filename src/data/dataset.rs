use std::path::PathBuf;

use indicatif::ProgressBar;
use thiserror::Error;

use super::layout::InputLayout;
use crate::audio::AudioSample;
use crate::features::{pad_to_max_width, ExtractError, FailurePolicy, FeatureExtractor, PadError};
use crate::math::Matrix;
use crate::models::InputShape;

/// A file left out of the dataset because extraction failed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Excluded {
    pub path: PathBuf,
    pub reason: String,
}

#[derive(Debug, Error)]
#[error("failed to extract features from {}: {source}", path.display())]
pub struct ExtractFailure {
    pub path: PathBuf,
    #[source]
    pub source: ExtractError,
}

/// Extracted features before padding. `features[i]` belongs to `labels[i]`.
#[derive(Debug, Default)]
pub struct FeatureSet {
    pub features: Vec<Matrix>,
    pub labels: Vec<usize>,
    pub excluded: Vec<Excluded>,
}

impl FeatureSet {
    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

/// Run `extractor` over every sample, applying its failure policy.
pub fn build_feature_set(
    samples: &[AudioSample],
    extractor: &dyn FeatureExtractor,
) -> Result<FeatureSet, ExtractFailure> {
    let mut set = FeatureSet::default();
    let pb = ProgressBar::new(samples.len() as u64);
    for sample in samples {
        match extractor.extract(&sample.path) {
            Ok(feature) => {
                set.features.push(feature);
                set.labels.push(sample.label);
            }
            Err(source) => match extractor.failure_policy() {
                FailurePolicy::Skip => {
                    log::warn!("failed to process {}: {source}", sample.path.display());
                    set.excluded.push(Excluded {
                        path: sample.path.clone(),
                        reason: source.to_string(),
                    });
                }
                FailurePolicy::Abort => {
                    pb.abandon();
                    return Err(ExtractFailure {
                        path: sample.path.clone(),
                        source,
                    });
                }
            },
        }
        pb.inc(1);
    }
    pb.finish_and_clear();
    if !set.excluded.is_empty() {
        log::info!(
            "excluded {} of {} files after extraction errors",
            set.excluded.len(),
            samples.len()
        );
    }
    Ok(set)
}

/// Padded, uniformly shaped features ready for batching.
#[derive(Debug)]
pub struct Dataset {
    pub features: Vec<Matrix>,
    pub labels: Vec<usize>,
    pub layout: InputLayout,
    pub shape: InputShape,
    pub excluded: Vec<Excluded>,
}

impl Dataset {
    /// Pad `set` to a common width and fix the model input shape.
    pub fn from_feature_set(set: FeatureSet, layout: InputLayout) -> Result<Self, PadError> {
        let features = pad_to_max_width(set.features)?;
        let (rows, cols) = (features[0].rows, features[0].cols);
        Ok(Self {
            shape: layout.input_shape(rows, cols),
            features,
            labels: set.labels,
            layout,
            excluded: set.excluded,
        })
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// `(rows, cols)` of every feature.
    pub fn feature_dims(&self) -> (usize, usize) {
        self.features
            .first()
            .map(|m| (m.rows, m.cols))
            .unwrap_or((0, 0))
    }

    /// Count of samples per label, indexed by label.
    pub fn label_counts(&self, num_classes: usize) -> Vec<usize> {
        let mut counts = vec![0; num_classes];
        for &l in &self.labels {
            if l < num_classes {
                counts[l] += 1;
            }
        }
        counts
    }
}
