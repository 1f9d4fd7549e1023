use thiserror::Error;

use crate::audio::{labeled_samples, FAKE, REAL};
use crate::config::{Config, ConfigError};
use crate::data::{build_feature_set, split_dataset, Dataset, Excluded, ExtractFailure, SplitError};
use crate::features::PadError;
use crate::logging::Logger;
use crate::models::{AudioClassifier, InputShape, ModelError, NUM_CLASSES};
use crate::train::{self, EpochReport, TrainError};
use crate::util::logging::format_feature_shape;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("no usable audio samples found")]
    NoSamples,
    #[error(transparent)]
    Extract(#[from] ExtractFailure),
    #[error(transparent)]
    Pad(#[from] PadError),
    #[error(transparent)]
    Split(#[from] SplitError),
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error(transparent)]
    Train(#[from] TrainError),
}

/// Outcome of a full run.
#[derive(Clone, Debug, PartialEq)]
pub struct RunReport {
    pub epochs: Vec<EpochReport>,
    pub test_accuracy: f32,
    pub input_shape: InputShape,
    pub samples: usize,
    /// `(train, val, test)` sizes.
    pub split_sizes: (usize, usize, usize),
    pub excluded: Vec<Excluded>,
}

/// Enumerate, extract and pad: everything up to the split.
pub fn prepare_dataset(config: &Config) -> Result<Dataset, PipelineError> {
    let samples = labeled_samples(&config.dataset, &config.extensions);
    if samples.is_empty() {
        return Err(PipelineError::NoSamples);
    }

    let extractor = config.features.build();
    log::info!("extracting {} features from {} files", extractor.name(), samples.len());
    let set = build_feature_set(&samples, extractor.as_ref())?;
    if set.is_empty() {
        return Err(PipelineError::NoSamples);
    }
    let data = Dataset::from_feature_set(set, extractor.layout())?;
    let counts = data.label_counts(NUM_CLASSES);
    log::info!("{} fake / {} real samples after extraction", counts[FAKE], counts[REAL]);
    Ok(data)
}

/// Run the whole experiment described by `config`.
pub fn run(config: &Config) -> Result<RunReport, PipelineError> {
    config.validate()?;
    let data = prepare_dataset(config)?;
    println!("{}", format_feature_shape(data.len(), data.shape));

    let split = split_dataset(data.len(), &config.split)?;
    let (n_train, n_val, n_test) = split.sizes();
    log::info!("split {} samples into {n_train} train / {n_val} val / {n_test} test", data.len());

    let mut model = AudioClassifier::new(data.shape)?;
    log::info!(
        "model input {} -> {} flattened features",
        data.shape,
        model.flattened_features()
    );

    let mut logger = match config.log_dir.as_deref() {
        Some(dir) => match Logger::new(dir, config.experiment.as_deref()) {
            Ok(l) => {
                log::info!("writing metrics to {}", l.dir().display());
                Some(l)
            }
            Err(e) => {
                log::warn!("metrics disabled, cannot open {dir}: {e}");
                None
            }
        },
        None => None,
    };

    let report = train::run(&mut model, &data, &split, &config.train, logger.as_mut())?;

    Ok(RunReport {
        epochs: report.epochs,
        test_accuracy: report.test_accuracy,
        input_shape: data.shape,
        samples: data.len(),
        split_sizes: split.sizes(),
        excluded: data.excluded,
    })
}
