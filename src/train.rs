use indicatif::ProgressBar;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::data::{DataLoader, Dataset, DatasetSplit, LoaderError};
use crate::logging::{Logger, MetricRecord};
use crate::math;
use crate::metrics::Accuracy;
use crate::models::{AudioClassifier, ModelError};
use crate::optim::{Adam, Optimizer};
use crate::util::logging::{format_epoch_line, format_test_line};

#[derive(Debug, Error)]
pub enum TrainError {
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error(transparent)]
    Loader(#[from] LoaderError),
}

/// Training hyper-parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainConfig {
    pub epochs: usize,
    /// Batch size of the shuffled training loader.
    pub batch_size: usize,
    /// Batch size of the validation and test loaders.
    pub eval_batch_size: usize,
    pub learning_rate: f32,
    /// Seed of the per-epoch training shuffle.
    pub shuffle_seed: u64,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            epochs: 20,
            batch_size: 64,
            eval_batch_size: 32,
            learning_rate: 1e-3,
            shuffle_seed: 0,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct EpochReport {
    /// 1-based epoch number.
    pub epoch: usize,
    /// Loss of the last training batch of the epoch.
    pub train_loss: f32,
    pub val_accuracy: f32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TrainReport {
    pub epochs: Vec<EpochReport>,
    pub test_accuracy: f32,
}

/// One pass of Adam updates over `loader`. Returns the last batch's loss.
pub fn train_epoch<O: Optimizer>(
    model: &mut AudioClassifier,
    optimizer: &mut O,
    loader: &mut DataLoader<'_>,
) -> Result<f32, ModelError> {
    let mut last_loss = 0.0f32;
    loader.reset();
    for batch in loader.by_ref() {
        let logits = model.forward_train(&batch.inputs)?;
        let (loss, grad) = math::softmax_cross_entropy(&logits, &batch.targets);
        model.zero_grad();
        model.backward(&grad);
        optimizer.step(&mut model.parameters());
        log::debug!("batch of {} loss {loss:.4}", batch.len());
        last_loss = loss;
    }
    Ok(last_loss)
}

/// Accuracy of `model` over one ordered pass of `loader`. No activations are
/// cached and no gradients are touched.
pub fn evaluate(model: &AudioClassifier, loader: &mut DataLoader<'_>) -> Result<Accuracy, ModelError> {
    let mut acc = Accuracy::default();
    loader.reset();
    for batch in loader.by_ref() {
        let preds = model.predict(&batch.inputs)?;
        acc.update(&preds, &batch.targets);
    }
    Ok(acc)
}

/// Train for `cfg.epochs` epochs, validating after each, then report test
/// accuracy on the final weights.
pub fn run(
    model: &mut AudioClassifier,
    data: &Dataset,
    split: &DatasetSplit,
    cfg: &TrainConfig,
    mut logger: Option<&mut Logger>,
) -> Result<TrainReport, TrainError> {
    let mut train_loader = DataLoader::new(data, &split.train, cfg.batch_size, true, cfg.shuffle_seed)?;
    let mut val_loader = DataLoader::new(data, &split.val, cfg.eval_batch_size, false, 0)?;
    let mut test_loader = DataLoader::new(data, &split.test, cfg.eval_batch_size, false, 0)?;
    let mut optimizer = Adam::with_lr(cfg.learning_rate);
    log::info!(
        "training on {} samples ({} batches per epoch) for {} epochs",
        train_loader.num_samples(),
        train_loader.num_batches(),
        cfg.epochs
    );

    let pb = ProgressBar::new(cfg.epochs as u64);
    let mut epochs = Vec::with_capacity(cfg.epochs);
    for epoch in 1..=cfg.epochs {
        let train_loss = train_epoch(model, &mut optimizer, &mut train_loader)?;
        let val = evaluate(model, &mut val_loader)?;
        let val_accuracy = val.percent();

        pb.suspend(|| println!("{}", format_epoch_line(epoch, cfg.epochs, train_loss, val_accuracy)));
        pb.inc(1);
        if let Some(l) = logger.as_deref_mut() {
            l.log(&MetricRecord {
                epoch,
                loss: Some(train_loss),
                accuracy: val_accuracy,
                kind: "val",
            });
        }
        epochs.push(EpochReport {
            epoch,
            train_loss,
            val_accuracy,
        });
    }
    pb.finish_and_clear();

    let test = evaluate(model, &mut test_loader)?;
    let test_accuracy = test.percent();
    println!("{}", format_test_line(test_accuracy));
    log::info!("test: {} of {} correct", test.correct, test.total);
    if let Some(l) = logger.as_deref_mut() {
        l.log(&MetricRecord {
            epoch: cfg.epochs,
            loss: None,
            accuracy: test_accuracy,
            kind: "test",
        });
    }

    Ok(TrainReport {
        epochs,
        test_accuracy,
    })
}
