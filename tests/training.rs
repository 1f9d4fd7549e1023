use fakespeech::data::{split_dataset, DataLoader, Dataset, FeatureSet, InputLayout, SplitConfig};
use fakespeech::math::{self, Matrix};
use fakespeech::models::AudioClassifier;
use fakespeech::optim::Adam;
use fakespeech::train::{self, evaluate, train_epoch, TrainConfig};

// Class 0 is dark with a bright top row, class 1 is bright with a dark top row.
fn stripes(n: usize) -> Dataset {
    let (h, w) = (8, 8);
    let mut features = Vec::new();
    let mut labels = Vec::new();
    for i in 0..n {
        let label = i % 2;
        let jitter = (i as f32 * 0.37).sin() * 0.1;
        let base = if label == 0 { -0.5 } else { 0.5 };
        let mut m = Matrix::from_vec(h, w, vec![base + jitter; h * w]);
        for c in 0..w {
            m.set(0, c, -base);
        }
        features.push(m);
        labels.push(label);
    }
    let set = FeatureSet {
        features,
        labels,
        excluded: Vec::new(),
    };
    Dataset::from_feature_set(set, InputLayout::AsIs).unwrap()
}

fn full_loss(model: &AudioClassifier, data: &Dataset, idx: &[usize]) -> f32 {
    let mut loader = DataLoader::new(data, idx, idx.len(), false, 0).unwrap();
    let batch = loader.next().unwrap();
    let logits = model.forward(&batch.inputs).unwrap();
    math::softmax_cross_entropy(&logits, &batch.targets).0
}

#[test]
fn adam_epochs_reduce_training_loss() {
    let data = stripes(16);
    let idx: Vec<usize> = (0..data.len()).collect();
    let mut model = AudioClassifier::new(data.shape).unwrap();
    let mut opt = Adam::default();
    let mut loader = DataLoader::new(&data, &idx, 8, true, 1).unwrap();

    let before = full_loss(&model, &data, &idx);
    for _ in 0..15 {
        train_epoch(&mut model, &mut opt, &mut loader).unwrap();
    }
    let after = full_loss(&model, &data, &idx);
    assert!(after < before, "loss went from {before} to {after}");
}

#[test]
fn evaluation_leaves_the_model_unchanged() {
    let data = stripes(10);
    let idx: Vec<usize> = (0..data.len()).collect();
    let model = AudioClassifier::new(data.shape).unwrap();
    let mut loader = DataLoader::new(&data, &idx, 4, false, 0).unwrap();
    let before = full_loss(&model, &data, &idx);
    let acc = evaluate(&model, &mut loader).unwrap();
    assert_eq!(acc.total, 10);
    assert!(acc.correct <= 10);
    assert_eq!(full_loss(&model, &data, &idx), before);
}

#[test]
fn run_reports_every_epoch_and_a_test_accuracy() {
    let data = stripes(20);
    let split = split_dataset(data.len(), &SplitConfig::default()).unwrap();
    let mut model = AudioClassifier::new(data.shape).unwrap();
    let cfg = TrainConfig {
        epochs: 3,
        batch_size: 4,
        ..TrainConfig::default()
    };
    let report = train::run(&mut model, &data, &split, &cfg, None).unwrap();
    let epochs: Vec<usize> = report.epochs.iter().map(|e| e.epoch).collect();
    assert_eq!(epochs, vec![1, 2, 3]);
    for e in &report.epochs {
        assert!(e.train_loss.is_finite());
        assert!((0.0..=100.0).contains(&e.val_accuracy));
    }
    assert!((0.0..=100.0).contains(&report.test_accuracy));
}
