mod common;

use common::write_corpus;
use fakespeech::audio::DatasetSource;
use fakespeech::config::Config;
use fakespeech::features::FeatureConfig;
use fakespeech::models::InputShape;
use fakespeech::pipeline::{self, PipelineError};
use tempfile::tempdir;

fn config_for(fake_dir: std::path::PathBuf, real_dir: std::path::PathBuf, features: FeatureConfig) -> Config {
    let mut cfg = Config {
        dataset: DatasetSource::Dirs { fake_dir, real_dir },
        features,
        ..Config::default()
    };
    cfg.train.epochs = 1;
    cfg
}

#[test]
fn waveform_run_on_twenty_one_second_clips() {
    let dir = tempdir().unwrap();
    let (fake, real) = write_corpus(dir.path(), 10, 1.0, 16000);
    let features = FeatureConfig::Waveform {
        duration_secs: 1.0,
        fold_width: 160,
    };
    let cfg = config_for(fake, real, features);

    let data = pipeline::prepare_dataset(&cfg).unwrap();
    assert_eq!(data.len(), 20);
    assert_eq!(data.feature_dims(), (1, 16000));
    assert_eq!(data.label_counts(2), vec![10, 10]);
    assert_eq!(data.shape, InputShape::new(100, 160));

    let report = pipeline::run(&cfg).unwrap();
    assert_eq!(report.samples, 20);
    assert_eq!(report.split_sizes, (11, 3, 6));
    assert_eq!(report.epochs.len(), 1);
    assert!((0.0..=100.0).contains(&report.test_accuracy));
    assert!(report.excluded.is_empty());
}

#[test]
fn mel_run_skips_undecodable_files_and_writes_metrics() {
    let dir = tempdir().unwrap();
    let (fake, real) = write_corpus(dir.path(), 10, 0.5, 16000);
    std::fs::write(fake.join("broken.wav"), b"RIFF nope").unwrap();
    let logs = dir.path().join("runs");

    let mut cfg = config_for(fake, real, FeatureConfig::mel());
    cfg.train.epochs = 2;
    cfg.log_dir = Some(logs.to_string_lossy().into_owned());
    cfg.experiment = Some("mel".into());

    let report = pipeline::run(&cfg).unwrap();
    assert_eq!(report.samples, 20);
    assert_eq!(report.excluded.len(), 1);
    assert!(report.excluded[0].path.ends_with("broken.wav"));
    // 0.5 s at 16 kHz -> 1 + 8000 / 512 frames
    assert_eq!(report.input_shape, InputShape::new(128, 16));

    let metrics = std::fs::read_to_string(logs.join("mel").join("metrics.jsonl")).unwrap();
    let lines: Vec<&str> = metrics.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[2].contains("\"test\""));
}

#[test]
fn waveform_run_aborts_on_undecodable_file() {
    let dir = tempdir().unwrap();
    let (fake, real) = write_corpus(dir.path(), 5, 0.2, 8000);
    std::fs::write(real.join("broken.wav"), b"garbage").unwrap();
    let cfg = config_for(fake, real, FeatureConfig::waveform());
    assert!(matches!(pipeline::run(&cfg), Err(PipelineError::Extract(_))));
}

#[test]
fn empty_dataset_is_reported() {
    let dir = tempdir().unwrap();
    let cfg = config_for(dir.path().join("fake"), dir.path().join("real"), FeatureConfig::mel());
    assert!(matches!(pipeline::run(&cfg), Err(PipelineError::NoSamples)));
}
