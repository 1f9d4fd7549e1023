mod common;

use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;

use common::{sine, write_wav};
use fakespeech::audio::{find_audio_files, labeled_samples, DatasetSource, FAKE, REAL};
use fakespeech::data::{
    split_dataset, DataLoader, Dataset, FeatureSet, InputLayout, LoaderError, SplitConfig,
    SplitError,
};
use fakespeech::math::Matrix;
use fakespeech::models::InputShape;
use tempfile::tempdir;

fn exts() -> Vec<String> {
    vec!["wav".into(), "mp3".into()]
}

#[test]
fn per_class_dirs_are_labelled_and_filtered() {
    let dir = tempdir().unwrap();
    let tone = sine(440.0, 0.1, 8000);
    write_wav(&dir.path().join("f/b.wav"), &tone, 8000);
    write_wav(&dir.path().join("f/nested/a.WAV"), &tone, 8000);
    write_wav(&dir.path().join("r/c.wav"), &tone, 8000);
    fs::write(dir.path().join("f/notes.txt"), "skip me").unwrap();

    let source = DatasetSource::Dirs {
        fake_dir: dir.path().join("f"),
        real_dir: dir.path().join("r"),
    };
    let samples = labeled_samples(&source, &exts());
    let labels: Vec<usize> = samples.iter().map(|s| s.label).collect();
    assert_eq!(labels, vec![FAKE, FAKE, REAL]);
    assert!(samples.iter().all(|s| s.path.extension().is_some_and(|e| e != "txt")));
}

fn has_audio_extension(path: &std::path::Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("wav") || e.eq_ignore_ascii_case("mp3"))
}

#[test]
fn enumerated_paths_are_existing_audio_files_inside_the_tree() {
    let dir = tempdir().unwrap();
    let root = dir.path().join("corpus");
    let tone = sine(440.0, 0.05, 8000);
    write_wav(&root.join("fake/a.wav"), &tone, 8000);
    write_wav(&root.join("fake/deep/er/B.Wav"), &tone, 8000);
    write_wav(&root.join("real/c.WAV"), &tone, 8000);
    fs::write(root.join("real/d.Mp3"), b"").unwrap();
    fs::write(root.join("real/readme.md"), "x").unwrap();
    fs::create_dir_all(root.join("real/folder.wav")).unwrap();
    // a sibling outside the tree must never show up
    write_wav(&dir.path().join("fake_outside.wav"), &tone, 8000);

    let files = find_audio_files(&root, &exts());
    assert_eq!(files.len(), 4);
    for p in &files {
        assert!(p.starts_with(&root), "{} escaped the tree", p.display());
        assert!(p.is_file(), "{} is not a file", p.display());
        assert!(has_audio_extension(p), "{} has no audio extension", p.display());
    }

    let samples = labeled_samples(&DatasetSource::Root { root: root.clone() }, &exts());
    assert_eq!(samples.len(), 4);
    for s in &samples {
        assert!(s.path.starts_with(&root));
        assert!(s.path.is_file());
        assert!(has_audio_extension(&s.path));
    }
    let fakes = samples.iter().filter(|s| s.label == FAKE).count();
    assert_eq!(fakes, 2);
}

#[test]
fn root_mode_reads_labels_from_paths() {
    let dir = tempdir().unwrap();
    let tone = sine(440.0, 0.1, 8000);
    write_wav(&dir.path().join("Fake_voices/x.wav"), &tone, 8000);
    write_wav(&dir.path().join("real/speaker1/y.wav"), &tone, 8000);
    write_wav(&dir.path().join("other/z.wav"), &tone, 8000);

    let source = DatasetSource::Root {
        root: dir.path().to_path_buf(),
    };
    let samples = labeled_samples(&source, &exts());
    assert_eq!(samples.len(), 2);
    assert_eq!(samples[0].label, FAKE);
    assert_eq!(samples[1].label, REAL);
}

#[test]
fn missing_directories_yield_nothing() {
    let source = DatasetSource::Dirs {
        fake_dir: PathBuf::from("/definitely/not/here/fake"),
        real_dir: PathBuf::from("/definitely/not/here/real"),
    };
    assert!(labeled_samples(&source, &exts()).is_empty());
}

#[test]
fn split_partitions_are_disjoint_and_cover_everything() {
    for n in [10, 20, 37, 100] {
        let split = split_dataset(n, &SplitConfig::default()).unwrap();
        let mut seen = HashSet::new();
        for &i in split.train.iter().chain(&split.val).chain(&split.test) {
            assert!(i < n);
            assert!(seen.insert(i), "index {i} appears twice for n={n}");
        }
        assert_eq!(seen.len(), n);
        assert_eq!(split.test.len(), (0.3 * n as f64).ceil() as usize);
    }
}

#[test]
fn split_is_reproducible_and_seed_dependent() {
    let cfg = SplitConfig::default();
    assert_eq!(split_dataset(50, &cfg).unwrap(), split_dataset(50, &cfg).unwrap());
    let other = SplitConfig {
        test_seed: 7,
        ..SplitConfig::default()
    };
    assert_ne!(split_dataset(50, &cfg).unwrap(), split_dataset(50, &other).unwrap());
}

#[test]
fn split_rejects_tiny_datasets_and_bad_fractions() {
    assert!(matches!(
        split_dataset(2, &SplitConfig::default()),
        Err(SplitError::EmptyPartition { .. })
    ));
    let bad = SplitConfig {
        val_fraction: 1.5,
        ..SplitConfig::default()
    };
    assert!(matches!(
        split_dataset(20, &bad),
        Err(SplitError::InvalidFraction { .. })
    ));
}

fn toy_dataset(n: usize, width: usize) -> Dataset {
    let set = FeatureSet {
        features: (0..n)
            .map(|i| Matrix::from_vec(1, width, vec![i as f32; width]))
            .collect(),
        labels: (0..n).map(|i| i % 2).collect(),
        excluded: Vec::new(),
    };
    Dataset::from_feature_set(set, InputLayout::Folded { width: 4 }).unwrap()
}

#[test]
fn dataset_pads_and_folds_features() {
    let set = FeatureSet {
        features: vec![Matrix::zeros(1, 6), Matrix::from_vec(1, 9, vec![1.0; 9])],
        labels: vec![0, 1],
        excluded: Vec::new(),
    };
    let data = Dataset::from_feature_set(set, InputLayout::Folded { width: 4 }).unwrap();
    assert_eq!(data.feature_dims(), (1, 9));
    assert_eq!(data.shape, InputShape::new(3, 4));
    assert_eq!(data.label_counts(2), vec![1, 1]);
}

#[test]
fn loader_yields_short_last_batch_in_order() {
    let data = toy_dataset(7, 8);
    let idx = [6, 0, 3, 1, 5];
    let loader = DataLoader::new(&data, &idx, 2, false, 0).unwrap();
    assert_eq!(loader.num_batches(), 3);
    let batches: Vec<_> = loader.collect();
    let sizes: Vec<usize> = batches.iter().map(|b| b.len()).collect();
    assert_eq!(sizes, vec![2, 2, 1]);
    // row 0 of the first batch is sample 6
    assert_eq!(batches[0].inputs.get(0, 0), 6.0);
    assert_eq!(batches[0].inputs.cols, 8);
    assert_eq!(batches[2].targets, vec![5 % 2]);
}

#[test]
fn shuffled_loader_reorders_between_passes_but_keeps_members() {
    let data = toy_dataset(40, 4);
    let idx: Vec<usize> = (0..40).collect();
    let mut loader = DataLoader::new(&data, &idx, 8, true, 3).unwrap();
    let first = loader.order().to_vec();
    loader.reset();
    let second = loader.order().to_vec();
    assert_ne!(first, second);
    let mut sorted = second.clone();
    sorted.sort_unstable();
    assert_eq!(sorted, idx);
}

#[test]
fn loader_rejects_bad_arguments() {
    let data = toy_dataset(3, 4);
    assert!(matches!(
        DataLoader::new(&data, &[0], 0, false, 0),
        Err(LoaderError::ZeroBatchSize)
    ));
    assert!(matches!(
        DataLoader::new(&data, &[0, 3], 1, false, 0),
        Err(LoaderError::IndexOutOfRange { index: 3, len: 3 })
    ));
}
