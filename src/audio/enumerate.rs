use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use walkdir::WalkDir;

/// Label for synthesized speech.
pub const FAKE: usize = 0;
/// Label for genuine speech.
pub const REAL: usize = 1;

/// A file to extract features from, with its class label.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AudioSample {
    pub path: PathBuf,
    pub label: usize,
}

/// Where labelled audio comes from.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DatasetSource {
    /// One directory per class.
    Dirs { fake_dir: PathBuf, real_dir: PathBuf },
    /// A single tree; labels are read from path components.
    Root { root: PathBuf },
}

impl Default for DatasetSource {
    fn default() -> Self {
        DatasetSource::Dirs {
            fake_dir: PathBuf::from("data/fake"),
            real_dir: PathBuf::from("data/real"),
        }
    }
}

fn has_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|os| os.to_str())
        .map(|ext| extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
        .unwrap_or(false)
}

/// Recursively collect files under `root` whose extension is in
/// `extensions` (case-insensitive, without the dot).
///
/// Unreadable entries are skipped and a missing `root` yields an empty list.
/// Entries are visited in file-name order so runs are reproducible.
pub fn find_audio_files(root: impl AsRef<Path>, extensions: &[String]) -> Vec<PathBuf> {
    WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| has_extension(p, extensions))
        .collect()
}

/// Label inferred from the path: a component mentioning "fake" wins over
/// one mentioning "real"; `None` when neither appears.
pub fn label_from_path(path: &Path) -> Option<usize> {
    let components: Vec<String> = path
        .components()
        .map(|c| c.as_os_str().to_string_lossy().to_lowercase())
        .collect();
    if components.iter().any(|c| c.contains("fake")) {
        Some(FAKE)
    } else if components.iter().any(|c| c.contains("real")) {
        Some(REAL)
    } else {
        None
    }
}

/// Enumerate every labelled sample described by `source`. Fake samples come
/// before real ones for [`DatasetSource::Dirs`].
pub fn labeled_samples(source: &DatasetSource, extensions: &[String]) -> Vec<AudioSample> {
    match source {
        DatasetSource::Dirs { fake_dir, real_dir } => {
            let tag = |dir: &PathBuf, label| {
                find_audio_files(dir, extensions)
                    .into_iter()
                    .map(move |path| AudioSample { path, label })
            };
            let fake: Vec<_> = tag(fake_dir, FAKE).collect();
            let real: Vec<_> = tag(real_dir, REAL).collect();
            log::info!(
                "found {} fake files in {} and {} real files in {}",
                fake.len(),
                fake_dir.display(),
                real.len(),
                real_dir.display()
            );
            fake.into_iter().chain(real).collect()
        }
        DatasetSource::Root { root } => {
            let mut samples = Vec::new();
            for path in find_audio_files(root, extensions) {
                // only the part below `root` decides the label
                let relative = path.strip_prefix(root).unwrap_or(&path);
                match label_from_path(relative) {
                    Some(label) => samples.push(AudioSample { path, label }),
                    None => log::debug!("no fake/real marker in {}, skipping", path.display()),
                }
            }
            log::info!("found {} labelled files under {}", samples.len(), root.display());
            samples
        }
    }
}
