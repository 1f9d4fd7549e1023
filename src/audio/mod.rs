//! Locating labelled recordings on disk and decoding them to mono samples.

pub mod decode;
pub mod enumerate;

pub use decode::{downmix, load_audio, AudioClip, AudioError};
pub use enumerate::{
    find_audio_files, label_from_path, labeled_samples, AudioSample, DatasetSource, FAKE, REAL,
};
