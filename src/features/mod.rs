//! Turning audio files into 2-D numeric features.

pub mod mel;
pub mod pad;
pub mod waveform;

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::audio::AudioError;
use crate::data::layout::InputLayout;
use crate::math::Matrix;

pub use mel::{MelExtractor, MelSpectrogram};
pub use pad::{pad_to_max_width, truncate_width, PadError};
pub use waveform::{fix_length, WaveformExtractor};

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error(transparent)]
    Audio(#[from] AudioError),
    #[error("audio contains no samples")]
    EmptyAudio,
    #[error("invalid feature parameters: {0}")]
    InvalidParameter(String),
}

/// What the dataset builder does when a file fails to extract.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Log it, record it as excluded and continue with the rest.
    Skip,
    /// Stop the run with the error.
    Abort,
}

/// A strategy mapping an audio file to a 2-D feature matrix.
pub trait FeatureExtractor {
    fn extract(&self, path: &Path) -> Result<Matrix, ExtractError>;

    fn failure_policy(&self) -> FailurePolicy;

    /// How a (padded) feature is laid out as a single-channel model input.
    fn layout(&self) -> InputLayout;

    /// Short name for logs.
    fn name(&self) -> &'static str;
}

fn default_duration() -> f32 {
    3.0
}

fn default_fold_width() -> usize {
    160
}

fn default_n_mels() -> usize {
    128
}

fn default_n_fft() -> usize {
    2048
}

fn default_hop_length() -> usize {
    512
}

/// Feature strategy selected in the configuration file.
///
/// ```toml
/// [features]
/// kind = "waveform"
/// duration_secs = 1.0
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum FeatureConfig {
    Waveform {
        #[serde(default = "default_duration")]
        duration_secs: f32,
        #[serde(default = "default_fold_width")]
        fold_width: usize,
    },
    Mel {
        #[serde(default = "default_n_mels")]
        n_mels: usize,
        #[serde(default = "default_n_fft")]
        n_fft: usize,
        #[serde(default = "default_hop_length")]
        hop_length: usize,
    },
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self::mel()
    }
}

impl FeatureConfig {
    /// Mel-spectrogram strategy with default parameters.
    pub fn mel() -> Self {
        FeatureConfig::Mel {
            n_mels: default_n_mels(),
            n_fft: default_n_fft(),
            hop_length: default_hop_length(),
        }
    }

    /// Fixed-duration waveform strategy with default parameters.
    pub fn waveform() -> Self {
        FeatureConfig::Waveform {
            duration_secs: default_duration(),
            fold_width: default_fold_width(),
        }
    }

    /// Parse a strategy name as used on the command line.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "mel" | "melspectrogram" | "spectrogram" => Some(Self::mel()),
            "waveform" | "wave" => Some(Self::waveform()),
            _ => None,
        }
    }

    pub fn build(&self) -> Box<dyn FeatureExtractor> {
        match *self {
            FeatureConfig::Waveform {
                duration_secs,
                fold_width,
            } => Box::new(WaveformExtractor::new(duration_secs, fold_width)),
            FeatureConfig::Mel {
                n_mels,
                n_fft,
                hop_length,
            } => Box::new(MelExtractor::new(MelSpectrogram::new(n_mels, n_fft, hop_length))),
        }
    }
}
