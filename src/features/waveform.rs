use std::path::Path;

use super::{ExtractError, FailurePolicy, FeatureExtractor};
use crate::audio::load_audio;
use crate::data::layout::InputLayout;
use crate::math::Matrix;

/// Number of samples in `duration_secs` at `sample_rate`, rounded down.
pub fn target_length(duration_secs: f32, sample_rate: u32) -> usize {
    (duration_secs as f64 * sample_rate as f64).floor().max(0.0) as usize
}

/// Truncate or zero-pad `samples` to exactly `len` values.
pub fn fix_length(mut samples: Vec<f32>, len: usize) -> Vec<f32> {
    samples.resize(len, 0.0);
    samples
}

/// Raw waveform cut or padded to a fixed duration, as a `1 x N` matrix.
///
/// Decoding failures abort the run: a corrupt file in this mode is treated
/// as a broken dataset rather than a sample to drop.
#[derive(Clone, Debug, PartialEq)]
pub struct WaveformExtractor {
    pub duration_secs: f32,
    pub fold_width: usize,
}

impl WaveformExtractor {
    pub fn new(duration_secs: f32, fold_width: usize) -> Self {
        Self {
            duration_secs,
            fold_width,
        }
    }
}

impl FeatureExtractor for WaveformExtractor {
    fn extract(&self, path: &Path) -> Result<Matrix, ExtractError> {
        let clip = load_audio(path)?;
        log::debug!(
            "{}: {:.2}s at {} Hz",
            path.display(),
            clip.duration_secs(),
            clip.sample_rate
        );
        let len = target_length(self.duration_secs, clip.sample_rate);
        if len == 0 {
            return Err(ExtractError::InvalidParameter(format!(
                "duration {}s at {} Hz yields no samples",
                self.duration_secs, clip.sample_rate
            )));
        }
        let samples = fix_length(clip.samples, len);
        Ok(Matrix::from_vec(1, len, samples))
    }

    fn failure_policy(&self) -> FailurePolicy {
        FailurePolicy::Abort
    }

    fn layout(&self) -> InputLayout {
        InputLayout::Folded {
            width: self.fold_width,
        }
    }

    fn name(&self) -> &'static str {
        "waveform"
    }
}
