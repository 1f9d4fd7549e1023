//! Log-power mel spectrograms following librosa's defaults: centred frames,
//! periodic Hann window, Slaney mel scale with area normalisation and
//! `power_to_db(ref=max, top_db=80)`.

use std::f32::consts::PI;
use std::path::Path;

use rustfft::num_complex::Complex;
use rustfft::FftPlanner;

use super::{ExtractError, FailurePolicy, FeatureExtractor};
use crate::audio::load_audio;
use crate::data::layout::InputLayout;
use crate::math::Matrix;

const AMIN: f32 = 1e-10;
const TOP_DB: f32 = 80.0;

// Slaney mel scale: linear below 1 kHz, logarithmic above.
const F_SP: f64 = 200.0 / 3.0;
const MIN_LOG_HZ: f64 = 1000.0;
const MIN_LOG_MEL: f64 = MIN_LOG_HZ / F_SP;

fn log_step() -> f64 {
    6.4f64.ln() / 27.0
}

pub fn hz_to_mel(hz: f64) -> f64 {
    if hz >= MIN_LOG_HZ {
        MIN_LOG_MEL + (hz / MIN_LOG_HZ).ln() / log_step()
    } else {
        hz / F_SP
    }
}

pub fn mel_to_hz(mel: f64) -> f64 {
    if mel >= MIN_LOG_MEL {
        MIN_LOG_HZ * (log_step() * (mel - MIN_LOG_MEL)).exp()
    } else {
        F_SP * mel
    }
}

/// `n` frequencies evenly spaced on the mel scale between `fmin` and `fmax`.
pub fn mel_frequencies(n: usize, fmin: f64, fmax: f64) -> Vec<f64> {
    let lo = hz_to_mel(fmin);
    let hi = hz_to_mel(fmax);
    if n == 1 {
        return vec![mel_to_hz(lo)];
    }
    (0..n)
        .map(|i| mel_to_hz(lo + (hi - lo) * i as f64 / (n - 1) as f64))
        .collect()
}

/// Triangular mel filterbank, `n_mels x (n_fft/2 + 1)`, each filter scaled
/// to unit area (Slaney normalisation).
pub fn mel_filterbank(sample_rate: u32, n_fft: usize, n_mels: usize) -> Matrix {
    let n_bins = n_fft / 2 + 1;
    let nyquist = sample_rate as f64 / 2.0;
    let fft_freqs: Vec<f64> = (0..n_bins)
        .map(|k| k as f64 * sample_rate as f64 / n_fft as f64)
        .collect();
    let mel_f = mel_frequencies(n_mels + 2, 0.0, nyquist);

    let mut weights = Matrix::zeros(n_mels, n_bins);
    for m in 0..n_mels {
        let (left, center, right) = (mel_f[m], mel_f[m + 1], mel_f[m + 2]);
        let enorm = 2.0 / (right - left);
        for (k, &f) in fft_freqs.iter().enumerate() {
            let lower = (f - left) / (center - left);
            let upper = (right - f) / (right - center);
            let w = lower.min(upper).max(0.0);
            weights.set(m, k, (w * enorm) as f32);
        }
    }
    weights
}

/// Periodic Hann window of length `n`.
pub fn hann_window(n: usize) -> Vec<f32> {
    (0..n)
        .map(|i| 0.5 - 0.5 * (2.0 * PI * i as f32 / n as f32).cos())
        .collect()
}

/// Number of centred frames for a signal of `len` samples.
pub fn frame_count(len: usize, hop_length: usize) -> usize {
    1 + len / hop_length
}

/// Convert a power spectrogram to decibels relative to its maximum, clipped
/// to `TOP_DB` below the peak.
pub fn power_to_db(spec: &mut Matrix) {
    let peak = spec.data.iter().cloned().fold(0.0f32, f32::max);
    let ref_db = 10.0 * peak.max(AMIN).log10();
    for v in spec.data.iter_mut() {
        *v = 10.0 * v.max(AMIN).log10() - ref_db;
    }
    let max_db = spec.data.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
    let floor = max_db - TOP_DB;
    for v in spec.data.iter_mut() {
        *v = v.max(floor);
    }
}

/// Parameters of the mel analysis.
#[derive(Clone, Debug, PartialEq)]
pub struct MelSpectrogram {
    pub n_mels: usize,
    pub n_fft: usize,
    pub hop_length: usize,
}

impl Default for MelSpectrogram {
    fn default() -> Self {
        Self {
            n_mels: 128,
            n_fft: 2048,
            hop_length: 512,
        }
    }
}

impl MelSpectrogram {
    pub fn new(n_mels: usize, n_fft: usize, hop_length: usize) -> Self {
        Self {
            n_mels,
            n_fft,
            hop_length,
        }
    }

    /// Power spectrogram `(n_fft/2 + 1) x frames` of a zero-padded,
    /// centred STFT.
    pub fn power_spectrogram(&self, samples: &[f32]) -> Matrix {
        let n_fft = self.n_fft;
        let n_bins = n_fft / 2 + 1;
        let pad = n_fft / 2;
        let frames = frame_count(samples.len(), self.hop_length);
        let window = hann_window(n_fft);
        let fft = FftPlanner::<f32>::new().plan_fft_forward(n_fft);

        let mut padded = vec![0.0f32; samples.len() + 2 * pad];
        padded[pad..pad + samples.len()].copy_from_slice(samples);

        let mut power = Matrix::zeros(n_bins, frames);
        let mut buffer = vec![Complex::new(0.0f32, 0.0); n_fft];
        for t in 0..frames {
            let start = t * self.hop_length;
            for (j, slot) in buffer.iter_mut().enumerate() {
                let s = padded.get(start + j).copied().unwrap_or(0.0);
                *slot = Complex::new(s * window[j], 0.0);
            }
            fft.process(&mut buffer);
            for (k, c) in buffer.iter().take(n_bins).enumerate() {
                power.set(k, t, c.norm_sqr());
            }
        }
        power
    }

    /// Log-power mel spectrogram, `n_mels x frames`.
    pub fn compute(&self, samples: &[f32], sample_rate: u32) -> Result<Matrix, ExtractError> {
        if self.n_mels == 0 || self.n_fft == 0 || self.hop_length == 0 {
            return Err(ExtractError::InvalidParameter(format!(
                "n_mels={}, n_fft={}, hop_length={} must all be positive",
                self.n_mels, self.n_fft, self.hop_length
            )));
        }
        if samples.is_empty() {
            return Err(ExtractError::EmptyAudio);
        }
        let power = self.power_spectrogram(samples);
        let filters = mel_filterbank(sample_rate, self.n_fft, self.n_mels);
        let mut mel = Matrix::matmul(&filters, &power);
        power_to_db(&mut mel);
        Ok(mel)
    }
}

/// Mel-spectrogram feature of variable width; failing files are skipped.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MelExtractor {
    pub mel: MelSpectrogram,
}

impl MelExtractor {
    pub fn new(mel: MelSpectrogram) -> Self {
        Self { mel }
    }
}

impl FeatureExtractor for MelExtractor {
    fn extract(&self, path: &Path) -> Result<Matrix, ExtractError> {
        let clip = load_audio(path)?;
        self.mel.compute(&clip.samples, clip.sample_rate)
    }

    fn failure_policy(&self) -> FailurePolicy {
        FailurePolicy::Skip
    }

    fn layout(&self) -> InputLayout {
        InputLayout::AsIs
    }

    fn name(&self) -> &'static str {
        "mel"
    }
}
