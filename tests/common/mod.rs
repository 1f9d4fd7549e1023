#![allow(dead_code)]

use std::f32::consts::PI;
use std::fs;
use std::path::{Path, PathBuf};

/// `secs` seconds of a sine at `freq` Hz.
pub fn sine(freq: f32, secs: f32, sample_rate: u32) -> Vec<f32> {
    let n = (secs * sample_rate as f32) as usize;
    (0..n)
        .map(|i| 0.5 * (2.0 * PI * freq * i as f32 / sample_rate as f32).sin())
        .collect()
}

/// Write mono 16-bit PCM to `path`, creating parent directories.
pub fn write_wav(path: &Path, samples: &[f32], sample_rate: u32) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).unwrap();
    for &s in samples {
        writer.write_sample((s * i16::MAX as f32) as i16).unwrap();
    }
    writer.finalize().unwrap();
}

/// `per_class` fake and real one-tone clips under `root/fake` and `root/real`.
pub fn write_corpus(root: &Path, per_class: usize, secs: f32, sample_rate: u32) -> (PathBuf, PathBuf) {
    let fake = root.join("fake");
    let real = root.join("real");
    for i in 0..per_class {
        let clip = sine(300.0 + 40.0 * i as f32, secs, sample_rate);
        write_wav(&fake.join(format!("f{i:02}.wav")), &clip, sample_rate);
        let clip = sine(2000.0 + 40.0 * i as f32, secs, sample_rate);
        write_wav(&real.join(format!("r{i:02}.wav")), &clip, sample_rate);
    }
    (fake, real)
}
