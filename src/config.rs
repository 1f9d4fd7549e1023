use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::audio::DatasetSource;
use crate::data::SplitConfig;
use crate::features::FeatureConfig;
use crate::train::TrainConfig;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid TOML config: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("invalid JSON config: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

fn default_extensions() -> Vec<String> {
    vec!["wav".to_string(), "mp3".to_string()]
}

/// Everything one experiment needs, loaded from a TOML or JSON file.
///
/// Every field has a default, so an empty file is a valid config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub dataset: DatasetSource,
    /// Recognised audio extensions, without the dot.
    pub extensions: Vec<String>,
    pub features: FeatureConfig,
    pub split: SplitConfig,
    pub train: TrainConfig,
    /// Directory for `metrics.jsonl`/`metrics.csv`; no files are written
    /// when unset.
    pub log_dir: Option<String>,
    pub experiment: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            dataset: DatasetSource::default(),
            extensions: default_extensions(),
            features: FeatureConfig::default(),
            split: SplitConfig::default(),
            train: TrainConfig::default(),
            log_dir: None,
            experiment: None,
        }
    }
}

impl Config {
    /// Load configuration from the given path. Files ending in `.json` are
    /// parsed as JSON, everything else as TOML.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.eq_ignore_ascii_case("json"))
            .unwrap_or(false);
        let cfg: Config = if is_json {
            serde_json::from_str(&content)?
        } else {
            toml::from_str(&content)?
        };
        cfg.validate()?;
        Ok(cfg)
    }

    /// Reject values that would only fail later, deep inside the run.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.extensions.is_empty() {
            return Err(ConfigError::Invalid("extensions must not be empty".into()));
        }
        match &self.features {
            FeatureConfig::Waveform {
                duration_secs,
                fold_width,
            } => {
                if !(duration_secs.is_finite() && *duration_secs > 0.0) {
                    return Err(ConfigError::Invalid(format!(
                        "duration_secs must be positive, got {duration_secs}"
                    )));
                }
                if *fold_width == 0 {
                    return Err(ConfigError::Invalid("fold_width must be positive".into()));
                }
            }
            FeatureConfig::Mel {
                n_mels,
                n_fft,
                hop_length,
            } => {
                if *n_mels == 0 || *n_fft == 0 || *hop_length == 0 {
                    return Err(ConfigError::Invalid(
                        "n_mels, n_fft and hop_length must be positive".into(),
                    ));
                }
            }
        }
        if self.train.batch_size == 0 || self.train.eval_batch_size == 0 {
            return Err(ConfigError::Invalid("batch sizes must be positive".into()));
        }
        if !(self.train.learning_rate.is_finite() && self.train.learning_rate > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "learning_rate must be positive, got {}",
                self.train.learning_rate
            )));
        }
        self.split
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_gives_defaults() {
        let cfg: Config = toml::from_str("").unwrap();
        assert_eq!(cfg, Config::default());
        assert_eq!(cfg.train.epochs, 20);
        assert_eq!(cfg.split.test_seed, 42);
    }

    #[test]
    fn validate_rejects_zero_batch() {
        let mut cfg = Config::default();
        cfg.train.batch_size = 0;
        assert!(matches!(cfg.validate(), Err(ConfigError::Invalid(_))));
    }
}
