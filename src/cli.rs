use std::path::PathBuf;

use thiserror::Error;

use crate::audio::DatasetSource;
use crate::config::{Config, ConfigError};
use crate::features::FeatureConfig;

pub const USAGE: &str = "\
Usage: fakespeech [CONFIG] [options]

  CONFIG                     TOML or JSON config file (defaults apply when omitted)
  --features waveform|mel    feature extraction strategy
  --epochs N                 number of training epochs
  --fake DIR --real DIR      one directory per class
  --root DIR                 single tree, labels taken from fake/real in paths
  --log-dir DIR              write metrics.jsonl / metrics.csv under DIR
  --experiment NAME          run name below --log-dir
  -h, --help                 show this message";

#[derive(Debug, Error, PartialEq)]
pub enum CliError {
    #[error("missing value for {0}")]
    MissingValue(String),
    #[error("invalid value {value:?} for {flag}")]
    InvalidValue { flag: String, value: String },
    #[error("unknown option {0}")]
    UnknownOption(String),
    #[error("--fake and --real must be given together")]
    IncompleteDirs,
    #[error("--root cannot be combined with --fake/--real")]
    ConflictingSources,
}

/// Parsed command line. Options left as `None` keep the config value.
#[derive(Debug, Default, PartialEq)]
pub struct CliArgs {
    pub config_path: Option<String>,
    pub features: Option<FeatureConfig>,
    pub epochs: Option<usize>,
    pub fake_dir: Option<PathBuf>,
    pub real_dir: Option<PathBuf>,
    pub root: Option<PathBuf>,
    pub log_dir: Option<String>,
    pub experiment: Option<String>,
    pub help: bool,
}

/// Parse arguments (without the binary name).
pub fn parse_cli<I>(mut args: I) -> Result<CliArgs, CliError>
where
    I: Iterator<Item = String>,
{
    let mut out = CliArgs::default();
    while let Some(arg) = args.next() {
        let mut value = |flag: &str| args.next().ok_or_else(|| CliError::MissingValue(flag.to_string()));
        match arg.as_str() {
            "-h" | "--help" => out.help = true,
            "--features" => {
                let v = value("--features")?;
                out.features = Some(FeatureConfig::from_name(&v).ok_or(CliError::InvalidValue {
                    flag: arg.clone(),
                    value: v,
                })?);
            }
            "--epochs" => {
                let v = value("--epochs")?;
                out.epochs = Some(v.parse().map_err(|_| CliError::InvalidValue {
                    flag: arg.clone(),
                    value: v,
                })?);
            }
            "--fake" => out.fake_dir = Some(PathBuf::from(value("--fake")?)),
            "--real" => out.real_dir = Some(PathBuf::from(value("--real")?)),
            "--root" => out.root = Some(PathBuf::from(value("--root")?)),
            "--log-dir" => out.log_dir = Some(value("--log-dir")?),
            "--experiment" => out.experiment = Some(value("--experiment")?),
            s if s.starts_with('-') || out.config_path.is_some() => {
                return Err(CliError::UnknownOption(s.to_string()))
            }
            s => out.config_path = Some(s.to_string()),
        }
    }
    if out.fake_dir.is_some() != out.real_dir.is_some() {
        return Err(CliError::IncompleteDirs);
    }
    if out.root.is_some() && out.fake_dir.is_some() {
        return Err(CliError::ConflictingSources);
    }
    Ok(out)
}

impl CliArgs {
    /// Load the config file (or defaults) and apply command-line overrides.
    pub fn into_config(self) -> Result<Config, ConfigError> {
        let mut cfg = match &self.config_path {
            Some(path) => Config::from_path(path)?,
            None => Config::default(),
        };
        if let Some(features) = self.features {
            cfg.features = features;
        }
        if let Some(epochs) = self.epochs {
            cfg.train.epochs = epochs;
        }
        if let (Some(fake_dir), Some(real_dir)) = (self.fake_dir, self.real_dir) {
            cfg.dataset = DatasetSource::Dirs { fake_dir, real_dir };
        }
        if let Some(root) = self.root {
            cfg.dataset = DatasetSource::Root { root };
        }
        if self.log_dir.is_some() {
            cfg.log_dir = self.log_dir;
        }
        if self.experiment.is_some() {
            cfg.experiment = self.experiment;
        }
        cfg.validate()?;
        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(v: &[&str]) -> impl Iterator<Item = String> {
        v.iter().map(|s| s.to_string()).collect::<Vec<_>>().into_iter()
    }

    #[test]
    fn parses_overrides() {
        let cli = parse_cli(args(&["exp.toml", "--features", "waveform", "--epochs", "3"])).unwrap();
        assert_eq!(cli.config_path.as_deref(), Some("exp.toml"));
        assert_eq!(cli.features, Some(FeatureConfig::waveform()));
        assert_eq!(cli.epochs, Some(3));
    }

    #[test]
    fn rejects_half_of_a_dir_pair() {
        assert_eq!(parse_cli(args(&["--fake", "a"])), Err(CliError::IncompleteDirs));
    }

    #[test]
    fn rejects_root_together_with_class_dirs() {
        assert_eq!(
            parse_cli(args(&["--fake", "a", "--real", "b", "--root", "c"])),
            Err(CliError::ConflictingSources)
        );
        assert_eq!(
            parse_cli(args(&["--root", "c", "--fake", "a"])),
            Err(CliError::IncompleteDirs)
        );
    }

    #[test]
    fn rejects_bad_values() {
        assert!(matches!(
            parse_cli(args(&["--epochs", "many"])),
            Err(CliError::InvalidValue { .. })
        ));
        assert_eq!(
            parse_cli(args(&["--epochs"])),
            Err(CliError::MissingValue("--epochs".into()))
        );
        assert_eq!(parse_cli(args(&["--bogus"])), Err(CliError::UnknownOption("--bogus".into())));
    }

    #[test]
    fn overrides_apply_on_defaults() {
        let cli = parse_cli(args(&["--root", "speech", "--epochs", "1"])).unwrap();
        let cfg = cli.into_config().unwrap();
        assert_eq!(cfg.train.epochs, 1);
        assert_eq!(cfg.dataset, DatasetSource::Root { root: PathBuf::from("speech") });
    }
}
