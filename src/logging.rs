use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use csv::Writer;
use serde::Serialize;

/// Append-only metric sink writing every record to `metrics.jsonl` and
/// `metrics.csv` under `{log_dir}/{experiment}`.
pub struct Logger {
    dir: PathBuf,
    json: File,
    csv: Writer<File>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MetricRecord {
    pub epoch: usize,
    /// Loss of the last training batch; absent for the test pass.
    pub loss: Option<f32>,
    pub accuracy: f32,
    /// `"val"` for per-epoch validation, `"test"` for the final pass.
    pub kind: &'static str,
}

impl Logger {
    /// Open (or append to) the sinks under `log_dir`. Without an experiment
    /// name the current unix time is used.
    pub fn new(log_dir: &str, experiment: Option<&str>) -> std::io::Result<Self> {
        let exp = experiment.map(str::to_string).unwrap_or_else(|| {
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap_or_else(|_| Duration::from_secs(0))
                .as_secs()
                .to_string()
        });
        let dir = PathBuf::from(log_dir).join(exp);
        std::fs::create_dir_all(&dir)?;
        let json = OpenOptions::new()
            .create(true)
            .append(true)
            .open(dir.join("metrics.jsonl"))?;
        let csv_file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(dir.join("metrics.csv"))?;
        let csv = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(csv_file);
        Ok(Logger { dir, json, csv })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write one record to both sinks. Failures are logged, never returned.
    pub fn log<T: Serialize>(&mut self, metrics: &T) {
        match serde_json::to_string(metrics) {
            Ok(line) => {
                if let Err(e) = writeln!(self.json, "{}", line) {
                    log::warn!("failed to write metrics.jsonl: {e}");
                }
            }
            Err(e) => log::warn!("failed to serialise metrics: {e}"),
        }
        let written = self
            .csv
            .serialize(metrics)
            .and_then(|_| self.csv.flush().map_err(csv::Error::from));
        if let Err(e) = written {
            log::warn!("failed to write metrics.csv: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_go_below_log_dir_and_experiment() {
        let tmp = tempfile::tempdir().unwrap();
        let base = tmp.path().join("runs");
        let mut logger = Logger::new(base.to_str().unwrap(), Some("exp1")).unwrap();
        assert_eq!(logger.dir(), base.join("exp1"));
        logger.log(&MetricRecord {
            epoch: 1,
            loss: Some(0.5),
            accuracy: 75.0,
            kind: "val",
        });
        let json = std::fs::read_to_string(base.join("exp1/metrics.jsonl")).unwrap();
        assert_eq!(json.lines().count(), 1);
        assert!(json.contains("\"kind\":\"val\""));
        let csv = std::fs::read_to_string(base.join("exp1/metrics.csv")).unwrap();
        let row = csv.trim();
        assert!(row.starts_with("1,0.5,75"), "{row}");
        assert!(row.ends_with(",val"), "{row}");
    }
}
