use std::env;
use std::fs::File;
use std::io::{BufRead, BufReader};

use serde::Deserialize;

#[derive(Deserialize)]
struct MetricRecord {
    epoch: usize,
    loss: Option<f32>,
    accuracy: f32,
    kind: String,
}

/// Print validation accuracy per epoch as a text bar chart, followed by the
/// final test accuracy.
fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let path = env::args()
        .nth(1)
        .unwrap_or_else(|| "runs/example/metrics.jsonl".to_string());
    let file = File::open(&path)?;
    let reader = BufReader::new(file);
    let mut val = Vec::new();
    let mut test = None;
    for line in reader.lines() {
        let line = line?;
        let rec: MetricRecord = serde_json::from_str(&line)?;
        match rec.kind.as_str() {
            "val" => val.push(rec),
            "test" => test = Some(rec.accuracy),
            other => log::debug!("ignoring record kind {other}"),
        }
    }
    if val.is_empty() {
        log::warn!("no validation records in {path}");
        return Ok(());
    }
    for rec in &val {
        let bar = (rec.accuracy.clamp(0.0, 100.0) / 2.0) as usize;
        let loss = rec.loss.map(|l| format!("{l:.4}")).unwrap_or_default();
        println!("{:5} {:>8} {:6.2}% | {}", rec.epoch, loss, rec.accuracy, "*".repeat(bar));
    }
    if let Some(acc) = test {
        println!("test accuracy: {acc:.2}%");
    }
    Ok(())
}
