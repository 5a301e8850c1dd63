//! JSON-lines exchange of challenging records and verdicts, and config loading.
//!
//! One JSON object per line, so a partially written file still loads up to the
//! last complete record.

use acc_core::pipeline::EvaluationConfig;
use acc_core::types::{SafetyVerdict, TrajectoryRecord};
use anyhow::{Context, Result};
use serde::{de::DeserializeOwned, Serialize};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// Write `items` to `path`, one JSON object per line.
pub fn save_jsonl<T: Serialize>(items: &[T], path: &Path) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("cannot create {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    for item in items {
        serde_json::to_writer(&mut writer, item)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(())
}

/// Read a JSON-lines file. Blank lines are ignored.
pub fn load_jsonl<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("cannot open {}", path.display()))?;
    let reader = BufReader::new(file);
    let mut items = Vec::new();
    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let item = serde_json::from_str(&line)
            .with_context(|| format!("{}:{}: invalid record", path.display(), i + 1))?;
        items.push(item);
    }
    Ok(items)
}

pub fn save_records(records: &[TrajectoryRecord], path: &Path) -> Result<()> {
    save_jsonl(records, path)
}

pub fn load_records(path: &Path) -> Result<Vec<TrajectoryRecord>> {
    load_jsonl(path)
}

pub fn save_verdicts(verdicts: &[SafetyVerdict], path: &Path) -> Result<()> {
    save_jsonl(verdicts, path)
}

pub fn load_verdicts(path: &Path) -> Result<Vec<SafetyVerdict>> {
    load_jsonl(path)
}

/// Load an evaluation config from a JSON file. Missing sections take defaults.
pub fn load_config(path: &Path) -> Result<EvaluationConfig> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("cannot open config {}", path.display()))?;
    let config: EvaluationConfig = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("invalid config {}", path.display()))?;
    config.validate()?;
    Ok(config)
}
