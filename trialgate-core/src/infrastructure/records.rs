// trialgate-core/src/infrastructure/records.rs

use serde_json::{Map, Value};
use std::fs;
use std::path::Path;
use tracing::{debug, instrument};

use crate::domain::quality::{FieldValue, Record};
use crate::infrastructure::error::InfrastructureError;

/// Reads a batch of flat records from a JSON array file or a JSON-lines file.
#[instrument(skip_all, fields(path = ?path))]
pub fn read_records(path: &Path) -> Result<Vec<Record>, InfrastructureError> {
    let content = fs::read_to_string(path)?;
    let records = parse_records(&content).map_err(|reason| InfrastructureError::InvalidRecords {
        path: path.display().to_string(),
        reason,
    })?;
    debug!(count = records.len(), "Records loaded");
    Ok(records)
}

pub fn parse_records(content: &str) -> Result<Vec<Record>, String> {
    let trimmed = content.trim_start();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }

    if trimmed.starts_with('[') {
        let rows: Vec<Value> = serde_json::from_str(trimmed).map_err(|e| e.to_string())?;
        rows.iter()
            .enumerate()
            .map(|(row, value)| to_record(row, value))
            .collect()
    } else {
        content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .enumerate()
            .map(|(row, line)| {
                let value: Value = serde_json::from_str(line)
                    .map_err(|e| format!("row {}: {}", row, e))?;
                to_record(row, &value)
            })
            .collect()
    }
}

fn to_record(row: usize, value: &Value) -> Result<Record, String> {
    let object: &Map<String, Value> = value
        .as_object()
        .ok_or_else(|| format!("row {}: expected an object", row))?;

    object
        .iter()
        .map(|(field, raw)| {
            FieldValue::from_json(raw)
                .map(|v| (field.clone(), v))
                .ok_or_else(|| format!("row {}: field '{}' is not a scalar", row, field))
        })
        .collect()
}
