//! Canonical JSON dataset writer.

use crate::importers::DatasetEnvelope;
use anyhow::{Context, Result};
use pfx_core::{Network, ResultSet};
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;

pub fn network_to_json(network: &Network) -> Result<String> {
    let data = serde_json::to_value(network).context("serializing canonical input")?;
    let envelope = DatasetEnvelope::new("input", data);
    Ok(serde_json::to_string_pretty(&envelope)?)
}

/// Write `network` as an `input` dataset.
pub fn write_network(network: &Network, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let json = network_to_json(network)?;
    fs::write(path, json).with_context(|| format!("writing input dataset {}", path.display()))
}

pub fn result_set_to_json(result: &ResultSet) -> Result<String> {
    let mut data = Map::new();
    for (category, records) in &result.components {
        let records = serde_json::to_value(records)
            .with_context(|| format!("serializing {} output records", category))?;
        data.insert(category.as_str().to_string(), records);
    }
    let envelope = DatasetEnvelope::new(result.symmetry.output_type(), Value::Object(data));
    Ok(serde_json::to_string_pretty(&envelope)?)
}

/// Write `result` as a `sym_output` / `asym_output` dataset.
pub fn write_result_set(result: &ResultSet, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let json = result_set_to_json(result)?;
    fs::write(path, json).with_context(|| format!("writing output dataset {}", path.display()))
}
