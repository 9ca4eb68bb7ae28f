//! Dev-data loader: fills (or empties) a tour store from a JSON file.

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use natours_core::TourStore;
use serde_json::Value;
use tracing::info;

/// Reads a JSON array of tour documents. A single object is accepted as a
/// one-element array.
pub fn read_tours(path: &Path) -> Result<Vec<Value>> {
    let raw = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let parsed: Value = serde_json::from_str(&raw).with_context(|| format!("parse {}", path.display()))?;
    match parsed {
        Value::Array(items) => Ok(items),
        obj @ Value::Object(_) => Ok(vec![obj]),
        other => bail!("expected an array of tours in {}, found {}", path.display(), kind(&other)),
    }
}

/// Inserts every tour in `path`; nothing is stored if any document is rejected.
pub fn import_file(store: &TourStore, path: &Path) -> Result<usize> {
    let tours = read_tours(path)?;
    let n = store.insert_many(tours).context("insert tours")?;
    info!(count = n, file = %path.display(), "data successfully loaded");
    Ok(n)
}

pub fn delete_all(store: &TourStore) -> Result<usize> {
    let n = store.delete_all().context("delete tours")?;
    info!(count = n, "data successfully deleted");
    Ok(n)
}

fn kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
