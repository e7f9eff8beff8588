use std::fs;
use std::path::Path;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::model::Table;

use super::{BridgeConfig, Result};

fn is_yaml(path: &Path) -> bool {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    matches!(extension.as_str(), "yaml" | "yml")
}

fn read_document<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = fs::read_to_string(path)?;
    let document = if is_yaml(path) {
        serde_yaml::from_str::<T>(&raw)?
    } else {
        serde_json::from_str::<T>(&raw)?
    };
    Ok(document)
}

pub fn load_config(path: impl AsRef<Path>) -> Result<BridgeConfig> {
    let path = path.as_ref();
    let config = read_document::<BridgeConfig>(path)?;
    config.validate()?;
    tracing::debug!(path = %path.display(), "bridge configuration loaded");
    Ok(config)
}

pub fn save_config(path: impl AsRef<Path>, config: &BridgeConfig) -> Result<()> {
    let path = path.as_ref();
    fs::write(path, serialize(path, config)?)?;
    Ok(())
}

/// Reads a table snapshot and checks its shape before it is indexed.
pub fn load_table(path: impl AsRef<Path>) -> Result<Table> {
    let path = path.as_ref();
    let table = read_document::<Table>(path)?;
    table.validate()?;
    tracing::debug!(
        path = %path.display(),
        rows = table.len(),
        columns = table.columns.len(),
        "table loaded"
    );
    Ok(table)
}

fn serialize<T: Serialize>(path: &Path, value: &T) -> Result<String> {
    let serialized = if is_yaml(path) {
        serde_yaml::to_string(value)?
    } else {
        serde_json::to_string_pretty(value)?
    };
    Ok(serialized)
}
