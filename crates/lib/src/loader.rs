//! # Input Loaders
//!
//! Readers for the three input files of a run: the JSON work order definition
//! file, the CSV media map, and the plain-text list of file ids still in use.

use crate::attachments::MediaPool;
use crate::errors::LoadError;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use tracing::info;

/// Top-level keys that may hold the entry array in a definition file.
pub const ENTRY_LIST_KEYS: [&str; 3] = ["workorders", "items", "data"];

#[derive(Deserialize)]
struct MediaRow {
    file_id: String,
}

/// Loads the work order entries from a JSON definition file.
///
/// The document is either an array of entries or an object holding the array
/// under `workorders`, `items` or `data`. The first key with a non-empty array
/// wins; an empty array is accepted when nothing better exists.
pub fn load_entries(path: impl AsRef<Path>) -> Result<Vec<Value>, LoadError> {
    let path = path.as_ref();
    let shown = path.display().to_string();
    if !path.exists() {
        return Err(LoadError::NotFound(shown));
    }

    let content = fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: shown.clone(),
        source,
    })?;
    let document: Value = serde_json::from_str(&content).map_err(|source| LoadError::Json {
        path: shown.clone(),
        source,
    })?;

    let entries = extract_entries(document)?;
    info!("Loaded {} work order entries from '{}'", entries.len(), shown);
    Ok(entries)
}

/// Pulls the entry list out of a parsed definition document.
pub fn extract_entries(document: Value) -> Result<Vec<Value>, LoadError> {
    match document {
        Value::Array(entries) => Ok(entries),
        Value::Object(mut object) => {
            let key = ENTRY_LIST_KEYS
                .iter()
                .find(|key| {
                    object
                        .get(**key)
                        .and_then(Value::as_array)
                        .is_some_and(|list| !list.is_empty())
                })
                .or_else(|| {
                    ENTRY_LIST_KEYS
                        .iter()
                        .find(|key| object.get(**key).is_some_and(Value::is_array))
                })
                .copied()
                .ok_or(LoadError::UnexpectedShape)?;
            match object.remove(key) {
                Some(Value::Array(entries)) => Ok(entries),
                _ => Err(LoadError::UnexpectedShape),
            }
        }
        _ => Err(LoadError::UnexpectedShape),
    }
}

/// Loads the media pool from a CSV file with a `file_id` column.
pub fn load_media_pool(path: impl AsRef<Path>) -> Result<MediaPool, LoadError> {
    let path = path.as_ref();
    let shown = path.display().to_string();
    let csv_error = |source: csv::Error| LoadError::Csv {
        path: shown.clone(),
        source,
    };

    let mut reader = csv::Reader::from_path(path).map_err(csv_error)?;
    let has_file_id = reader
        .headers()
        .map_err(csv_error)?
        .iter()
        .any(|header| header.trim() == "file_id");
    if !has_file_id {
        return Err(LoadError::MissingFileIdColumn(shown.clone()));
    }

    let mut ids = Vec::new();
    for row in reader.deserialize::<MediaRow>() {
        ids.push(row.map_err(csv_error)?.file_id);
    }

    let pool = MediaPool::new(ids);
    if pool.is_empty() {
        return Err(LoadError::EmptyMediaMap(shown));
    }
    info!("Loaded {} media ids from '{}'", pool.len(), shown);
    Ok(pool)
}

/// Loads the set of file ids still referenced somewhere, one id per line.
pub fn load_used_ids(path: impl AsRef<Path>) -> Result<BTreeSet<String>, LoadError> {
    let path = path.as_ref();
    let shown = path.display().to_string();
    if !path.exists() {
        return Err(LoadError::NotFound(shown));
    }
    let content = fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: shown,
        source,
    })?;
    Ok(parse_used_ids(&content))
}

pub fn parse_used_ids(content: &str) -> BTreeSet<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}
