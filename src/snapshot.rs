//! Wholesale persistence of a populated cache: a gzip-compressed JSON object
//! mapping cache keys to datasets.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, Write};

use camino::Utf8Path;
use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use serde_json::Value;
use tracing::debug;

use crate::domain::CacheKey;
use crate::error::DaedalusError;
use crate::layout::Layout;
use crate::table::Dataset;

/// Loads a snapshot, requiring every key in `required`. Keys beyond those are
/// ignored.
pub fn read_snapshot(
    path: &Utf8Path,
    required: &[CacheKey],
) -> Result<BTreeMap<CacheKey, Dataset>, DaedalusError> {
    let file = File::open(path.as_std_path())
        .map_err(|err| DaedalusError::Snapshot(format!("open {path}: {err}")))?;
    let value: Value = serde_json::from_reader(BufReader::new(GzDecoder::new(file)))
        .map_err(|err| DaedalusError::Snapshot(format!("decode {path}: {err}")))?;

    let Value::Object(mut object) = value else {
        return Err(DaedalusError::SnapshotNotKeyed(path.as_std_path().to_path_buf()));
    };

    let missing = required
        .iter()
        .filter(|key| !object.contains_key(key.as_str()))
        .map(|key| key.as_str().to_string())
        .collect::<Vec<_>>();
    if !missing.is_empty() {
        return Err(DaedalusError::SnapshotMissingKeys {
            path: path.as_std_path().to_path_buf(),
            missing,
        });
    }

    let mut entries = BTreeMap::new();
    for key in required {
        let raw = object.remove(key.as_str()).unwrap_or(Value::Null);
        let dataset: Dataset = serde_json::from_value(raw)
            .map_err(|err| DaedalusError::Snapshot(format!("entry '{key}': {err}")))?;
        entries.insert(*key, dataset);
    }
    if !object.is_empty() {
        debug!(extra = object.len(), "snapshot holds entries with no registered hook");
    }
    Ok(entries)
}

pub fn write_snapshot(
    path: &Utf8Path,
    entries: &BTreeMap<CacheKey, Dataset>,
) -> Result<(), DaedalusError> {
    let keyed = entries
        .iter()
        .map(|(key, dataset)| (key.as_str(), dataset))
        .collect::<BTreeMap<_, _>>();
    let json = serde_json::to_vec(&keyed)
        .map_err(|err| DaedalusError::Snapshot(format!("encode: {err}")))?;
    let mut encoder = GzEncoder::new(Vec::new(), Compression::fast());
    encoder
        .write_all(&json)
        .map_err(|err| DaedalusError::Snapshot(format!("compress: {err}")))?;
    let packed = encoder
        .finish()
        .map_err(|err| DaedalusError::Snapshot(format!("compress: {err}")))?;
    Layout::write_bytes_atomic(path, &packed)
}
