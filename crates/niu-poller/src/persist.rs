//! Redacted snapshot persistence
//!
//! One JSON document at a fixed path, fully overwritten each cycle.
//! Writes go to a temp file in the same directory, are synced, and are
//! renamed over the destination, so a crash mid-write never leaves a
//! truncated snapshot behind.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use niu_client::Vehicle;
use niu_core::{redacted, FetchKind, NormalizedSnapshot, RawSet};
use serde_json::{json, Map, Value};
use tracing::debug;

use crate::error::PersistError;

/// Writes the per-cycle diagnostic snapshot file.
#[derive(Debug)]
pub struct SnapshotPersister {
    path: PathBuf,
}

impl SnapshotPersister {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Persist the redacted document for this cycle.
    pub fn persist(
        &self,
        vehicle: &Vehicle,
        snapshot: &NormalizedSnapshot,
        raws: &RawSet,
        vehicles_info: &Value,
    ) -> Result<(), PersistError> {
        let document = build_document(vehicle, snapshot, raws, vehicles_info);
        let rendered = serde_json::to_vec_pretty(&redacted(&document))?;
        atomic_write(&self.path, &rendered)?;
        debug!(path = %self.path.display(), "snapshot persisted");
        Ok(())
    }
}

/// Builds `{sn, sensor_prefix, parsed, raw}`, the snapshot-file contract.
fn build_document(
    vehicle: &Vehicle,
    snapshot: &NormalizedSnapshot,
    raws: &RawSet,
    vehicles_info: &Value,
) -> Value {
    let mut raw = Map::new();
    raw.insert("vehicles_info".to_string(), vehicles_info.clone());
    for kind in FetchKind::ALL {
        raw.insert(
            kind.raw_key().to_string(),
            raws.get(kind).cloned().unwrap_or(Value::Null),
        );
    }

    json!({
        "sn": vehicle.serial_number,
        "sensor_prefix": vehicle.display_name,
        "parsed": snapshot.to_parsed_json(),
        "raw": Value::Object(raw),
    })
}

/// Write to a temp file in the same directory, sync, rename over `path`.
fn atomic_write(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let tmp_path = tmp_path_for(path);
    let mut tmp_file = fs::File::create(&tmp_path)?;
    tmp_file.write_all(contents)?;
    tmp_file.flush()?;
    tmp_file.sync_all()?;
    drop(tmp_file);
    fs::rename(&tmp_path, path)
}

fn tmp_path_for(path: &Path) -> PathBuf {
    // Append rather than replace the extension so the temp file always
    // lands next to the destination.
    let mut name = path.as_os_str().to_os_string();
    name.push(".tmp");
    PathBuf::from(name)
}
