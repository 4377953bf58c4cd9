//! Snapshot persistence for dense indices.
//!
//! A snapshot is a single JSON file carrying a self-describing header
//! (format magic, format version, dimensions, metric, entry count, free-form
//! attributes) followed by every entry. Writes are atomic: the snapshot is
//! written to a sibling temporary file and renamed over the target, so a
//! crash mid-write never leaves a corrupt file at the configured path.

use crate::distance::DistanceMetric;
use crate::error::{Error, Result};
use crate::types::Entry;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

/// Magic string identifying a lore-vector snapshot.
pub const MAGIC: &str = "lore-vector";

/// Current snapshot format version.
pub const FORMAT_VERSION: u32 = 1;

/// On-disk representation of an index.
#[derive(Debug, Serialize, Deserialize)]
pub struct Snapshot<P> {
    /// Format magic, always [`MAGIC`].
    pub magic: String,
    /// Format version, always [`FORMAT_VERSION`] for snapshots we write.
    pub version: u32,
    /// Vector dimensionality.
    pub dimensions: usize,
    /// Distance metric the index was built with.
    pub metric: DistanceMetric,
    /// Number of entries; must equal `entries.len()`.
    pub count: usize,
    /// When the snapshot was written.
    pub created_at: DateTime<Utc>,
    /// Free-form string attributes set by the caller (e.g. the identity of
    /// the embedding model the vectors came from).
    pub attributes: BTreeMap<String, String>,
    /// All entries; ids must equal positions, i.e. run `0..count` in file
    /// order.
    pub entries: Vec<Entry<P>>,
}

/// Write a snapshot atomically to `path`.
pub async fn write_snapshot<P: Serialize>(path: &Path, snapshot: &Snapshot<P>) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }

    let data = serde_json::to_vec(snapshot)
        .map_err(|e| Error::Persistence(format!("failed to serialize snapshot: {}", e)))?;

    // Sibling temp file keeps the rename on the same filesystem.
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = std::path::PathBuf::from(tmp);

    tokio::fs::write(&tmp, &data).await?;
    tokio::fs::rename(&tmp, path).await?;

    debug!(path = %path.display(), bytes = data.len(), "Wrote snapshot");
    Ok(())
}

/// Read and validate a snapshot from `path`.
///
/// Any failure to read or parse, or any header inconsistency, is reported
/// as [`Error::CorruptIndex`]; a caller that sees it may fall back to
/// rebuilding from source data.
pub async fn read_snapshot<P: DeserializeOwned>(path: &Path) -> Result<Snapshot<P>> {
    let data = tokio::fs::read(path).await.map_err(|e| {
        Error::CorruptIndex(format!("cannot read index at {}: {}", path.display(), e))
    })?;

    let snapshot: Snapshot<P> = serde_json::from_slice(&data).map_err(|e| {
        Error::CorruptIndex(format!("cannot parse index at {}: {}", path.display(), e))
    })?;

    if snapshot.magic != MAGIC {
        return Err(Error::CorruptIndex(format!(
            "unrecognized format magic {:?}",
            snapshot.magic
        )));
    }
    if snapshot.version != FORMAT_VERSION {
        return Err(Error::CorruptIndex(format!(
            "unsupported format version {} (expected {})",
            snapshot.version, FORMAT_VERSION
        )));
    }
    if snapshot.count != snapshot.entries.len() {
        return Err(Error::CorruptIndex(format!(
            "entry count mismatch: header says {}, file holds {}",
            snapshot.count,
            snapshot.entries.len()
        )));
    }
    for (position, entry) in snapshot.entries.iter().enumerate() {
        // Search resolves a hit id by position, so ids must be exactly
        // 0..count in file order.
        if entry.id != position as u64 {
            return Err(Error::CorruptIndex(format!(
                "entry at position {} has id {}, expected {}",
                position, entry.id, position
            )));
        }
        if entry.vector.len() != snapshot.dimensions {
            return Err(Error::CorruptIndex(format!(
                "entry {} has {} dimensions, header says {}",
                entry.id,
                entry.vector.len(),
                snapshot.dimensions
            )));
        }
    }

    debug!(path = %path.display(), count = snapshot.count, "Read snapshot");
    Ok(snapshot)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(entries: Vec<Entry<String>>) -> Snapshot<String> {
        Snapshot {
            magic: MAGIC.to_string(),
            version: FORMAT_VERSION,
            dimensions: 2,
            metric: DistanceMetric::DotProduct,
            count: entries.len(),
            created_at: Utc::now(),
            attributes: BTreeMap::new(),
            entries,
        }
    }

    fn entry(id: u64) -> Entry<String> {
        Entry {
            id,
            vector: vec![1.0, 0.0],
            payload: format!("payload-{}", id),
        }
    }

    #[tokio::test]
    async fn test_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.json");

        let snap = snapshot(vec![entry(0), entry(1)]);
        write_snapshot(&path, &snap).await.unwrap();

        let loaded: Snapshot<String> = read_snapshot(&path).await.unwrap();
        assert_eq!(loaded.count, 2);
        assert_eq!(loaded.entries[1].payload, "payload-1");
        assert_eq!(loaded.metric, DistanceMetric::DotProduct);
    }

    #[tokio::test]
    async fn test_missing_file_is_corrupt_index() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("never-written.json");

        let result = read_snapshot::<String>(&path).await;
        assert!(matches!(result, Err(Error::CorruptIndex(_))));
    }

    #[tokio::test]
    async fn test_truncated_file_is_corrupt_index() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.json");

        let snap = snapshot(vec![entry(0)]);
        write_snapshot(&path, &snap).await.unwrap();

        let data = tokio::fs::read(&path).await.unwrap();
        tokio::fs::write(&path, &data[..data.len() / 2]).await.unwrap();

        let result = read_snapshot::<String>(&path).await;
        assert!(matches!(result, Err(Error::CorruptIndex(_))));
    }

    #[tokio::test]
    async fn test_count_mismatch_is_corrupt_index() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.json");

        let mut snap = snapshot(vec![entry(0), entry(1)]);
        snap.count = 5;
        write_snapshot(&path, &snap).await.unwrap();

        let result = read_snapshot::<String>(&path).await;
        assert!(matches!(result, Err(Error::CorruptIndex(_))));
    }

    #[tokio::test]
    async fn test_misnumbered_entry_ids_are_corrupt_index() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.json");

        // Header checks all pass; only the id sequence is wrong.
        let snap = snapshot(vec![entry(99)]);
        write_snapshot(&path, &snap).await.unwrap();

        let result = read_snapshot::<String>(&path).await;
        assert!(matches!(result, Err(Error::CorruptIndex(_))));
    }

    #[tokio::test]
    async fn test_no_stray_temp_file_after_save() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.json");

        write_snapshot(&path, &snapshot(vec![entry(0)])).await.unwrap();

        let names: Vec<String> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["index.json".to_string()]);
    }
}
