//! # lore-vector
//!
//! A pure-Rust embedded dense-vector index for embedding workloads.
//!
//! ## Features
//!
//! - **Pure Rust**: no native dependencies, compiles anywhere Rust does
//! - **Exact search**: brute-force top-k with a total, deterministic order;
//!   ties on score are broken by insertion order
//! - **Typed payloads**: every vector carries a caller-defined serde payload
//! - **Atomic persistence**: JSON snapshots with a validated header, written
//!   via temp-file-and-rename so readers never observe a partial write
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use lore_vector::{DenseIndex, DistanceMetric};
//!
//! let index: DenseIndex<String> = DenseIndex::new(3, DistanceMetric::DotProduct)?;
//! index.insert_batch(vec![
//!     (vec![1.0, 0.0, 0.0], "first".to_string()),
//!     (vec![0.0, 1.0, 0.0], "second".to_string()),
//! ])?;
//!
//! let hits = index.search(&[1.0, 0.0, 0.0], 1)?;
//! assert_eq!(hits[0].payload, "first");
//! ```
//!
//! The index is append-only: entries are never mutated or removed, which is
//! what makes the insertion-order tie-break stable across the lifetime of a
//! snapshot.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod distance;
pub mod error;
pub mod persistence;
pub mod types;

pub use distance::{normalize, DistanceMetric};
pub use error::{Error, Result};
pub use types::{Entry, EntryId, Hit};

use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info, instrument};

/// An append-only dense-vector index with exact top-k search.
///
/// `P` is the payload type stored alongside each vector; it must be
/// serde-serializable for snapshot persistence.
///
/// # Thread Safety
///
/// Searches take a shared read lock and may run concurrently; insertion is a
/// single-writer operation behind the same lock. Saving takes a read
/// snapshot, so it can overlap searches but never a concurrent insert.
pub struct DenseIndex<P> {
    dimensions: usize,
    metric: DistanceMetric,
    attributes: BTreeMap<String, String>,
    entries: RwLock<Vec<Entry<P>>>,
}

impl<P: Clone> DenseIndex<P> {
    /// Create an empty index for vectors of the given dimensionality.
    pub fn new(dimensions: usize, metric: DistanceMetric) -> Result<Self> {
        if dimensions == 0 {
            return Err(Error::InvalidArgument(
                "index dimensions must be non-zero".to_string(),
            ));
        }
        Ok(Self {
            dimensions,
            metric,
            attributes: BTreeMap::new(),
            entries: RwLock::new(Vec::new()),
        })
    }

    /// Vector dimensionality of this index.
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// Distance metric of this index.
    pub fn metric(&self) -> DistanceMetric {
        self.metric
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// True if the index holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Free-form string attributes carried in snapshots.
    pub fn attributes(&self) -> &BTreeMap<String, String> {
        &self.attributes
    }

    /// Set a snapshot attribute (e.g. the embedding model identity).
    ///
    /// Attributes are fixed before the index is shared, hence `&mut self`.
    pub fn set_attribute(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.attributes.insert(key.into(), value.into());
    }

    /// Bulk-insert vectors with their payloads.
    ///
    /// Ids are assigned sequentially in iteration order. A dimension
    /// mismatch anywhere in the batch rejects the whole batch; the index is
    /// left untouched.
    ///
    /// # Returns
    ///
    /// The number of entries inserted.
    pub fn insert_batch<I>(&self, items: I) -> Result<usize>
    where
        I: IntoIterator<Item = (Vec<f32>, P)>,
    {
        let mut guard = self.entries.write();
        let mut staged = Vec::new();
        let mut next_id = guard.len() as EntryId;

        for (vector, payload) in items {
            if vector.len() != self.dimensions {
                return Err(Error::DimensionMismatch {
                    expected: self.dimensions,
                    actual: vector.len(),
                });
            }
            staged.push(Entry {
                id: next_id,
                vector,
                payload,
            });
            next_id += 1;
        }

        let count = staged.len();
        guard.extend(staged);
        debug!(count, total = guard.len(), "Inserted batch");
        Ok(count)
    }

    /// Search for the `k` entries most similar to `query`.
    ///
    /// Results are sorted by non-increasing score; equal scores rank the
    /// earlier-inserted entry first. `k == 0` is an error; `k` larger than
    /// the index size is clamped.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<Hit<P>>> {
        if k == 0 {
            return Err(Error::InvalidArgument(
                "search requires k >= 1".to_string(),
            ));
        }
        if query.len() != self.dimensions {
            return Err(Error::DimensionMismatch {
                expected: self.dimensions,
                actual: query.len(),
            });
        }

        let entries = self.entries.read();
        let mut scored: Vec<(EntryId, f32)> = entries
            .iter()
            .map(|e| (e.id, self.metric.similarity(query, &e.vector)))
            .collect();

        // Total order: score descending, then id ascending. NaN cannot occur
        // for finite inputs, but sorts last rather than poisoning the order.
        scored.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });
        scored.truncate(k.min(entries.len()));

        let hits = scored
            .into_iter()
            .map(|(id, score)| {
                let entry = &entries[id as usize];
                Hit {
                    id,
                    score,
                    payload: entry.payload.clone(),
                }
            })
            .collect();
        Ok(hits)
    }

    /// Get an entry by id.
    pub fn get(&self, id: EntryId) -> Option<Entry<P>> {
        self.entries.read().get(id as usize).cloned()
    }
}

impl<P: Clone + Serialize> DenseIndex<P> {
    /// Persist the index to a snapshot file at `path`, atomically.
    #[instrument(skip(self), fields(count = self.len()))]
    pub async fn save(&self, path: &Path) -> Result<()> {
        let snapshot = {
            let entries = self.entries.read();
            persistence::Snapshot {
                magic: persistence::MAGIC.to_string(),
                version: persistence::FORMAT_VERSION,
                dimensions: self.dimensions,
                metric: self.metric,
                count: entries.len(),
                created_at: chrono::Utc::now(),
                attributes: self.attributes.clone(),
                entries: entries.clone(),
            }
        };

        persistence::write_snapshot(path, &snapshot).await?;
        info!(path = %path.display(), count = snapshot.count, "Saved index");
        Ok(())
    }
}

impl<P: Clone + DeserializeOwned> DenseIndex<P> {
    /// Load an index from a snapshot file at `path`.
    ///
    /// Fails with [`Error::CorruptIndex`] if the file is missing, unreadable,
    /// truncated, or internally inconsistent.
    #[instrument]
    pub async fn load(path: &Path) -> Result<Self> {
        let snapshot = persistence::read_snapshot::<P>(path).await?;
        info!(path = %path.display(), count = snapshot.count, "Loaded index");

        Ok(Self {
            dimensions: snapshot.dimensions,
            metric: snapshot.metric,
            attributes: snapshot.attributes,
            entries: RwLock::new(snapshot.entries),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index_with(vectors: Vec<Vec<f32>>) -> DenseIndex<usize> {
        let index = DenseIndex::new(vectors[0].len(), DistanceMetric::DotProduct).unwrap();
        index
            .insert_batch(vectors.into_iter().enumerate().map(|(i, v)| (v, i)))
            .unwrap();
        index
    }

    #[test]
    fn test_search_ranks_by_similarity() {
        let index = index_with(vec![
            vec![0.0, 1.0, 0.0],
            vec![1.0, 0.0, 0.0],
            vec![0.9, 0.1, 0.0],
        ]);

        let hits = index.search(&[1.0, 0.0, 0.0], 3).unwrap();
        assert_eq!(hits.len(), 3);
        assert_eq!(hits[0].payload, 1);
        assert_eq!(hits[1].payload, 2);
        assert_eq!(hits[2].payload, 0);
        assert!(hits[0].score >= hits[1].score && hits[1].score >= hits[2].score);
    }

    #[test]
    fn test_tie_break_prefers_earlier_insertion() {
        let index = index_with(vec![
            vec![1.0, 0.0],
            vec![1.0, 0.0],
            vec![1.0, 0.0],
        ]);

        let hits = index.search(&[1.0, 0.0], 3).unwrap();
        let ids: Vec<u64> = hits.iter().map(|h| h.id).collect();
        assert_eq!(ids, vec![0, 1, 2]);
    }

    #[test]
    fn test_k_zero_is_invalid() {
        let index = index_with(vec![vec![1.0, 0.0]]);
        assert!(matches!(
            index.search(&[1.0, 0.0], 0),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_k_clamped_to_index_size() {
        let index = index_with(vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
        let hits = index.search(&[1.0, 0.0], 100).unwrap();
        assert_eq!(hits.len(), 2);
    }

    #[test]
    fn test_dimension_mismatch_rejects_whole_batch() {
        let index: DenseIndex<usize> = DenseIndex::new(3, DistanceMetric::DotProduct).unwrap();
        let result = index.insert_batch(vec![
            (vec![1.0, 0.0, 0.0], 0),
            (vec![1.0, 0.0], 1),
        ]);
        assert!(matches!(result, Err(Error::DimensionMismatch { .. })));
        assert!(index.is_empty());
    }

    #[test]
    fn test_query_dimension_mismatch() {
        let index = index_with(vec![vec![1.0, 0.0, 0.0]]);
        assert!(matches!(
            index.search(&[1.0, 0.0], 1),
            Err(Error::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_zero_dimensions_rejected() {
        assert!(matches!(
            DenseIndex::<usize>::new(0, DistanceMetric::DotProduct),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[tokio::test]
    async fn test_save_load_round_trip_preserves_search() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.json");

        let mut index = index_with(vec![
            vec![1.0, 0.0, 0.0],
            vec![0.0, 1.0, 0.0],
            vec![0.7, 0.7, 0.0],
        ]);
        index.set_attribute("model", "stub-embedder");
        index.save(&path).await.unwrap();

        let loaded: DenseIndex<usize> = DenseIndex::load(&path).await.unwrap();
        assert_eq!(loaded.attributes().get("model").unwrap(), "stub-embedder");

        let query = [0.6, 0.8, 0.0];
        let before = index.search(&query, 3).unwrap();
        let after = loaded.search(&query, 3).unwrap();
        assert_eq!(before.len(), after.len());
        for (b, a) in before.iter().zip(after.iter()) {
            assert_eq!(b.id, a.id);
            assert!((b.score - a.score).abs() < 1e-6);
        }
    }

    #[tokio::test]
    async fn test_load_rejects_entry_ids_that_disagree_with_position() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.json");

        // A file whose only defect is a non-sequential id must be rejected
        // at load; search resolves hits by position and would index out of
        // bounds otherwise.
        let snap = persistence::Snapshot {
            magic: persistence::MAGIC.to_string(),
            version: persistence::FORMAT_VERSION,
            dimensions: 2,
            metric: DistanceMetric::DotProduct,
            count: 1,
            created_at: chrono::Utc::now(),
            attributes: BTreeMap::new(),
            entries: vec![Entry {
                id: 99,
                vector: vec![1.0, 0.0],
                payload: 0usize,
            }],
        };
        persistence::write_snapshot(&path, &snap).await.unwrap();

        let result = DenseIndex::<usize>::load(&path).await;
        assert!(matches!(result, Err(Error::CorruptIndex(_))));
    }

    #[tokio::test]
    async fn test_load_missing_path_is_corrupt_index() {
        let dir = tempfile::tempdir().unwrap();
        let result = DenseIndex::<usize>::load(&dir.path().join("nope.json")).await;
        assert!(matches!(result, Err(Error::CorruptIndex(_))));
    }
}
