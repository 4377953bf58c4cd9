//! Common types for lore-vector.

use serde::{Deserialize, Serialize};

/// Unique identifier for an entry in an index.
///
/// Ids are assigned sequentially at insertion time, so they double as the
/// insertion order used for deterministic tie-breaking in search results.
pub type EntryId = u64;

/// A stored (vector, payload) pair.
///
/// Entries are immutable once inserted; the index only grows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entry<P> {
    /// Sequential id (insertion order).
    pub id: EntryId,
    /// The vector data.
    pub vector: Vec<f32>,
    /// Caller-defined payload carried alongside the vector.
    pub payload: P,
}

/// A single search hit.
#[derive(Debug, Clone)]
pub struct Hit<P> {
    /// Id of the matched entry.
    pub id: EntryId,
    /// Similarity score (higher is more similar).
    pub score: f32,
    /// Payload of the matched entry.
    pub payload: P,
}
