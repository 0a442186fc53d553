//! Error types for snapshot ingestion
//!
//! Queries never fail: unknown IDs and missing paths are empty results.
//! The only fallible step is decoding a snapshot handed over by the store.

/// Snapshot decoding errors
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    /// Malformed JSON or missing required fields
    #[error("invalid snapshot: {0}")]
    Json(#[from] serde_json::Error),
}
