//! Error types for the stashkit library.
//!
//! ## Key Components
//!
//! - [`CacheError`]: every failure a cache operation can surface, from
//!   lookup misses to snapshot I/O and background-worker faults.
//! - [`Result`]: crate-wide alias over [`CacheError`].
//!
//! Lookup misses are ordinary results, not faults; they get their own
//! variant so callers can match on them without string inspection.

use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, CacheError>;

/// Errors surfaced by cache operations.
#[derive(Debug, Error)]
pub enum CacheError {
    /// The key is absent, expired, or was deleted.
    #[error("key not found")]
    KeyNotFound,

    /// A policy discriminant that names no known eviction policy.
    ///
    /// Only reachable by decoding a snapshot written with an unknown
    /// discriminant; in-process policy selection is a closed enum.
    #[error("invalid eviction policy discriminant {0}")]
    InvalidPolicy(u64),

    /// `open_file` was called with an empty path.
    #[error("cannot open empty filename")]
    EmptyFilename,

    /// The background worker failed or panicked; the cache carries the
    /// rendered fault until it is closed.
    #[error("background worker: {0}")]
    Background(String),

    /// Snapshot or load I/O failure, including short reads of a
    /// truncated or corrupt snapshot.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Typed key/value marshalling failure.
    #[error("codec: {0}")]
    Codec(#[from] bincode::Error),
}
