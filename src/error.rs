//! Error types.
//!
//! Transport failures inside the feed task are absorbed and converted into
//! degraded mode rather than surfaced to callers, so the only fallible
//! public edge is the cache.

use thiserror::Error;

/// Quote cache errors.
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Cache I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cache serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}
