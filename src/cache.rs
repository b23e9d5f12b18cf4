//! Durable on-disk quote snapshot cache.
//!
//! A single JSON file holds the serialized symbol→quote map. It is read once
//! when the quote book is built and rewritten on every merge, so a restart
//! picks up the last known prices instead of blank placeholders.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::domain::quote::Quote;
use crate::error::CacheError;
use crate::shared::Symbol;

/// File-backed cache for the latest quote snapshot.
#[derive(Debug, Clone)]
pub struct QuoteCache {
    path: PathBuf,
}

impl QuoteCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the persisted snapshot.
    ///
    /// Returns `None` when the file is missing or its content is malformed;
    /// a malformed cache is discarded (and logged) rather than surfaced, so
    /// the book reseeds defaults.
    pub fn load(&self) -> Option<HashMap<Symbol, Quote>> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                tracing::warn!("quote cache unreadable, reseeding: {e}");
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                tracing::warn!("quote cache malformed, discarding: {e}");
                None
            }
        }
    }

    /// Persist a snapshot.
    ///
    /// Writes a temporary sibling and renames it into place, so a crashed
    /// write never corrupts the previous snapshot.
    pub fn store(&self, snapshot: &HashMap<Symbol, Quote>) -> Result<(), CacheError> {
        let json = serde_json::to_string(snapshot)?;
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::holding::Holding;
    use std::sync::atomic::{AtomicU32, Ordering};

    static SEQ: AtomicU32 = AtomicU32::new(0);

    fn temp_cache(name: &str) -> QuoteCache {
        let seq = SEQ.fetch_add(1, Ordering::SeqCst);
        let path = std::env::temp_dir().join(format!(
            "portfolio-feed-{}-{}-{}.json",
            name,
            std::process::id(),
            seq
        ));
        let _ = fs::remove_file(&path);
        QuoteCache::new(path)
    }

    fn sample_snapshot() -> HashMap<Symbol, Quote> {
        let holding = Holding::new("AAPL", "Apple", 10.0, 150.0);
        let mut map = HashMap::new();
        map.insert(
            holding.symbol.clone(),
            Quote::from_tick(&holding, Some(150.0), 151.5, 1_740_076_800_000),
        );
        map
    }

    #[test]
    fn test_missing_file_loads_none() {
        let cache = temp_cache("missing");
        assert!(cache.load().is_none());
    }

    #[test]
    fn test_store_then_load_roundtrip() {
        let cache = temp_cache("roundtrip");
        let snapshot = sample_snapshot();
        cache.store(&snapshot).unwrap();

        let loaded = cache.load().unwrap();
        let quote = &loaded[&Symbol::from("AAPL")];
        assert_eq!(quote.price, Some(151.5));
        assert_eq!(quote.company, "Apple");

        let _ = fs::remove_file(cache.path());
    }

    #[test]
    fn test_malformed_file_is_discarded() {
        let cache = temp_cache("malformed");
        fs::write(cache.path(), "{not json").unwrap();
        assert!(cache.load().is_none());
        let _ = fs::remove_file(cache.path());
    }

    #[test]
    fn test_store_overwrites_previous_snapshot() {
        let cache = temp_cache("overwrite");
        cache.store(&sample_snapshot()).unwrap();
        cache.store(&HashMap::new()).unwrap();
        assert!(cache.load().unwrap().is_empty());
        let _ = fs::remove_file(cache.path());
    }
}
