//! Quote book — single source of truth for "latest quote per symbol".
//!
//! The feed task owns the book and is the only writer. Every merge produces
//! a fresh snapshot map and swaps it in, so readers holding a previous
//! [`QuoteSnapshot`] never observe a partially applied batch.

use std::collections::HashMap;
use std::sync::Arc;

use super::Quote;
use crate::cache::QuoteCache;
use crate::domain::holding::Holding;
use crate::shared::Symbol;

/// The complete symbol→quote mapping at a point in time.
pub type QuoteSnapshot = Arc<HashMap<Symbol, Quote>>;

/// State container for the latest quotes, with durable caching.
#[derive(Debug)]
pub struct QuoteBook {
    snapshot: QuoteSnapshot,
    cache: Option<QuoteCache>,
}

impl QuoteBook {
    /// Build the book for a set of holdings.
    ///
    /// When a cache is given and holds a well-formed snapshot, configured
    /// symbols found in it keep their cached quotes; symbols it does not
    /// cover are seeded as placeholders. Cached entries for symbols no
    /// longer configured are dropped.
    pub fn new(holdings: &[Holding], cache: Option<QuoteCache>) -> Self {
        let mut cached = cache
            .as_ref()
            .and_then(|c| c.load())
            .unwrap_or_default();

        let seeded: HashMap<Symbol, Quote> = holdings
            .iter()
            .map(|h| {
                let quote = cached
                    .remove(&h.symbol)
                    .unwrap_or_else(|| Quote::placeholder(h));
                (h.symbol.clone(), quote)
            })
            .collect();

        Self {
            snapshot: Arc::new(seeded),
            cache,
        }
    }

    /// Merge a batch of updates, producing and publishing a new snapshot.
    ///
    /// Each updated symbol's entry is replaced wholesale — never patched
    /// field-by-field. The new snapshot is persisted synchronously; a cache
    /// write failure is logged and the merge still succeeds.
    pub fn merge(&mut self, updates: HashMap<Symbol, Quote>) -> QuoteSnapshot {
        let mut next: HashMap<Symbol, Quote> = (*self.snapshot).clone();
        for (symbol, quote) in updates {
            next.insert(symbol, quote);
        }
        let next = Arc::new(next);

        if let Some(cache) = &self.cache {
            if let Err(e) = cache.store(&next) {
                tracing::warn!("quote cache write failed: {e}");
            }
        }

        self.snapshot = Arc::clone(&next);
        next
    }

    /// The current snapshot.
    pub fn snapshot(&self) -> QuoteSnapshot {
        Arc::clone(&self.snapshot)
    }

    /// Last known price for a symbol, if any tick has been seen.
    pub fn last_price(&self, symbol: &Symbol) -> Option<f64> {
        self.snapshot.get(symbol).and_then(|q| q.price)
    }
}
