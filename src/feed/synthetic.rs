//! Synthetic feed generator — plausible quote motion when no real feed is
//! available.
//!
//! Each batch perturbs every holding's last known price (or its average
//! acquisition price before any tick) within a symmetric bound, derives
//! change and direction exactly as the live path does, and back-dates the
//! timestamp by a random offset to simulate feed jitter.

use std::collections::HashMap;

use chrono::Utc;
use rand::Rng;

use super::FeedConfig;
use crate::domain::quote::Quote;
use crate::shared::Symbol;

/// Produce one synthetic update batch covering every configured holding.
pub fn next_updates(
    config: &FeedConfig,
    snapshot: &HashMap<Symbol, Quote>,
) -> HashMap<Symbol, Quote> {
    let mut rng = rand::thread_rng();
    let now = Utc::now();
    let jitter_ms = config.synthetic_jitter.as_millis() as i64;
    let amplitude = config.synthetic_amplitude;

    let mut updates = HashMap::with_capacity(config.holdings.len());
    for holding in &config.holdings {
        let base = snapshot
            .get(&holding.symbol)
            .and_then(|q| q.price)
            .unwrap_or(holding.avg_price);
        let price = base + rng.gen_range(-amplitude..=amplitude);

        let offset = if jitter_ms > 0 {
            rng.gen_range(0..jitter_ms)
        } else {
            0
        };
        let timestamp = now - chrono::Duration::milliseconds(offset);

        updates.insert(
            holding.symbol.clone(),
            Quote::from_tick(holding, Some(base), price, timestamp.timestamp_millis()),
        );
    }
    updates
}
