//! Quote domain — per-symbol market data plus derived change fields.

pub mod state;

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use super::holding::Holding;
use crate::shared::{format_percent, percent_change, Direction, Symbol};

pub use state::{QuoteBook, QuoteSnapshot};

/// Latest market data for one symbol.
///
/// Holding fields (company, quantity, average price) are denormalized onto
/// the quote for convenient display. `change` and `direction` are derived
/// solely from the comparison against the immediately preceding price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub symbol: Symbol,
    pub company: String,
    pub quantity: f64,
    pub avg_price: f64,
    /// Last traded price. `None` until the first tick arrives.
    pub price: Option<f64>,
    /// Percent change versus the previous price, zero if none.
    pub change: f64,
    pub direction: Direction,
    /// `change` formatted for display, e.g. `"0.42%"`.
    pub change_label: String,
    pub timestamp: DateTime<Utc>,
}

impl Quote {
    /// Seed entry for a symbol with no data yet: null price, zero change,
    /// flat direction. Quantity is zero until the first tick so an untraded
    /// position contributes nothing to portfolio totals.
    pub fn placeholder(holding: &Holding) -> Self {
        Self {
            symbol: holding.symbol.clone(),
            company: holding.company.clone(),
            quantity: 0.0,
            avg_price: holding.avg_price,
            price: None,
            change: 0.0,
            direction: Direction::Flat,
            change_label: format_percent(0.0),
            timestamp: DateTime::<Utc>::UNIX_EPOCH,
        }
    }

    /// Derive a quote from a trade tick.
    ///
    /// `prev_price` is the last known price for the symbol; with none, the
    /// tick is treated as unchanged (zero change, flat).
    pub fn from_tick(holding: &Holding, prev_price: Option<f64>, price: f64, timestamp_ms: i64) -> Self {
        let change = percent_change(prev_price, price);
        Self {
            symbol: holding.symbol.clone(),
            company: holding.company.clone(),
            quantity: holding.quantity,
            avg_price: holding.avg_price,
            price: Some(price),
            change,
            direction: Direction::classify(prev_price, price),
            change_label: format_percent(change),
            timestamp: Utc
                .timestamp_millis_opt(timestamp_ms)
                .single()
                .unwrap_or_else(Utc::now),
        }
    }

    /// Unrealized profit/loss for the position, zero without a price.
    pub fn profit_loss(&self) -> f64 {
        match self.price {
            Some(p) => (p - self.avg_price) * self.quantity,
            None => 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn holding() -> Holding {
        Holding::new("AAPL", "Apple", 10.0, 150.0)
    }

    #[test]
    fn test_placeholder_has_null_price_and_flat_direction() {
        let q = Quote::placeholder(&holding());
        assert_eq!(q.price, None);
        assert_eq!(q.change, 0.0);
        assert_eq!(q.direction, Direction::Flat);
        assert_eq!(q.change_label, "0.00%");
        assert_eq!(q.quantity, 0.0);
    }

    #[test]
    fn test_from_tick_price_increase() {
        let q = Quote::from_tick(&holding(), Some(150.0), 153.0, 1_740_076_800_000);
        assert_eq!(q.price, Some(153.0));
        assert_eq!(q.direction, Direction::Up);
        assert!((q.change - 2.0).abs() < 1e-9);
        assert_eq!(q.change_label, "2.00%");
    }

    #[test]
    fn test_from_tick_price_decrease() {
        let q = Quote::from_tick(&holding(), Some(150.0), 147.0, 0);
        assert_eq!(q.direction, Direction::Down);
        assert!(q.change < 0.0);
    }

    #[test]
    fn test_from_tick_unchanged_price_is_flat() {
        let q = Quote::from_tick(&holding(), Some(150.0), 150.0, 0);
        assert_eq!(q.direction, Direction::Flat);
        assert_eq!(q.change, 0.0);
    }

    #[test]
    fn test_from_tick_without_prior_price_is_flat_with_zero_change() {
        let q = Quote::from_tick(&holding(), None, 162.0, 0);
        assert_eq!(q.direction, Direction::Flat);
        assert_eq!(q.change, 0.0);
        assert_eq!(q.price, Some(162.0));
    }

    #[test]
    fn test_from_tick_converts_epoch_millis() {
        let q = Quote::from_tick(&holding(), None, 150.0, 1_740_076_800_000);
        assert_eq!(q.timestamp.timestamp_millis(), 1_740_076_800_000);
    }

    #[test]
    fn test_profit_loss() {
        let q = Quote::from_tick(&holding(), None, 155.0, 0);
        assert_eq!(q.profit_loss(), 50.0);
        assert_eq!(Quote::placeholder(&holding()).profit_loss(), 0.0);
    }
}
