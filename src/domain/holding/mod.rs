//! Holding domain — static portfolio positions.

use serde::{Deserialize, Serialize};

use crate::shared::Symbol;

/// A static portfolio position: symbol, quantity held, average acquisition
/// price. Immutable for the session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Holding {
    pub symbol: Symbol,
    pub company: String,
    pub quantity: f64,
    pub avg_price: f64,
}

impl Holding {
    pub fn new(symbol: impl Into<Symbol>, company: impl Into<String>, quantity: f64, avg_price: f64) -> Self {
        Self {
            symbol: symbol.into(),
            company: company.into(),
            quantity,
            avg_price,
        }
    }

    /// Capital invested in this position.
    pub fn invested(&self) -> f64 {
        self.quantity * self.avg_price
    }
}

/// The default tracked portfolio.
pub fn default_portfolio() -> Vec<Holding> {
    vec![
        Holding::new("TSLA", "Tesla", 5.0, 400.0),
        Holding::new("AMZN", "Amazon", 2.0, 3200.0),
        Holding::new("MSFT", "Microsoft", 8.0, 280.0),
        Holding::new("GOOGL", "Alphabet (Google)", 3.0, 2600.0),
        Holding::new("META", "Meta (Facebook)", 6.0, 320.0),
        Holding::new("NVDA", "NVIDIA", 4.0, 650.0),
        Holding::new("NFLX", "Netflix", 2.0, 500.0),
        Holding::new("AAPL", "Apple", 10.0, 150.0),
        Holding::new("KO", "Coca-Cola", 15.0, 60.0),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_default_portfolio_has_nine_unique_symbols() {
        let portfolio = default_portfolio();
        assert_eq!(portfolio.len(), 9);
        let symbols: HashSet<_> = portfolio.iter().map(|h| h.symbol.clone()).collect();
        assert_eq!(symbols.len(), 9);
    }

    #[test]
    fn test_invested() {
        let h = Holding::new("AAPL", "Apple", 10.0, 150.0);
        assert_eq!(h.invested(), 1500.0);
    }
}
