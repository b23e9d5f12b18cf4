//! Portfolio domain — stateless reduction of a quote snapshot into totals.

use std::collections::HashMap;

use crate::domain::quote::Quote;
use crate::shared::Symbol;

/// Portfolio-level statistics derived from a quote snapshot.
///
/// Pure data: computing it twice from the same snapshot yields identical
/// totals. Degenerate inputs (zero invested, zero quantity, missing prices)
/// yield zero percentages rather than failing.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PortfolioStats {
    pub invested: f64,
    pub current_value: f64,
    pub total_pl: f64,
    pub pl_percent: f64,
    pub today_change: f64,
    pub today_percent: f64,
}

impl PortfolioStats {
    /// Reduce a snapshot into portfolio totals.
    ///
    /// Placeholder quotes carry zero quantity, so a snapshot with no ticks
    /// yet reduces to all-zero totals rather than a fully-underwater book.
    pub fn from_snapshot(snapshot: &HashMap<Symbol, Quote>) -> Self {
        let mut invested = 0.0;
        let mut current_value = 0.0;
        let mut today_change = 0.0;

        for quote in snapshot.values() {
            invested += quote.quantity * quote.avg_price;
            if let Some(price) = quote.price {
                current_value += quote.quantity * price;
            }
            today_change += quote.change * quote.quantity;
        }

        let total_pl = current_value - invested;
        let pl_percent = if invested > 0.0 {
            total_pl / invested * 100.0
        } else {
            0.0
        };
        let opening_value = current_value - today_change;
        let today_percent = if opening_value > 0.0 {
            today_change / opening_value * 100.0
        } else {
            0.0
        };

        Self {
            invested,
            current_value,
            total_pl,
            pl_percent,
            today_change,
            today_percent,
        }
    }
}
