//! # portfolio-feed
//!
//! Live-quote ingestion and portfolio state for the holdings dashboard.
//!
//! ## Architecture
//!
//! The crate is organized in layers:
//!
//! 1. **Core** — Shared newtypes, domain models (holding, quote, portfolio),
//!    errors, the durable quote cache
//! 2. **Feed** — `FeedConnector`: a background tokio task owning the
//!    WebSocket connection, the rotation timer, and the synthetic fallback
//!    generator
//!
//! The connector maintains a live quote stream for a fixed set of holdings.
//! Every inbound trade is reduced to a [`Quote`](domain::quote::Quote) and
//! merged into the [`QuoteBook`](domain::quote::QuoteBook), whose snapshot is
//! replaced atomically and persisted to a local cache file. When the real
//! feed is unavailable (auth failure, transport error, unclean close) the
//! connector degrades to synthetic price motion until the next rotation.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use portfolio_feed::prelude::*;
//! use futures_util::StreamExt;
//!
//! let mut feed = FeedConnector::new(FeedConfig {
//!     token: std::env::var("FINNHUB_TOKEN")?,
//!     ..Default::default()
//! });
//! feed.connect().await;
//!
//! let events = feed.events();
//! tokio::pin!(events);
//! while let Some(event) = events.next().await {
//!     if let FeedEvent::Quotes { snapshot, .. } = event {
//!         let stats = PortfolioStats::from_snapshot(&snapshot);
//!         println!("P/L: {:.2} ({:.2}%)", stats.total_pl, stats.pl_percent);
//!     }
//! }
//! ```

// ── Layer 1: Core ────────────────────────────────────────────────────────────

/// Shared newtypes used across all domains.
pub mod shared;

/// Domain modules (vertical slices): holdings, quotes, portfolio stats.
pub mod domain;

/// Error types.
pub mod error;

/// Network URL constants and helpers.
pub mod network;

/// Durable on-disk quote snapshot cache.
pub mod cache;

// ── Layer 2: Feed ────────────────────────────────────────────────────────────

/// Feed connector: wire messages, events, connection state, synthetic fallback.
pub mod feed;

// ── Prelude ──────────────────────────────────────────────────────────────────

pub mod prelude {
    // Shared newtypes
    pub use crate::shared::{Direction, Symbol};

    // Domain types
    pub use crate::domain::holding::{default_portfolio, Holding};
    pub use crate::domain::portfolio::PortfolioStats;
    pub use crate::domain::quote::{Quote, QuoteBook, QuoteSnapshot};

    // Errors
    pub use crate::error::CacheError;

    // Network
    pub use crate::network::DEFAULT_WS_URL;

    // Cache
    pub use crate::cache::QuoteCache;

    // Feed connector + types
    pub use crate::feed::connector::FeedConnector;
    pub use crate::feed::{
        ConnState, FeedConfig, FeedEvent, Kind, MessageIn, MessageOut, QuoteSource, TradeTick,
    };
}
