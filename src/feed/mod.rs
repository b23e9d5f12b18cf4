//! Feed layer — wire messages, events, connection state, configuration.
//!
//! The transport lives in [`connector`]: a background tokio task owns the
//! WebSocket connection, the rotation timer, and (in degraded mode) the
//! synthetic tick interval. This module defines the shared message and event
//! types.

pub mod connector;
pub mod synthetic;

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::holding::{default_portfolio, Holding};
use crate::domain::quote::QuoteSnapshot;
use crate::network::DEFAULT_WS_URL;
use crate::shared::Symbol;

pub use connector::FeedConnector;

// ─── Outbound messages ───────────────────────────────────────────────────────

/// Messages sent from client to the feed.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum MessageOut {
    #[serde(rename = "subscribe")]
    Subscribe { symbol: Symbol },
}

// ─── Inbound messages ────────────────────────────────────────────────────────

/// Raw inbound message from the feed.
///
/// The feed mostly sends `type`-tagged frames, but the authentication
/// failure signal arrives as a bare `{"status": "auth_failed"}` object, so
/// parsing tries the status shape first.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum MessageIn {
    Signal(StatusSignal),
    Kind(Kind),
}

/// Top-level status signal, e.g. `{"status": "auth_failed"}`.
#[derive(Debug, Clone, Deserialize)]
pub struct StatusSignal {
    pub status: String,
}

impl StatusSignal {
    pub fn is_auth_failed(&self) -> bool {
        self.status == "auth_failed"
    }
}

/// The type of a tagged inbound frame.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum Kind {
    #[serde(rename = "trade")]
    Trade(TradePayload),
    #[serde(rename = "ping")]
    Ping,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TradePayload {
    pub data: Vec<TradeTick>,
}

/// One trade in a `trade` frame. The wire also carries a volume field,
/// which quote derivation has no use for and deserialization skips.
#[derive(Debug, Clone, Deserialize)]
pub struct TradeTick {
    #[serde(rename = "s")]
    pub symbol: Symbol,
    #[serde(rename = "p")]
    pub price: f64,
    #[serde(rename = "t")]
    pub timestamp_ms: i64,
}

// ─── FeedEvent ───────────────────────────────────────────────────────────────

/// Where an update batch came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuoteSource {
    Live,
    Synthetic,
}

/// High-level events emitted by the connector to the consumer.
#[derive(Debug, Clone)]
pub enum FeedEvent {
    /// Connection established and subscriptions sent.
    Connected,
    /// Connection lost or closed.
    Disconnected { code: Option<u16>, reason: String },
    /// A merged quote batch; `snapshot` is the full post-merge state.
    Quotes {
        snapshot: QuoteSnapshot,
        source: QuoteSource,
    },
    /// The synthetic generator took over until the next rotation.
    SyntheticStarted,
    /// A connection or protocol error (absorbed, never fatal).
    Error(String),
}

// ─── ConnState ───────────────────────────────────────────────────────────────

/// Connection lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum ConnState {
    Disconnected = 0,
    Connecting = 1,
    Connected = 2,
    /// Live feed unavailable; synthetic updates are flowing.
    Degraded = 3,
}

impl From<u16> for ConnState {
    fn from(v: u16) -> Self {
        match v {
            1 => ConnState::Connecting,
            2 => ConnState::Connected,
            3 => ConnState::Degraded,
            _ => ConnState::Disconnected,
        }
    }
}

// ─── FeedConfig ──────────────────────────────────────────────────────────────

/// Configuration for the feed connector.
#[derive(Debug, Clone)]
pub struct FeedConfig {
    pub ws_url: String,
    /// Access token appended to the connection URL.
    pub token: String,
    pub holdings: Vec<Holding>,
    /// Unconditional teardown-and-reconnect cadence.
    pub rotation_interval: Duration,
    /// Cadence of synthetic updates in degraded mode.
    pub synthetic_tick: Duration,
    /// Symmetric bound on the synthetic per-tick price perturbation.
    pub synthetic_amplitude: f64,
    /// Synthetic timestamps are back-dated by up to this much.
    pub synthetic_jitter: Duration,
    /// Snapshot cache file; `None` disables persistence.
    pub cache_path: Option<PathBuf>,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            ws_url: DEFAULT_WS_URL.to_string(),
            token: String::new(),
            holdings: default_portfolio(),
            rotation_interval: Duration::from_secs(3 * 60),
            synthetic_tick: Duration::from_millis(1000),
            synthetic_amplitude: 5.0,
            synthetic_jitter: Duration::from_secs(20 * 60),
            cache_path: None,
        }
    }
}

impl FeedConfig {
    /// Look up the configured holding for a symbol.
    pub fn holding(&self, symbol: &Symbol) -> Option<&Holding> {
        self.holdings.iter().find(|h| &h.symbol == symbol)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subscribe_serialization() {
        let msg = MessageOut::Subscribe {
            symbol: Symbol::from("AAPL"),
        };
        let json = serde_json::to_string(&msg).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed["type"], "subscribe");
        assert_eq!(parsed["symbol"], "AAPL");
    }

    #[test]
    fn test_parse_trade_frame() {
        let raw = r#"{"type":"trade","data":[{"s":"AAPL","p":150.25,"t":1740076800000,"v":12.0}]}"#;
        let msg: MessageIn = serde_json::from_str(raw).unwrap();
        match msg {
            MessageIn::Kind(Kind::Trade(payload)) => {
                assert_eq!(payload.data.len(), 1);
                let tick = &payload.data[0];
                assert_eq!(tick.symbol.as_str(), "AAPL");
                assert_eq!(tick.price, 150.25);
                assert_eq!(tick.timestamp_ms, 1_740_076_800_000);
            }
            other => panic!("expected trade frame, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_trade_with_minimal_fields() {
        let raw = r#"{"type":"trade","data":[{"s":"KO","p":61.0,"t":0}]}"#;
        let msg: MessageIn = serde_json::from_str(raw).unwrap();
        assert!(matches!(msg, MessageIn::Kind(Kind::Trade(_))));
    }

    #[test]
    fn test_parse_ping_frame() {
        let msg: MessageIn = serde_json::from_str(r#"{"type":"ping"}"#).unwrap();
        assert!(matches!(msg, MessageIn::Kind(Kind::Ping)));
    }

    #[test]
    fn test_parse_auth_failed_signal() {
        let msg: MessageIn = serde_json::from_str(r#"{"status":"auth_failed"}"#).unwrap();
        match msg {
            MessageIn::Signal(sig) => assert!(sig.is_auth_failed()),
            other => panic!("expected status signal, got {other:?}"),
        }
    }

    #[test]
    fn test_malformed_frame_does_not_parse() {
        assert!(serde_json::from_str::<MessageIn>(r#"{"type":"trade","data":"nope"}"#).is_err());
        assert!(serde_json::from_str::<MessageIn>("not json").is_err());
    }

    #[test]
    fn test_conn_state_from_u16_roundtrip() {
        for state in [
            ConnState::Disconnected,
            ConnState::Connecting,
            ConnState::Connected,
            ConnState::Degraded,
        ] {
            assert_eq!(ConnState::from(state as u16), state);
        }
        assert_eq!(ConnState::from(99), ConnState::Disconnected);
    }

    #[test]
    fn test_default_config() {
        let config = FeedConfig::default();
        assert_eq!(config.ws_url, DEFAULT_WS_URL);
        assert_eq!(config.holdings.len(), 9);
        assert_eq!(config.rotation_interval, Duration::from_secs(180));
        assert_eq!(config.synthetic_tick, Duration::from_millis(1000));
        assert_eq!(config.synthetic_amplitude, 5.0);
        assert_eq!(config.synthetic_jitter, Duration::from_secs(1200));
        assert!(config.cache_path.is_none());
    }

    #[test]
    fn test_holding_lookup() {
        let config = FeedConfig::default();
        assert!(config.holding(&Symbol::from("AAPL")).is_some());
        assert!(config.holding(&Symbol::from("GME")).is_none());
    }
}
