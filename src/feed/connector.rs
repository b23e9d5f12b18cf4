//! Feed connector — `tokio-tungstenite`.
//!
//! A background tokio task owns the connection and all timers:
//! - Connects and subscribes to every configured holding
//! - Reduces inbound trades to quotes and merges them into the quote book
//! - Degrades to the synthetic generator on auth failure, transport error,
//!   or unclean close
//! - Rotates (unconditional teardown + reconnect) on a fixed interval; this
//!   is the sole reconnection mechanism, errors never trigger their own retry
//! - Stream-based event delivery to the consumer
//!
//! Task exit drops the rotation timer, the synthetic interval, and the
//! socket together, so no background tick source survives teardown.

use std::collections::HashMap;
use std::pin::Pin;
use std::sync::atomic::{AtomicU16, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use futures_util::stream::{SplitSink, SplitStream, Stream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use crate::cache::QuoteCache;
use crate::domain::quote::{Quote, QuoteBook, QuoteSnapshot};
use crate::feed::{
    synthetic, ConnState, FeedConfig, FeedEvent, Kind, MessageIn, MessageOut, QuoteSource,
    TradeTick,
};
use crate::network::ws_url_with_token;
use crate::shared::Symbol;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

// ─── Commands from public API to background task ─────────────────────────────

enum Command {
    Shutdown,
}

// ─── Session outcomes ────────────────────────────────────────────────────────

/// How one live session ended.
enum SessionEnd {
    /// Rotation timer fired; reconnect immediately.
    Rotate,
    Shutdown,
    /// Auth failure, transport error, or unclean close — fall back to the
    /// synthetic generator until the next rotation.
    Degraded,
    /// Server closed cleanly; stay idle (no synthetic data) until rotation.
    CleanClose,
}

/// Why a degraded or idle wait ended.
enum Wakeup {
    Rotate,
    Shutdown,
}

// ─── Background task state ───────────────────────────────────────────────────

struct TaskState {
    config: FeedConfig,
    book: QuoteBook,
    event_tx: mpsc::Sender<FeedEvent>,
    cmd_rx: mpsc::Receiver<Command>,
    conn_state: Arc<AtomicU16>,
    latest: Arc<RwLock<QuoteSnapshot>>,
}

impl TaskState {
    fn emit(&self, event: FeedEvent) {
        let _ = self.event_tx.try_send(event);
    }

    fn set_conn(&self, state: ConnState) {
        self.conn_state.store(state as u16, Ordering::SeqCst);
    }

    /// Merge a batch, publish the post-merge snapshot, and notify the consumer.
    fn publish(&mut self, updates: HashMap<Symbol, Quote>, source: QuoteSource) {
        let snapshot = self.book.merge(updates);
        let mut guard = match self.latest.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *guard = Arc::clone(&snapshot);
        drop(guard);
        self.emit(FeedEvent::Quotes { snapshot, source });
    }
}

// ─── Public FeedConnector ────────────────────────────────────────────────────

/// Live quote feed for a fixed set of holdings, with synthetic fallback and
/// periodic rotation.
///
/// Uses a background tokio task for connection management. The public API
/// communicates with it via mpsc channels; the latest snapshot is readable
/// at any time through [`snapshot`](FeedConnector::snapshot).
pub struct FeedConnector {
    config: FeedConfig,
    book: Option<QuoteBook>,
    cmd_tx: Option<mpsc::Sender<Command>>,
    event_rx: tokio::sync::Mutex<mpsc::Receiver<FeedEvent>>,
    event_tx: mpsc::Sender<FeedEvent>,
    task_handle: Option<JoinHandle<()>>,
    conn_state: Arc<AtomicU16>,
    latest: Arc<RwLock<QuoteSnapshot>>,
}

impl FeedConnector {
    /// Create a new connector. Does not connect yet.
    ///
    /// The quote book is built immediately — seeded from the cache when one
    /// is configured — so [`snapshot`](FeedConnector::snapshot) is populated
    /// before the first tick arrives.
    pub fn new(config: FeedConfig) -> Self {
        let book = build_book(&config);
        let latest = Arc::new(RwLock::new(book.snapshot()));
        let (event_tx, event_rx) = mpsc::channel(256);
        Self {
            config,
            book: Some(book),
            cmd_tx: None,
            event_rx: tokio::sync::Mutex::new(event_rx),
            event_tx,
            task_handle: None,
            conn_state: Arc::new(AtomicU16::new(ConnState::Disconnected as u16)),
            latest,
        }
    }

    /// Start the feed.
    ///
    /// Spawns the background task that manages the connection, the rotation
    /// timer, and the synthetic fallback. Success or failure of the
    /// connection attempt surfaces only through events.
    pub async fn connect(&mut self) {
        if self.cmd_tx.is_some() {
            return;
        }

        let (cmd_tx, cmd_rx) = mpsc::channel(16);
        self.cmd_tx = Some(cmd_tx);
        self.conn_state
            .store(ConnState::Connecting as u16, Ordering::SeqCst);

        let book = self
            .book
            .take()
            .unwrap_or_else(|| build_book(&self.config));
        let state = TaskState {
            config: self.config.clone(),
            book,
            event_tx: self.event_tx.clone(),
            cmd_rx,
            conn_state: Arc::clone(&self.conn_state),
            latest: Arc::clone(&self.latest),
        };

        self.task_handle = Some(tokio::spawn(run_task(state)));
    }

    /// Stop the feed.
    ///
    /// Closes any open connection and cancels the rotation and synthetic
    /// timers, leaving no background activity. A task that fails to wind
    /// down within the grace period is aborted.
    pub async fn shutdown(&mut self) {
        if let Some(tx) = self.cmd_tx.take() {
            let _ = tx.send(Command::Shutdown).await;
        }

        if let Some(mut handle) = self.task_handle.take() {
            if tokio::time::timeout(Duration::from_secs(5), &mut handle)
                .await
                .is_err()
            {
                handle.abort();
            }
        }

        self.conn_state
            .store(ConnState::Disconnected as u16, Ordering::SeqCst);
    }

    /// Current connection state.
    pub fn conn_state(&self) -> ConnState {
        ConnState::from(self.conn_state.load(Ordering::SeqCst))
    }

    /// Whether the live feed is currently connected.
    pub fn is_connected(&self) -> bool {
        self.conn_state() == ConnState::Connected
    }

    /// The latest quote snapshot.
    pub fn snapshot(&self) -> QuoteSnapshot {
        match self.latest.read() {
            Ok(guard) => Arc::clone(&guard),
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    /// Get a stream of events from the feed.
    ///
    /// The returned stream borrows `self`, so it must be dropped before
    /// calling `shutdown()`.
    pub fn events(&self) -> Pin<Box<dyn Stream<Item = FeedEvent> + Send + '_>> {
        Box::pin(futures_util::stream::unfold(
            &self.event_rx,
            |rx| async move {
                let mut guard = rx.lock().await;
                guard.recv().await.map(|event| (event, rx))
            },
        ))
    }
}

impl Drop for FeedConnector {
    fn drop(&mut self) {
        if let Some(handle) = self.task_handle.take() {
            handle.abort();
        }
    }
}

fn build_book(config: &FeedConfig) -> QuoteBook {
    let cache = config.cache_path.as_ref().map(QuoteCache::new);
    QuoteBook::new(&config.holdings, cache)
}

// ─── Background task ─────────────────────────────────────────────────────────

async fn run_task(mut state: TaskState) {
    let period = state.config.rotation_interval;
    let mut rotation =
        tokio::time::interval_at(tokio::time::Instant::now() + period, period);

    loop {
        match run_cycle(&mut state, &mut rotation).await {
            Wakeup::Rotate => {
                tracing::info!("rotation: replacing feed connection");
                continue;
            }
            Wakeup::Shutdown => break,
        }
    }

    state.set_conn(ConnState::Disconnected);
}

/// One connection lifetime: connect attempt, live session, then degraded or
/// idle wait until the rotation timer replaces it.
///
/// The connect attempt itself has no timeout; a stalled handshake is torn
/// down by the rotation timer like any other connection.
async fn run_cycle(state: &mut TaskState, rotation: &mut tokio::time::Interval) -> Wakeup {
    state.set_conn(ConnState::Connecting);
    let url = ws_url_with_token(&state.config.ws_url, &state.config.token);

    let connected = tokio::select! {
        res = attempt_connect(&url) => res,
        _ = rotation.tick() => return Wakeup::Rotate,
        _ = state.cmd_rx.recv() => return Wakeup::Shutdown,
    };

    let end = match connected {
        Ok((sink, stream)) => run_live(state, sink, stream, rotation).await,
        Err(e) => {
            tracing::warn!("feed connection failed: {e}");
            state.emit(FeedEvent::Error(format!("connection failed: {e}")));
            SessionEnd::Degraded
        }
    };

    match end {
        SessionEnd::Rotate => Wakeup::Rotate,
        SessionEnd::Shutdown => Wakeup::Shutdown,
        SessionEnd::Degraded => {
            state.set_conn(ConnState::Degraded);
            state.emit(FeedEvent::SyntheticStarted);
            tracing::info!("live feed unavailable, switching to synthetic quotes");
            run_degraded(state, rotation).await
        }
        SessionEnd::CleanClose => {
            state.set_conn(ConnState::Disconnected);
            run_idle(state, rotation).await
        }
    }
}

/// The connected loop — runs until the connection breaks, rotation fires,
/// or shutdown is requested.
async fn run_live(
    state: &mut TaskState,
    mut sink: SplitSink<WsStream, Message>,
    mut stream: SplitStream<WsStream>,
    rotation: &mut tokio::time::Interval,
) -> SessionEnd {
    for holding in &state.config.holdings {
        let msg = MessageOut::Subscribe {
            symbol: holding.symbol.clone(),
        };
        if let Err(e) = send_msg(&mut sink, &msg).await {
            tracing::warn!("subscribe {} failed: {e}", holding.symbol);
        }
    }

    state.set_conn(ConnState::Connected);
    state.emit(FeedEvent::Connected);
    tracing::info!("feed connected, {} symbols subscribed", state.config.holdings.len());

    loop {
        tokio::select! {
            // ── a) Incoming WS message ───────────────────────────────────
            msg = stream.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        let text_str: &str = text.as_ref();
                        if let TextOutcome::AuthFailed = handle_text(state, text_str) {
                            let _ = sink.send(Message::Close(Some(CloseFrame {
                                code: CloseCode::Normal,
                                reason: "auth failed".into(),
                            }))).await;
                            state.emit(FeedEvent::Disconnected {
                                code: None,
                                reason: "auth_failed".into(),
                            });
                            return SessionEnd::Degraded;
                        }
                    }
                    Some(Ok(Message::Ping(data))) => {
                        let _ = sink.send(Message::Pong(data)).await;
                    }
                    Some(Ok(Message::Pong(_))) => {}
                    Some(Ok(Message::Close(frame))) => {
                        let (code, reason) = extract_close(frame.as_ref());
                        state.emit(FeedEvent::Disconnected {
                            code: Some(code),
                            reason: reason.clone(),
                        });
                        return if code == 1000 {
                            SessionEnd::CleanClose
                        } else {
                            tracing::warn!("feed closed uncleanly: {code} {reason}");
                            SessionEnd::Degraded
                        };
                    }
                    Some(Ok(_)) => {} // Binary, Frame — ignore
                    Some(Err(e)) => {
                        let reason = e.to_string();
                        tracing::warn!("feed transport error: {reason}");
                        state.emit(FeedEvent::Disconnected { code: None, reason });
                        return SessionEnd::Degraded;
                    }
                    None => {
                        state.emit(FeedEvent::Disconnected {
                            code: None,
                            reason: "stream ended".into(),
                        });
                        return SessionEnd::Degraded;
                    }
                }
            }

            // ── b) Rotation — teardown regardless of connection health ───
            _ = rotation.tick() => {
                let _ = sink.send(Message::Close(Some(CloseFrame {
                    code: CloseCode::Normal,
                    reason: "rotation".into(),
                }))).await;
                state.emit(FeedEvent::Disconnected {
                    code: None,
                    reason: "rotation".into(),
                });
                return SessionEnd::Rotate;
            }

            // ── c) Shutdown ──────────────────────────────────────────────
            _ = state.cmd_rx.recv() => {
                let _ = sink.send(Message::Close(Some(CloseFrame {
                    code: CloseCode::Normal,
                    reason: "client shutdown".into(),
                }))).await;
                return SessionEnd::Shutdown;
            }
        }
    }
}

/// Degraded mode: synthetic quote motion until rotation or shutdown.
async fn run_degraded(state: &mut TaskState, rotation: &mut tokio::time::Interval) -> Wakeup {
    let mut tick = tokio::time::interval(state.config.synthetic_tick);
    tick.reset(); // first batch one full interval after degradation

    loop {
        tokio::select! {
            _ = tick.tick() => {
                let updates = synthetic::next_updates(&state.config, &state.book.snapshot());
                state.publish(updates, QuoteSource::Synthetic);
            }
            _ = rotation.tick() => return Wakeup::Rotate,
            _ = state.cmd_rx.recv() => return Wakeup::Shutdown,
        }
    }
}

/// Idle after a clean close: no data flows until rotation or shutdown.
async fn run_idle(state: &mut TaskState, rotation: &mut tokio::time::Interval) -> Wakeup {
    tokio::select! {
        _ = rotation.tick() => Wakeup::Rotate,
        _ = state.cmd_rx.recv() => Wakeup::Shutdown,
    }
}

// ─── Inbound message handling ────────────────────────────────────────────────

enum TextOutcome {
    Handled,
    AuthFailed,
}

fn handle_text(state: &mut TaskState, text: &str) -> TextOutcome {
    match serde_json::from_str::<MessageIn>(text) {
        Ok(MessageIn::Signal(signal)) => {
            if signal.is_auth_failed() {
                tracing::warn!("feed authentication failed");
                return TextOutcome::AuthFailed;
            }
            tracing::debug!("unhandled status signal dropped: {}", signal.status);
            TextOutcome::Handled
        }
        Ok(MessageIn::Kind(Kind::Ping)) => TextOutcome::Handled,
        Ok(MessageIn::Kind(Kind::Trade(payload))) => {
            apply_trades(state, payload.data);
            TextOutcome::Handled
        }
        Err(e) => {
            // Policy: log and drop. A bad frame never disturbs the book.
            tracing::warn!("malformed feed message dropped: {e} — raw: {text}");
            TextOutcome::Handled
        }
    }
}

/// Reduce a trade batch to quote updates and merge them.
///
/// Later ticks for the same symbol supersede earlier ones within the batch,
/// and each derives its change from the tick it supersedes. Ticks for
/// untracked symbols are dropped.
fn apply_trades(state: &mut TaskState, ticks: Vec<TradeTick>) {
    let mut updates: HashMap<Symbol, Quote> = HashMap::new();

    for tick in ticks {
        let Some(holding) = state.config.holding(&tick.symbol) else {
            tracing::debug!("tick for untracked symbol {} dropped", tick.symbol);
            continue;
        };
        let prev = updates
            .get(&tick.symbol)
            .and_then(|q| q.price)
            .or_else(|| state.book.last_price(&tick.symbol));
        updates.insert(
            tick.symbol.clone(),
            Quote::from_tick(holding, prev, tick.price, tick.timestamp_ms),
        );
    }

    if updates.is_empty() {
        return;
    }
    state.publish(updates, QuoteSource::Live);
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

async fn attempt_connect(
    url: &str,
) -> Result<(SplitSink<WsStream, Message>, SplitStream<WsStream>), String> {
    let (ws_stream, _) = connect_async(url).await.map_err(|e| e.to_string())?;
    Ok(ws_stream.split())
}

/// Serialize and send a MessageOut over the sink.
async fn send_msg(
    sink: &mut SplitSink<WsStream, Message>,
    msg: &MessageOut,
) -> Result<(), String> {
    let json = serde_json::to_string(msg).map_err(|e| e.to_string())?;
    sink.send(Message::Text(json.into()))
        .await
        .map_err(|e| e.to_string())
}

/// Extract close code and reason from an optional CloseFrame.
fn extract_close(frame: Option<&CloseFrame>) -> (u16, String) {
    match frame {
        Some(f) => (f.code.into(), f.reason.to_string()),
        None => (1006, "No close frame".into()),
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
