//! Realtime change feed over the backend's Phoenix-channel websocket.
//!
//! One socket is shared by every subscribed collection; each collection is a
//! channel topic joined with a `postgres_changes` filter on its table. The
//! socket reconnects with exponential backoff and rejoins live topics, and it
//! closes once the last topic is left.
//!
//! All websocket logic is gated behind `#[cfg(feature = "hydrate")]` since it
//! requires a browser environment. Message encoding and parsing are plain
//! functions so native tests cover them.

#[cfg(test)]
#[path = "realtime_test.rs"]
mod realtime_test;

#[cfg(any(test, feature = "hydrate"))]
use serde_json::{Value, json};
#[cfg(any(test, feature = "hydrate"))]
use session::backend::{ChangeEvent, ChangeKind, Collection};

#[cfg(feature = "hydrate")]
use std::cell::{Cell, RefCell};
#[cfg(feature = "hydrate")]
use std::collections::HashMap;
#[cfg(feature = "hydrate")]
use std::rc::{Rc, Weak};

#[cfg(feature = "hydrate")]
use futures::channel::mpsc;
#[cfg(feature = "hydrate")]
use session::backend::{ChangeCallback, ChangeFeedClient, Unsubscribe};
#[cfg(feature = "hydrate")]
use session::error::FeedError;

#[cfg(feature = "hydrate")]
use super::supabase::BackendClient;

#[cfg(feature = "hydrate")]
const HEARTBEAT_MS: u32 = 25_000;
#[cfg(feature = "hydrate")]
const MIN_BACKOFF_MS: u32 = 1_000;
#[cfg(feature = "hydrate")]
const MAX_BACKOFF_MS: u32 = 10_000;

// =============================================================================
// PROTOCOL
// =============================================================================

#[cfg(any(test, feature = "hydrate"))]
fn socket_url(project_url: &str, anon_key: &str) -> String {
    let base = if let Some(host) = project_url.strip_prefix("https://") {
        format!("wss://{host}")
    } else if let Some(host) = project_url.strip_prefix("http://") {
        format!("ws://{host}")
    } else {
        project_url.to_owned()
    };
    format!("{base}/realtime/v1/websocket?apikey={anon_key}&vsn=1.0.0")
}

#[cfg(any(test, feature = "hydrate"))]
fn topic(collection: Collection) -> String {
    format!("realtime:{}", collection.channel())
}

#[cfg(any(test, feature = "hydrate"))]
fn join_message(collection: Collection, msg_ref: u64, access_token: &str) -> String {
    json!({
        "topic": topic(collection),
        "event": "phx_join",
        "payload": {
            "config": {
                "broadcast": { "self": false },
                "presence": { "key": "" },
                "postgres_changes": [{ "event": "*", "schema": "public", "table": collection.table() }]
            },
            "access_token": access_token
        },
        "ref": msg_ref.to_string()
    })
    .to_string()
}

#[cfg(any(test, feature = "hydrate"))]
fn leave_message(collection: Collection, msg_ref: u64) -> String {
    json!({ "topic": topic(collection), "event": "phx_leave", "payload": {}, "ref": msg_ref.to_string() }).to_string()
}

#[cfg(any(test, feature = "hydrate"))]
fn heartbeat_message(msg_ref: u64) -> String {
    json!({ "topic": "phoenix", "event": "heartbeat", "payload": {}, "ref": msg_ref.to_string() }).to_string()
}

/// Server message classes the client acts on.
#[cfg(any(test, feature = "hydrate"))]
#[derive(Debug, PartialEq)]
enum Inbound {
    Change(ChangeEvent),
    Rejected { topic: String, reason: String },
    Ignored,
}

#[cfg(any(test, feature = "hydrate"))]
fn parse_inbound(text: &str) -> Inbound {
    let Ok(message) = serde_json::from_str::<Value>(text) else {
        return Inbound::Ignored;
    };
    let topic = message["topic"].as_str().unwrap_or_default();
    let payload = &message["payload"];
    match message["event"].as_str() {
        Some("postgres_changes") => parse_change(topic, &payload["data"]).map_or(Inbound::Ignored, Inbound::Change),
        Some("phx_reply" | "system") if payload["status"] == "error" => {
            let reason = payload["response"]["reason"]
                .as_str()
                .or_else(|| payload["message"].as_str())
                .unwrap_or("unknown reason");
            Inbound::Rejected { topic: topic.to_owned(), reason: reason.to_owned() }
        }
        Some("phx_error") => Inbound::Rejected { topic: topic.to_owned(), reason: "channel error".to_owned() },
        _ => Inbound::Ignored,
    }
}

#[cfg(any(test, feature = "hydrate"))]
fn parse_change(topic: &str, data: &Value) -> Option<ChangeEvent> {
    let collection = data["table"].as_str().and_then(Collection::from_table).or_else(|| {
        let channel = topic.strip_prefix("realtime:")?;
        Collection::ALL.into_iter().find(|c| c.channel() == channel)
    })?;
    let kind = ChangeKind::parse(data["type"].as_str()?)?;
    Some(ChangeEvent { collection, kind, record: data["record"].clone(), old_record: data["old_record"].clone() })
}

/// Whether the socket tasks started as `own` generation should keep going.
///
/// A remount that opens a newer socket retires the older tasks even when
/// topics and an outbox exist again by the time they look.
#[cfg(any(test, feature = "hydrate"))]
fn socket_wanted(own: u64, current: u64, has_outbox: bool, has_topics: bool) -> bool {
    own == current && has_outbox && has_topics
}

// =============================================================================
// BROWSER CLIENT
// =============================================================================

#[cfg(feature = "hydrate")]
struct RealtimeInner {
    url: String,
    backend: Rc<BackendClient>,
    topics: RefCell<HashMap<Collection, ChangeCallback>>,
    /// Sender into the live socket task, `None` while no socket is wanted.
    outbox: RefCell<Option<mpsc::UnboundedSender<String>>>,
    next_ref: Cell<u64>,
    /// Bumped per opened socket so stale socket and heartbeat tasks stop.
    generation: Cell<u64>,
}

#[cfg(feature = "hydrate")]
impl RealtimeInner {
    fn next_ref(&self) -> u64 {
        let next = self.next_ref.get() + 1;
        self.next_ref.set(next);
        next
    }

    fn send(&self, text: String) {
        if let Some(tx) = self.outbox.borrow().as_ref() {
            let _ = tx.unbounded_send(text);
        }
    }

    fn join(&self, collection: Collection) {
        let msg = join_message(collection, self.next_ref(), &self.backend.bearer());
        self.send(msg);
    }

    fn wanted(&self, generation: u64) -> bool {
        socket_wanted(
            generation,
            self.generation.get(),
            self.outbox.borrow().is_some(),
            !self.topics.borrow().is_empty(),
        )
    }

    fn dispatch(&self, text: &str) {
        match parse_inbound(text) {
            Inbound::Change(event) => {
                let callback = self.topics.borrow().get(&event.collection).cloned();
                if let Some(callback) = callback {
                    callback(event);
                }
            }
            Inbound::Rejected { topic, reason } => log::warn!("realtime channel {topic} rejected: {reason}"),
            Inbound::Ignored => {}
        }
    }
}

/// [`ChangeFeedClient`] backed by the realtime websocket.
#[cfg(feature = "hydrate")]
pub struct RealtimeClient {
    inner: Rc<RealtimeInner>,
}

#[cfg(feature = "hydrate")]
impl RealtimeClient {
    pub fn new(backend: Rc<BackendClient>) -> Self {
        let url = socket_url(&backend.env().project_url, &backend.env().anon_key);
        Self {
            inner: Rc::new(RealtimeInner {
                url,
                backend,
                topics: RefCell::default(),
                outbox: RefCell::default(),
                next_ref: Cell::new(0),
                generation: Cell::new(0),
            }),
        }
    }

    fn ensure_connected(&self) -> Result<(), FeedError> {
        if self.inner.outbox.borrow().as_ref().is_some_and(|tx| !tx.is_closed()) {
            return Ok(());
        }
        let ws = gloo_net::websocket::futures::WebSocket::open(&self.inner.url)
            .map_err(|e| FeedError::Connect(e.to_string()))?;
        let (tx, rx) = mpsc::unbounded::<String>();
        *self.inner.outbox.borrow_mut() = Some(tx);
        let generation = self.inner.generation.get() + 1;
        self.inner.generation.set(generation);

        let weak = Rc::downgrade(&self.inner);
        leptos::task::spawn_local(socket_loop(weak.clone(), generation, ws, rx));
        leptos::task::spawn_local(heartbeat_loop(weak, generation));
        Ok(())
    }
}

#[cfg(feature = "hydrate")]
impl ChangeFeedClient for RealtimeClient {
    fn subscribe(&self, collection: Collection, on_event: ChangeCallback) -> Result<Unsubscribe, FeedError> {
        self.ensure_connected()?;
        self.inner.topics.borrow_mut().insert(collection, on_event);
        self.inner.join(collection);

        let weak = Rc::downgrade(&self.inner);
        Ok(Unsubscribe::new(move || {
            let Some(inner) = weak.upgrade() else {
                return;
            };
            inner.topics.borrow_mut().remove(&collection);
            inner.send(leave_message(collection, inner.next_ref()));
            if inner.topics.borrow().is_empty() {
                // Queued frames still flush before the socket task sees the end.
                inner.outbox.borrow_mut().take();
            }
        }))
    }
}

/// Run the socket until no topic wants it or a newer socket replaces it,
/// reconnecting with backoff.
#[cfg(feature = "hydrate")]
async fn socket_loop(
    weak: Weak<RealtimeInner>,
    generation: u64,
    ws: gloo_net::websocket::futures::WebSocket,
    mut rx: mpsc::UnboundedReceiver<String>,
) {
    let mut socket = Some(ws);
    let mut backoff_ms = MIN_BACKOFF_MS;

    loop {
        if let Some(ws) = socket.take() {
            pump(&weak, ws, &mut rx).await;
        }

        {
            let Some(inner) = weak.upgrade() else {
                return;
            };
            if !inner.wanted(generation) {
                return;
            }
        }

        gloo_timers::future::sleep(std::time::Duration::from_millis(u64::from(backoff_ms))).await;
        backoff_ms = (backoff_ms * 2).min(MAX_BACKOFF_MS);

        let Some(inner) = weak.upgrade() else {
            return;
        };
        if !inner.wanted(generation) {
            return;
        }
        match gloo_net::websocket::futures::WebSocket::open(&inner.url) {
            Ok(ws) => {
                // Frames queued while offline are superseded by the rejoin.
                while let Ok(Some(_)) = rx.try_next() {}
                let live: Vec<Collection> = inner.topics.borrow().keys().copied().collect();
                for collection in live {
                    inner.join(collection);
                }
                log::info!("realtime socket reconnected");
                backoff_ms = MIN_BACKOFF_MS;
                socket = Some(ws);
            }
            Err(e) => log::warn!("realtime reconnect failed: {e}"),
        }
    }
}

/// Move frames between the outbox and the socket until either side ends.
#[cfg(feature = "hydrate")]
async fn pump(
    weak: &Weak<RealtimeInner>,
    ws: gloo_net::websocket::futures::WebSocket,
    rx: &mut mpsc::UnboundedReceiver<String>,
) {
    use futures::{SinkExt, StreamExt};
    use gloo_net::websocket::Message;

    let (mut write, mut read) = ws.split();

    let send_task = async {
        while let Some(text) = rx.next().await {
            if write.send(Message::Text(text)).await.is_err() {
                break;
            }
        }
    };

    let recv_task = async {
        while let Some(msg) = read.next().await {
            match msg {
                Ok(Message::Text(text)) => {
                    let Some(inner) = weak.upgrade() else {
                        break;
                    };
                    inner.dispatch(&text);
                }
                Ok(Message::Bytes(_)) => {}
                Err(e) => {
                    log::warn!("realtime socket error: {e}");
                    break;
                }
            }
        }
    };

    futures::future::select(Box::pin(send_task), Box::pin(recv_task)).await;
}

#[cfg(feature = "hydrate")]
async fn heartbeat_loop(weak: Weak<RealtimeInner>, generation: u64) {
    loop {
        gloo_timers::future::sleep(std::time::Duration::from_millis(u64::from(HEARTBEAT_MS))).await;
        let Some(inner) = weak.upgrade() else {
            return;
        };
        if !inner.wanted(generation) {
            return;
        }
        inner.send(heartbeat_message(inner.next_ref()));
    }
}
