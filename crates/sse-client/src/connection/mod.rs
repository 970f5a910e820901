//! Connection manager for the notification push stream.
//!
//! Holds at most one live stream. Every `connect()` replaces whatever handle
//! is currently held and arms a heartbeat reconnect; transport failures tear
//! the handle down and arm a fixed-delay retry. Timers are never cancelled
//! individually: each one re-reads the current state when it fires.

mod reader;

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use url::Url;

use crate::decoder::SseEvent;
use crate::transport::StreamConnector;
use crate::StreamError;

/// Fixed endpoint path, resolved against the configured origin.
pub const STREAM_PATH: &str = "/sse";
/// Event name carrying `sender:body` payloads.
pub const NOTIFY_EVENT: &str = "notify";

const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);
const RETRY_DELAY: Duration = Duration::from_secs(1);

/// Lifecycle state of the single logical connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

/// Reconnect intervals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectTiming {
    /// Forced reconnect after every `connect()`, error or not.
    pub heartbeat: Duration,
    /// Delay before reconnecting after a transport failure.
    pub retry: Duration,
}

impl Default for ReconnectTiming {
    fn default() -> Self {
        Self {
            heartbeat: HEARTBEAT_INTERVAL,
            retry: RETRY_DELAY,
        }
    }
}

/// Diagnostic counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConnectionStats {
    pub opened: u64,
    pub errors: u64,
    pub retries_scheduled: u64,
    pub heartbeats_scheduled: u64,
}

/// Receives events of one name from the live stream.
pub trait EventHandler: Send + Sync + 'static {
    fn handle(&self, event: &SseEvent);
}

impl<F> EventHandler for F
where
    F: Fn(&SseEvent) + Send + Sync + 'static,
{
    fn handle(&self, event: &SseEvent) {
        self(event)
    }
}

struct ConnectionHandle {
    generation: u64,
    state: ConnectionState,
    cancel: CancellationToken,
}

impl ConnectionHandle {
    fn close(self) {
        self.cancel.cancel();
    }
}

#[derive(Default)]
struct Slot {
    handle: Option<ConnectionHandle>,
    generation: u64,
    stats: ConnectionStats,
}

enum Wakeup {
    Heartbeat { generation: u64 },
    Retry,
}

/// Owns the push connection. Cheap to clone; clones share one connection.
#[derive(Clone)]
pub struct ConnectionManager {
    inner: Arc<Inner>,
}

struct Inner {
    endpoint: Url,
    connector: Arc<dyn StreamConnector>,
    handlers: HashMap<String, Arc<dyn EventHandler>>,
    timing: ReconnectTiming,
    slot: Mutex<Slot>,
    shutdown: CancellationToken,
}

pub struct ConnectionManagerBuilder {
    origin: Url,
    connector: Arc<dyn StreamConnector>,
    handlers: HashMap<String, Arc<dyn EventHandler>>,
    timing: ReconnectTiming,
}

impl ConnectionManagerBuilder {
    /// Register the handler for events named `event`. Later registrations win.
    pub fn on(mut self, event: impl Into<String>, handler: impl EventHandler) -> Self {
        self.handlers.insert(event.into(), Arc::new(handler));
        self
    }

    pub fn timing(mut self, timing: ReconnectTiming) -> Self {
        self.timing = timing;
        self
    }

    pub fn build(self) -> Result<ConnectionManager, StreamError> {
        let endpoint = self.origin.join(STREAM_PATH)?;
        Ok(ConnectionManager {
            inner: Arc::new(Inner {
                endpoint,
                connector: self.connector,
                handlers: self.handlers,
                timing: self.timing,
                slot: Mutex::new(Slot::default()),
                shutdown: CancellationToken::new(),
            }),
        })
    }
}

impl ConnectionManager {
    pub fn builder(origin: Url, connector: impl StreamConnector) -> ConnectionManagerBuilder {
        ConnectionManagerBuilder {
            origin,
            connector: Arc::new(connector),
            handlers: HashMap::new(),
            timing: ReconnectTiming::default(),
        }
    }

    pub fn endpoint(&self) -> &Url {
        &self.inner.endpoint
    }

    /// Capability check, then the first `connect()`.
    ///
    /// Returns `StreamError::Unsupported` without touching the network when
    /// the connector cannot serve the endpoint.
    pub fn start(&self) -> Result<(), StreamError> {
        if !self.inner.connector.supports(&self.inner.endpoint) {
            tracing::warn!(endpoint = %self.inner.endpoint, "Push connections unsupported, not connecting");
            return Err(StreamError::Unsupported(self.inner.endpoint.to_string()));
        }
        self.connect();
        Ok(())
    }

    /// Replace the current connection (if any) with a fresh one and arm the
    /// heartbeat. Safe to call at any time; must run inside a tokio runtime.
    pub fn connect(&self) {
        if self.inner.shutdown.is_cancelled() {
            tracing::debug!("Ignoring connect after shutdown");
            return;
        }

        let generation = {
            let mut slot = self.lock_slot();
            if let Some(previous) = slot.handle.take() {
                tracing::debug!(generation = previous.generation, "Closing previous stream connection");
                previous.close();
            }

            slot.generation += 1;
            let generation = slot.generation;
            let cancel = self.inner.shutdown.child_token();
            slot.handle = Some(ConnectionHandle {
                generation,
                state: ConnectionState::Connecting,
                cancel: cancel.clone(),
            });
            slot.stats.opened += 1;
            slot.stats.heartbeats_scheduled += 1;

            tokio::spawn(self.clone().read_stream(generation, cancel));
            generation
        };

        tracing::info!(endpoint = %self.inner.endpoint, generation, "Connecting to event stream");
        self.schedule(Wakeup::Heartbeat { generation }, self.inner.timing.heartbeat);
    }

    pub fn state(&self) -> ConnectionState {
        self.lock_slot()
            .handle
            .as_ref()
            .map_or(ConnectionState::Disconnected, |h| h.state)
    }

    /// Whether a connection handle is currently held.
    pub fn is_connected(&self) -> bool {
        self.lock_slot().handle.is_some()
    }

    pub fn stats(&self) -> ConnectionStats {
        self.lock_slot().stats
    }

    /// Close the connection and disarm every pending timer. Further
    /// `connect()` calls are ignored.
    pub fn shutdown(&self) {
        self.inner.shutdown.cancel();
        if let Some(handle) = self.lock_slot().handle.take() {
            handle.close();
        }
        tracing::info!("Event stream connection shut down");
    }

    fn lock_slot(&self) -> MutexGuard<'_, Slot> {
        self.inner.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn schedule(&self, wakeup: Wakeup, delay: Duration) {
        let manager = Arc::downgrade(&self.inner);
        let shutdown = self.inner.shutdown.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = shutdown.cancelled() => {}
                _ = tokio::time::sleep(delay) => {
                    if let Some(inner) = manager.upgrade() {
                        ConnectionManager { inner }.wake(wakeup);
                    }
                }
            }
        });
    }

    fn wake(&self, wakeup: Wakeup) {
        match wakeup {
            Wakeup::Retry => {
                tracing::debug!("Retry timer fired");
                self.connect();
            }
            Wakeup::Heartbeat { generation } => {
                let current = self.lock_slot().generation;
                if current != generation {
                    // the newer connection armed its own heartbeat
                    tracing::debug!(generation, current, "Heartbeat superseded");
                    return;
                }
                tracing::info!(generation, "Heartbeat reconnect");
                self.connect();
            }
        }
    }

    /// Promote the handle to `Connected` if it is still the current one.
    fn mark_open(&self, generation: u64) -> bool {
        let mut slot = self.lock_slot();
        match slot.handle.as_mut() {
            Some(handle) if handle.generation == generation => {
                handle.state = ConnectionState::Connected;
                true
            }
            _ => false,
        }
    }

    /// Error handler: tear down the current handle and arm a retry.
    fn handle_failure(&self, generation: u64, error: StreamError) {
        {
            let mut slot = self.lock_slot();
            let is_current = slot
                .handle
                .as_ref()
                .is_some_and(|h| h.generation == generation);
            if !is_current {
                tracing::debug!(generation, error = %error, "Ignoring failure of a closed connection");
                return;
            }
            if let Some(handle) = slot.handle.take() {
                handle.close();
            }
            slot.stats.errors += 1;
            slot.stats.retries_scheduled += 1;
        }

        let retry = self.inner.timing.retry;
        tracing::warn!(
            error = %error, generation,
            retry_ms = retry.as_millis() as u64,
            "Event stream failed, will reconnect"
        );
        self.schedule(Wakeup::Retry, retry);
    }

    fn dispatch(&self, event: &SseEvent) {
        match self.inner.handlers.get(&event.event) {
            Some(handler) => {
                tracing::debug!(event = %event.event, "Dispatching stream event");
                handler.handle(event);
            }
            None => {
                tracing::trace!(event = %event.event, "No handler for stream event");
            }
        }
    }
}
