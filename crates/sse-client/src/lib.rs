//! Server-sent events client library.
//!
//! Provides a `text/event-stream` decoder, an HTTP transport, and a
//! connection manager that keeps exactly one live stream open with
//! heartbeat renewal and fixed-delay recovery.

pub mod connection;
pub mod decoder;
pub mod transport;

pub use connection::{
    ConnectionManager, ConnectionManagerBuilder, ConnectionState, ConnectionStats, EventHandler,
    ReconnectTiming, NOTIFY_EVENT, STREAM_PATH,
};
pub use decoder::{EventDecoder, SseEvent};
pub use transport::{EventStream, HttpConnector, StreamConnector};

/// Unified error type for the sse-client crate.
#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected response status {status}")]
    Status { status: u16 },

    #[error("Unexpected content type: {0}")]
    ContentType(String),

    #[error("Event stream closed by server")]
    Closed,

    #[error("Push connections are not supported for {0}")]
    Unsupported(String),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),
}
