//! Push-connection transport: the runtime primitive behind each stream.

use std::collections::VecDeque;
use std::pin::Pin;
use std::time::Duration;

use futures_util::future::BoxFuture;
use futures_util::stream::{self, Stream, StreamExt};
use reqwest::header::{ACCEPT, CACHE_CONTROL, CONTENT_TYPE};
use url::Url;

use crate::decoder::{EventDecoder, SseEvent};
use crate::StreamError;

const EVENT_STREAM_MIME: &str = "text/event-stream";
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Decoded events of one open connection. Dropping it closes the connection.
pub type EventStream = Pin<Box<dyn Stream<Item = Result<SseEvent, StreamError>> + Send>>;

/// Opens push connections.
pub trait StreamConnector: Send + Sync + 'static {
    /// Capability check: whether this connector can serve `url` at all.
    fn supports(&self, url: &Url) -> bool {
        matches!(url.scheme(), "http" | "https")
    }

    /// Open a connection. Resolves once the server accepted the stream.
    fn open(&self, url: &Url) -> BoxFuture<'static, Result<EventStream, StreamError>>;
}

impl<C: StreamConnector + ?Sized> StreamConnector for std::sync::Arc<C> {
    fn supports(&self, url: &Url) -> bool {
        (**self).supports(url)
    }

    fn open(&self, url: &Url) -> BoxFuture<'static, Result<EventStream, StreamError>> {
        (**self).open(url)
    }
}

/// `text/event-stream` over HTTP(S) using reqwest streaming bodies.
#[derive(Debug, Clone)]
pub struct HttpConnector {
    http: reqwest::Client,
}

impl HttpConnector {
    pub fn new() -> Result<Self, StreamError> {
        let http = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()?;
        Ok(Self { http })
    }

    /// Use an existing client (shared pool, custom TLS, proxies).
    pub fn with_client(http: reqwest::Client) -> Self {
        Self { http }
    }
}

impl StreamConnector for HttpConnector {
    fn open(&self, url: &Url) -> BoxFuture<'static, Result<EventStream, StreamError>> {
        let request = self
            .http
            .get(url.clone())
            .header(ACCEPT, EVENT_STREAM_MIME)
            .header(CACHE_CONTROL, "no-cache");

        Box::pin(async move {
            let resp = request.send().await?;
            let status = resp.status();
            if !status.is_success() {
                return Err(StreamError::Status {
                    status: status.as_u16(),
                });
            }

            let content_type = resp
                .headers()
                .get(CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default()
                .to_string();
            if !is_event_stream(&content_type) {
                return Err(StreamError::ContentType(content_type));
            }

            Ok(decode_body(resp.bytes_stream()))
        })
    }
}

fn is_event_stream(content_type: &str) -> bool {
    content_type
        .split(';')
        .next()
        .map(str::trim)
        .is_some_and(|mime| mime.eq_ignore_ascii_case(EVENT_STREAM_MIME))
}

/// Turn a chunked body into a stream of decoded events.
pub(crate) fn decode_body<S, B, E>(body: S) -> EventStream
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: Into<StreamError> + Send + 'static,
{
    let state = (Box::pin(body), EventDecoder::new(), VecDeque::new());
    Box::pin(stream::unfold(
        state,
        |(mut body, mut decoder, mut ready)| async move {
            loop {
                if let Some(event) = ready.pop_front() {
                    return Some((Ok(event), (body, decoder, ready)));
                }
                match body.next().await {
                    Some(Ok(chunk)) => ready.extend(decoder.feed(chunk.as_ref())),
                    Some(Err(e)) => return Some((Err(e.into()), (body, decoder, ready))),
                    None => return None,
                }
            }
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_stream_content_type_detection() {
        assert!(is_event_stream("text/event-stream"));
        assert!(is_event_stream("text/event-stream; charset=utf-8"));
        assert!(is_event_stream("Text/Event-Stream"));
        assert!(!is_event_stream("text/html"));
        assert!(!is_event_stream(""));
    }

    #[test]
    fn default_capability_is_http_only() {
        let connector = HttpConnector::new().unwrap();
        assert!(connector.supports(&Url::parse("http://localhost/sse").unwrap()));
        assert!(connector.supports(&Url::parse("https://example.com/sse").unwrap()));
        assert!(!connector.supports(&Url::parse("ftp://example.com/sse").unwrap()));
        assert!(!connector.supports(&Url::parse("file:///tmp/sse").unwrap()));
    }

    #[tokio::test]
    async fn decode_body_yields_events_across_chunks() {
        let chunks: Vec<Result<&'static [u8], StreamError>> = vec![
            Ok(b"event: notify\ndata: al".as_slice()),
            Ok(b"ice:hi\n\nevent: notify\ndata: bob:yo\n\n".as_slice()),
        ];
        let mut events = decode_body(stream::iter(chunks));
        let first = events.next().await.unwrap().unwrap();
        let second = events.next().await.unwrap().unwrap();
        assert_eq!(first.data, "alice:hi");
        assert_eq!(second.data, "bob:yo");
        assert!(events.next().await.is_none());
    }

    #[tokio::test]
    async fn decode_body_surfaces_read_errors() {
        let chunks: Vec<Result<&'static [u8], StreamError>> =
            vec![Ok(b"data: partial".as_slice()), Err(StreamError::Closed)];
        let mut events = decode_body(stream::iter(chunks));
        assert!(matches!(
            events.next().await,
            Some(Err(StreamError::Closed))
        ));
    }
}
