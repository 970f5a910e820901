use std::convert::Infallible;
use std::time::Duration;

use axum::http::StatusCode;
use axum::response::sse::{Event, Sse};
use axum::routing::get;
use axum::Router;
use futures_util::{stream, StreamExt};
use tokio::sync::mpsc;
use url::Url;

use sse_client::{
    ConnectionManager, ConnectionState, HttpConnector, SseEvent, StreamConnector, StreamError,
    NOTIFY_EVENT,
};

async fn notify_stream() -> Sse<impl futures_util::Stream<Item = Result<Event, Infallible>>> {
    Sse::new(stream::iter(vec![
        Ok(Event::default().event("notify").data("alice:hello world")),
        Ok(Event::default().comment("keepalive")),
        Ok(Event::default().data("unnamed")),
        Ok(Event::default().event("notify").data("bob:10:30:00 meeting")),
    ]))
}

async fn serve(router: Router) -> Url {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    Url::parse(&format!("http://{addr}")).unwrap()
}

#[tokio::test]
async fn http_connector_decodes_server_events() {
    let origin = serve(Router::new().route("/sse", get(notify_stream))).await;
    let connector = HttpConnector::new().unwrap();

    let mut events = connector.open(&origin.join("/sse").unwrap()).await.unwrap();
    let mut received = Vec::new();
    while let Some(event) = events.next().await {
        received.push(event.unwrap());
    }

    assert_eq!(
        received,
        vec![
            SseEvent::new("notify", "alice:hello world"),
            SseEvent::new("message", "unnamed"),
            SseEvent::new("notify", "bob:10:30:00 meeting"),
        ]
    );
}

#[tokio::test]
async fn http_connector_rejects_non_event_stream() {
    let router = Router::new().route("/sse", get(|| async { "plain text" }));
    let origin = serve(router).await;
    let connector = HttpConnector::new().unwrap();

    let result = connector.open(&origin.join("/sse").unwrap()).await;
    assert!(matches!(result, Err(StreamError::ContentType(ct)) if ct.starts_with("text/plain")));
}

#[tokio::test]
async fn http_connector_rejects_error_status() {
    let router = Router::new().route(
        "/sse",
        get(|| async { (StatusCode::SERVICE_UNAVAILABLE, "down") }),
    );
    let origin = serve(router).await;
    let connector = HttpConnector::new().unwrap();

    let result = connector.open(&origin.join("/sse").unwrap()).await;
    assert!(matches!(result, Err(StreamError::Status { status: 503 })));
}

#[tokio::test]
async fn manager_delivers_notify_events_and_reconnects() {
    let origin = serve(Router::new().route("/sse", get(notify_stream))).await;
    let (tx, mut rx) = mpsc::unbounded_channel();
    let manager = ConnectionManager::builder(origin, HttpConnector::new().unwrap())
        .on(NOTIFY_EVENT, move |event: &SseEvent| {
            let _ = tx.send(event.data.clone());
        })
        .build()
        .unwrap();

    manager.start().unwrap();

    // the server ends each stream after two notifications, so the second
    // pair only arrives through the retry path
    let mut payloads = Vec::new();
    while payloads.len() < 4 {
        let payload = tokio::time::timeout(Duration::from_secs(10), rx.recv())
            .await
            .unwrap()
            .unwrap();
        payloads.push(payload);
    }

    assert_eq!(
        payloads,
        vec![
            "alice:hello world",
            "bob:10:30:00 meeting",
            "alice:hello world",
            "bob:10:30:00 meeting",
        ]
    );
    assert!(manager.stats().errors >= 1);

    manager.shutdown();
    assert_eq!(manager.state(), ConnectionState::Disconnected);
}
