use sse_client::{
    ConnectionManager, HttpConnector, NOTIFY_EVENT, SseEvent, StreamConnector, StreamError,
};

use crate::app::SharedState;
use crate::config::AppConfig;
use crate::notification::{NotificationRenderer, UNSUPPORTED_MESSAGE};

/// Running feed: the push connection (absent when unsupported) and the
/// renderer it feeds.
pub struct Feed {
    pub manager: Option<ConnectionManager>,
    pub renderer: NotificationRenderer,
}

/// Load .env from multiple candidate paths.
pub fn load_dotenv() {
    let candidates = [".env", "../.env", "../../.env"];
    for path in &candidates {
        if dotenvy::from_filename(path).is_ok() {
            tracing::info!("Loaded .env from: {path}");
            return;
        }
    }
    tracing::info!("No .env file found, using system environment variables");
}

/// Load .env and configuration (fatal on error).
pub fn init_foundation() -> Result<AppConfig, anyhow::Error> {
    load_dotenv();
    let config = AppConfig::load()?;
    tracing::info!(origin = %config.origin, output = ?config.output, "Settings loaded");
    Ok(config)
}

/// Wire the renderer to `connector` and start connecting.
///
/// When push connections are unsupported the unsupported message is shown
/// once and no connection is ever attempted.
pub fn start_feed(
    state: &SharedState,
    connector: impl StreamConnector,
) -> Result<Feed, anyhow::Error> {
    let renderer = NotificationRenderer::new(state.display());

    let handler = renderer.clone();
    let manager = ConnectionManager::builder(state.config().origin.clone(), connector)
        .on(NOTIFY_EVENT, move |event: &SseEvent| {
            handler.render(&event.data);
        })
        .build()?;

    match manager.start() {
        Ok(()) => {
            tracing::info!(endpoint = %manager.endpoint(), "Notification feed started");
            Ok(Feed {
                manager: Some(manager),
                renderer,
            })
        }
        Err(StreamError::Unsupported(endpoint)) => {
            show_unsupported(state, &endpoint);
            Ok(Feed {
                manager: None,
                renderer,
            })
        }
        Err(e) => Err(e.into()),
    }
}

/// Start the feed over HTTP. A client that cannot be built counts as
/// missing capability.
pub fn start_http_feed(state: &SharedState) -> Result<Feed, anyhow::Error> {
    match HttpConnector::new() {
        Ok(connector) => start_feed(state, connector),
        Err(e) => {
            tracing::error!("Failed to build HTTP client: {e}");
            show_unsupported(state, state.config().origin.as_str());
            Ok(Feed {
                manager: None,
                renderer: NotificationRenderer::new(state.display()),
            })
        }
    }
}

fn show_unsupported(state: &SharedState, endpoint: &str) {
    tracing::warn!(endpoint, "Push connections unsupported, showing fallback message");
    state.result_surface().show_result(UNSUPPORTED_MESSAGE);
}
