use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::config::AppConfig;
use crate::notification::{ConsoleSurface, DisplaySurface, ResultSurface};

/// Application shared state handed to the feed, background loops and shutdown.
#[derive(Clone)]
pub struct SharedState {
    inner: Arc<SharedStateInner>,
}

struct SharedStateInner {
    config: AppConfig,
    /// Container receiving notification bubbles
    display: Arc<dyn DisplaySurface>,
    /// Slot for the one-time unsupported message
    result: Arc<dyn ResultSurface>,
    shutdown_token: CancellationToken,
}

impl SharedState {
    /// Shared state printing to stdout in the configured format.
    pub fn new(config: AppConfig) -> Self {
        let console = Arc::new(ConsoleSurface::stdout(config.output));
        Self::with_surface(config, console)
    }

    /// Shared state rendering into `surface`.
    pub fn with_surface<S>(config: AppConfig, surface: Arc<S>) -> Self
    where
        S: DisplaySurface + ResultSurface,
    {
        Self {
            inner: Arc::new(SharedStateInner {
                config,
                display: surface.clone(),
                result: surface,
                shutdown_token: CancellationToken::new(),
            }),
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.inner.config
    }

    pub fn display(&self) -> Arc<dyn DisplaySurface> {
        self.inner.display.clone()
    }

    pub fn result_surface(&self) -> &Arc<dyn ResultSurface> {
        &self.inner.result
    }

    pub fn shutdown_token(&self) -> &CancellationToken {
        &self.inner.shutdown_token
    }
}
