use std::time::Duration;

use tokio::time::sleep;

use crate::app::SharedState;
use crate::bootstrap::Feed;

pub async fn graceful_shutdown(state: &SharedState, feed: &Feed) {
    tracing::info!("Shutdown sequence started");

    state.shutdown_token().cancel();
    tracing::info!("Shutdown: background loops cancelled");

    if let Some(manager) = &feed.manager {
        manager.shutdown();
        tracing::info!("Shutdown: event stream closed");
    }

    let cancelled = feed.renderer.fader().cancel_all();
    tracing::info!(cancelled, "Shutdown: pending fades cancelled");

    sleep(Duration::from_millis(200)).await;
    tracing::info!("Shutdown sequence completed");
}
