//! Background task loops.

use std::time::Duration;

use sse_client::ConnectionManager;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

use crate::app::SharedState;

pub const STATS_LOG_INTERVAL: Duration = Duration::from_secs(60);

async fn sleep_or_cancel(token: &CancellationToken, duration: Duration) -> bool {
    tokio::select! {
        _ = token.cancelled() => true,
        _ = sleep(duration) => false,
    }
}

/// Periodically log connection counters until shutdown.
pub async fn stats_log_loop(state: SharedState, manager: ConnectionManager) {
    let shutdown_token = state.shutdown_token().clone();

    loop {
        if sleep_or_cancel(&shutdown_token, STATS_LOG_INTERVAL).await {
            tracing::info!("Connection stats loop stopped (shutdown)");
            return;
        }

        let stats = manager.stats();
        tracing::info!(
            state = ?manager.state(),
            opened = stats.opened,
            errors = stats.errors,
            retries = stats.retries_scheduled,
            heartbeats = stats.heartbeats_scheduled,
            "Connection stats"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn sleep_or_cancel_reports_cancellation() {
        let token = CancellationToken::new();
        assert!(!sleep_or_cancel(&token, Duration::from_millis(10)).await);

        token.cancel();
        assert!(sleep_or_cancel(&token, Duration::from_secs(3600)).await);
    }
}
