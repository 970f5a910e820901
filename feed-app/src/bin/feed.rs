//! Console notification feed.
//!
//! Connects to the configured origin, renders notify events as bubbles on
//! stdout and keeps the connection alive until Ctrl+C. Logs go to stderr.

use tracing_subscriber::EnvFilter;

use bubble_feed_lib::app::SharedState;
use bubble_feed_lib::background;
use bubble_feed_lib::shutdown;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // Step 1: Tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("Starting bubble feed");

    // Step 2: Foundation
    let config = bubble_feed_lib::init_foundation()?;
    let state = SharedState::new(config);

    // Step 3: Capability check + first connect
    let feed = bubble_feed_lib::start_http_feed(&state)?;
    let Some(manager) = feed.manager.clone() else {
        tracing::info!("No push connection available, exiting");
        return Ok(());
    };

    // Step 4: Connection stats
    let s = state.clone();
    tokio::spawn(async move { background::stats_log_loop(s, manager).await });

    tracing::info!("Feed running. Press Ctrl+C to stop.");

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutting down...");

    shutdown::graceful_shutdown(&state, &feed).await;
    Ok(())
}
