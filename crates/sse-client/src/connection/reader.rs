use futures_util::StreamExt;

use super::*;

impl ConnectionManager {
    /// Reader task of one connection generation. Ends when the handle is
    /// closed or the transport fails.
    pub(super) async fn read_stream(self, generation: u64, cancel: CancellationToken) {
        let opened = tokio::select! {
            biased;
            _ = cancel.cancelled() => return,
            result = self.inner.connector.open(&self.inner.endpoint) => result,
        };

        let mut events = match opened {
            Ok(events) => events,
            Err(e) => {
                self.handle_failure(generation, e);
                return;
            }
        };

        if self.mark_open(generation) {
            tracing::info!(endpoint = %self.inner.endpoint, generation, "Connected to event stream");
        }

        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    tracing::debug!(generation, "Stream connection closed");
                    return;
                }
                next = events.next() => next,
            };

            match next {
                Some(Ok(event)) => {
                    if cancel.is_cancelled() {
                        return;
                    }
                    self.dispatch(&event);
                }
                Some(Err(e)) => {
                    self.handle_failure(generation, e);
                    return;
                }
                None => {
                    self.handle_failure(generation, StreamError::Closed);
                    return;
                }
            }
        }
    }
}
