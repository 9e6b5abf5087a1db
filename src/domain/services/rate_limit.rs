#[cfg(test)]
#[path = "rate_limit_test.rs"]
mod tests;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::sync::mpsc;
use tokio::time;

use crate::domain::models::BackendBox;
use crate::domain::models::Event;

/// Periodically asks the server how many requests the user has left. Failed
/// polls are logged and skipped; the poller only stops once the UI is gone.
pub struct RateLimitPoller {
    backend: Arc<BackendBox>,
    interval: Duration,
}

impl RateLimitPoller {
    pub fn new(backend: Arc<BackendBox>, interval: Duration) -> RateLimitPoller {
        return RateLimitPoller { backend, interval };
    }

    pub async fn start(&self, tx: mpsc::UnboundedSender<Event>) -> Result<()> {
        let mut interval = time::interval(self.interval.max(Duration::from_millis(1)));
        interval.set_missed_tick_behavior(time::MissedTickBehavior::Delay);
        // The first tick completes immediately.
        interval.tick().await;

        loop {
            interval.tick().await;
            if tx.is_closed() {
                return Ok(());
            }

            match self.backend.requests_remaining().await {
                Ok(remaining) => {
                    tracing::debug!(remaining, "Polled requests remaining");
                    if tx.send(Event::RequestsRemaining(remaining)).is_err() {
                        return Ok(());
                    }
                }
                Err(err) => {
                    tracing::warn!(error = ?err, "Failed to poll requests remaining");
                }
            }
        }
    }
}
