//! External collaborator clients

pub mod auth_client;
pub mod catalog_client;
pub mod chart_client;

use std::time::{Duration, Instant};

use tokio::sync::Mutex;

/// Spaces outbound requests at a minimum interval.
///
/// Shared by the catalog and chart clients so neither hammers its
/// upstream when a batch fans out.
pub(crate) struct RateLimiter {
    last_request: Mutex<Option<Instant>>,
    min_interval: Duration,
}

impl RateLimiter {
    pub(crate) fn new(min_interval_ms: u64) -> Self {
        Self {
            last_request: Mutex::new(None),
            min_interval: Duration::from_millis(min_interval_ms),
        }
    }

    /// Wait if necessary to comply with the interval
    pub(crate) async fn wait(&self) {
        let mut last = self.last_request.lock().await;

        if let Some(last_time) = *last {
            let elapsed = last_time.elapsed();
            if elapsed < self.min_interval {
                tokio::time::sleep(self.min_interval - elapsed).await;
            }
        }

        *last = Some(Instant::now());
    }
}
