//! A fetcher that pretends to download images.

use core::time::Duration;

use picload_resource::{FetchCompletion, ImageFetcher, LoadFailure};

/// Completes each fetch from a tokio task after a delay derived from the URI.
///
/// URIs containing `missing` fail with "not found", URIs containing `broken`
/// fail with "decode error". Everything else loads.
#[derive(Debug, Clone)]
pub struct SimulatedFetcher {
    max_delay: Duration,
}

impl SimulatedFetcher {
    /// Creates a fetcher whose delays stay below `max_delay`.
    #[must_use]
    pub fn new(max_delay: Duration) -> Self {
        Self { max_delay }
    }

    /// Deterministic per-URI delay.
    fn delay_for(&self, uri: &str) -> Duration {
        let max_ms = u64::try_from(self.max_delay.as_millis()).unwrap_or(u64::MAX).max(1);
        let spread = uri
            .bytes()
            .fold(0u64, |acc, b| acc.wrapping_mul(31).wrapping_add(u64::from(b)));
        Duration::from_millis(spread % max_ms)
    }
}

impl Default for SimulatedFetcher {
    fn default() -> Self {
        Self::new(Duration::from_millis(250))
    }
}

impl ImageFetcher for SimulatedFetcher {
    fn fetch(&self, uri: &str, done: FetchCompletion) {
        let delay = self.delay_for(uri);
        let failure = if uri.contains("missing") {
            Some("not found")
        } else if uri.contains("broken") {
            Some("decode error")
        } else {
            None
        };

        tracing::debug!(uri, ?delay, "simulated fetch");
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            match failure {
                Some(message) => {
                    let uri = done.uri().to_string();
                    done.fail(LoadFailure::new(message).with_uri(uri));
                }
                None => done.succeed(),
            }
        });
    }
}
