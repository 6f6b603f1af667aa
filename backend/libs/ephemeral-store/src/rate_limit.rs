//! Sliding-window rate limiting.

use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, warn};

/// In-memory sliding-window rate limiter.
///
/// Each key holds the timestamps of its calls within the trailing window.
/// After a successful [`allow`](RateLimiter::allow) the pruned list never
/// holds more than `max_calls` entries, and keys whose windows drain are
/// dropped, so state stays bounded by recent traffic.
pub struct RateLimiter {
    windows: Mutex<HashMap<String, Vec<Instant>>>,
    bypass: bool,
}

impl RateLimiter {
    /// Create a limiter. With `bypass` set, `allow` admits every call
    /// without consulting or mutating state, so integration tests of
    /// upstream flows are not throttled. Tests of the limiter itself
    /// construct it with `bypass` off.
    pub fn new(bypass: bool) -> Self {
        if bypass {
            warn!("rate limiting disabled");
        }
        Self {
            windows: Mutex::new(HashMap::new()),
            bypass,
        }
    }

    /// Record a call under `key` if fewer than `max_calls` happened within
    /// the trailing `period`. Returns whether the call is admitted; a denied
    /// call is not recorded.
    pub async fn allow(&self, key: &str, max_calls: usize, period: Duration) -> bool {
        if self.bypass {
            return true;
        }

        let now = Instant::now();
        let mut windows = self.windows.lock().await;
        let calls = windows.entry(key.to_owned()).or_default();
        calls.retain(|t| now.duration_since(*t) < period);

        if calls.len() < max_calls {
            calls.push(now);
            return true;
        }

        let drained = calls.is_empty();
        if drained {
            // Only reachable with max_calls == 0; don't pin an empty window.
            windows.remove(key);
        }
        debug!(key = %key, max_calls, "rate limit window full");
        false
    }

    /// Clear the call history for one key, immediately re-permitting it.
    pub async fn reset(&self, key: &str) {
        self.windows.lock().await.remove(key);
    }

    /// Clear the entire store.
    pub async fn reset_all(&self) {
        self.windows.lock().await.clear();
    }
}
