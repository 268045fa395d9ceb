//! Exponential backoff between polls of an empty queue.

use std::time::Duration;

/// Tunable parameters for the polling backoff.
#[derive(Debug, Clone)]
pub struct PollConfig {
    /// Delay after the first empty poll, and after every dispatched job.
    pub initial_delay: Duration,
    /// Upper bound on the delay between polls.
    pub max_delay: Duration,
    /// Factor by which the delay grows after each empty poll.
    pub multiplier: f64,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(60),
            multiplier: 2.0,
        }
    }
}

impl PollConfig {
    /// Default backoff capped at `max_secs` (at least one second).
    pub fn with_max_secs(max_secs: u64) -> Self {
        Self {
            max_delay: Duration::from_secs(max_secs.max(1)),
            ..Default::default()
        }
    }
}

/// Calculate the next polling delay from the current delay and config.
///
/// The result is clamped to [`PollConfig::max_delay`].
pub fn next_delay(current: Duration, config: &PollConfig) -> Duration {
    let next_ms = (current.as_millis() as f64 * config.multiplier) as u64;
    Duration::from_millis(next_ms).min(config.max_delay)
}
