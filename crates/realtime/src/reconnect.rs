//! Reconnection policy for the notification channel.
//!
//! The connection task keeps retrying for as long as the manager lives.
//! Failed handshakes and transport drops wait an exponentially growing
//! delay; a server-initiated close is retried immediately once, because
//! nothing else would bring the channel back.

use std::time::Duration;

use crate::events::DisconnectReason;

/// Tunable parameters for the exponential-backoff strategy.
#[derive(Debug, Clone)]
pub struct ReconnectConfig {
    /// Delay before the first reconnection attempt.
    pub initial_delay: Duration,
    /// Upper bound on the delay between attempts.
    pub max_delay: Duration,
    /// Factor by which the delay grows after each failure.
    pub multiplier: f64,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(5),
            multiplier: 2.0,
        }
    }
}

/// Calculate the next backoff delay from the current delay and config.
///
/// The result is clamped to [`ReconnectConfig::max_delay`].
pub fn next_delay(current: Duration, config: &ReconnectConfig) -> Duration {
    let next_ms = (current.as_millis() as f64 * config.multiplier) as u64;
    Duration::from_millis(next_ms).min(config.max_delay)
}

/// Running backoff state for one connection task.
#[derive(Debug, Clone)]
pub struct Backoff {
    config: ReconnectConfig,
    current: Duration,
    attempts: u32,
}

impl Backoff {
    pub fn new(config: ReconnectConfig) -> Self {
        let current = config.initial_delay.min(config.max_delay);
        Self {
            config,
            current,
            attempts: 0,
        }
    }

    pub fn config(&self) -> &ReconnectConfig {
        &self.config
    }

    /// Attempts made since the last [`reset`](Self::reset).
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn is_fresh(&self) -> bool {
        self.attempts == 0
    }

    /// The delay to wait now; grows the delay for next time.
    pub fn next(&mut self) -> Duration {
        let delay = self.current;
        self.current = next_delay(self.current, &self.config);
        self.attempts += 1;
        delay
    }

    /// Retry without waiting. Still counts as an attempt, so a server
    /// that keeps closing the socket falls back to the normal delays.
    pub fn immediate(&mut self) -> Duration {
        self.attempts += 1;
        Duration::ZERO
    }

    pub fn reset(&mut self) {
        self.current = self.config.initial_delay.min(self.config.max_delay);
        self.attempts = 0;
    }
}

/// How long to wait before reconnecting after a session ended with
/// `reason`. `None` means do not reconnect.
///
/// ```text
/// Disconnected(ServerInitiated) -> Connecting   (no delay, first time)
/// Disconnected(Transport)       -> Connecting   (after backoff delay)
/// Disconnected(ClientInitiated) -> Idle
/// ```
pub fn delay_after(reason: DisconnectReason, backoff: &mut Backoff) -> Option<Duration> {
    match reason {
        DisconnectReason::ClientInitiated => None,
        DisconnectReason::ServerInitiated if backoff.is_fresh() => Some(backoff.immediate()),
        DisconnectReason::ServerInitiated | DisconnectReason::Transport => Some(backoff.next()),
    }
}
