//! Reconnection and transport options for a realtime connection.

use std::time::Duration;

use iterbene_shared::{RealtimeError, TransportKind};

/// Default number of retries after the first failed connect.
pub const DEFAULT_RECONNECTION_ATTEMPTS: u32 = 5;
pub const DEFAULT_RECONNECTION_DELAY: Duration = Duration::from_millis(1000);
pub const DEFAULT_RECONNECTION_DELAY_MAX: Duration = Duration::from_millis(5000);
pub const DEFAULT_BACKOFF_MULTIPLIER: f64 = 2.0;
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(20);

/// Options recognized by [`RealtimeClient::initialize`](super::RealtimeClient::initialize).
#[derive(Debug, Clone, PartialEq)]
pub struct RealtimeOptions {
    /// Enable automatic reconnection
    pub reconnection: bool,
    /// Retries after the first failed attempt (0 = give up immediately)
    pub reconnection_attempts: u32,
    /// Delay before the first retry
    pub reconnection_delay: Duration,
    /// Backoff ceiling
    pub reconnection_delay_max: Duration,
    /// Growth factor applied per retry
    pub backoff_multiplier: f64,
    /// Per-transport connect timeout
    pub timeout: Duration,
    /// Transport preference order
    pub transports: Vec<TransportKind>,
}

impl Default for RealtimeOptions {
    fn default() -> Self {
        Self {
            reconnection: true,
            reconnection_attempts: DEFAULT_RECONNECTION_ATTEMPTS,
            reconnection_delay: DEFAULT_RECONNECTION_DELAY,
            reconnection_delay_max: DEFAULT_RECONNECTION_DELAY_MAX,
            backoff_multiplier: DEFAULT_BACKOFF_MULTIPLIER,
            timeout: DEFAULT_CONNECT_TIMEOUT,
            transports: vec![TransportKind::WebSocket, TransportKind::Polling],
        }
    }
}

impl RealtimeOptions {
    /// Delay before retry number `attempt` (0-based).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let base = self.reconnection_delay.as_secs_f64();
        let max = self.reconnection_delay_max.as_secs_f64();
        let delay = base * self.backoff_multiplier.max(1.0).powi(attempt.min(64) as i32);
        Duration::from_secs_f64(delay.min(max).max(0.0))
    }

    /// Whether another retry is allowed after `attempt` retries have run.
    pub fn should_retry(&self, attempt: u32) -> bool {
        self.reconnection && attempt < self.reconnection_attempts
    }

    pub fn validate(&self) -> Result<(), RealtimeError> {
        if self.transports.is_empty() {
            return Err(RealtimeError::InvalidOptions(
                "at least one transport is required".to_string(),
            ));
        }
        if !self.backoff_multiplier.is_finite() {
            return Err(RealtimeError::InvalidOptions(
                "backoff multiplier must be finite".to_string(),
            ));
        }
        if self.timeout.is_zero() {
            return Err(RealtimeError::InvalidOptions(
                "connect timeout must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_grows_until_ceiling() {
        let opts = RealtimeOptions::default();
        assert_eq!(opts.delay_for_attempt(0), Duration::from_secs(1));
        assert_eq!(opts.delay_for_attempt(1), Duration::from_secs(2));
        assert_eq!(opts.delay_for_attempt(2), Duration::from_secs(4));
        assert_eq!(opts.delay_for_attempt(3), Duration::from_secs(5));
        assert_eq!(opts.delay_for_attempt(200), Duration::from_secs(5));
    }

    #[test]
    fn retry_budget() {
        let mut opts = RealtimeOptions {
            reconnection_attempts: 2,
            ..Default::default()
        };
        assert!(opts.should_retry(0));
        assert!(opts.should_retry(1));
        assert!(!opts.should_retry(2));

        opts.reconnection = false;
        assert!(!opts.should_retry(0));
    }

    #[test]
    fn rejects_empty_transport_list() {
        let opts = RealtimeOptions {
            transports: vec![],
            ..Default::default()
        };
        assert!(matches!(
            opts.validate(),
            Err(RealtimeError::InvalidOptions(_))
        ));
        assert!(RealtimeOptions::default().validate().is_ok());
    }
}
