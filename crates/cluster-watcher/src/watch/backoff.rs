use std::cmp;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffConfig {
    /// delay before the first retry
    pub initial: Duration,
    /// upper bound of any delay
    pub max: Duration,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            initial: Duration::from_millis(500),
            max: Duration::from_secs(60),
        }
    }
}

/// Exponential reconnect delay: doubles per consecutive failure, capped at `max`.
#[derive(Debug, Clone)]
pub struct Backoff {
    config: BackoffConfig,
    current: Duration,
}

impl Backoff {
    pub fn new(config: BackoffConfig) -> Self {
        Self {
            config,
            current: config.initial,
        }
    }

    /// Delay to wait after a failure; advances the sequence.
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.current;
        self.current = cmp::min(self.current.saturating_mul(2), self.config.max);
        delay
    }

    /// Restarts the sequence after an iteration that completed without error.
    pub fn reset(&mut self) {
        self.current = self.config.initial;
    }

    pub fn initial(&self) -> Duration {
        self.config.initial
    }
}
