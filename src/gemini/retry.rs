use std::time::Duration;

pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Bounded exponential backoff for transport failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts per call, including the first one.
    pub max_retries: u32,
    /// Delay before the second attempt; doubles for each attempt after that.
    pub backoff_unit: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            backoff_unit: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Self::default()
        }
    }

    pub fn with_backoff_unit(mut self, unit: Duration) -> Self {
        self.backoff_unit = unit;
        self
    }

    /// Attempts actually made; zero is treated as a single attempt.
    pub fn attempts(&self) -> u32 {
        self.max_retries.max(1)
    }

    /// Waits between consecutive attempts: `unit * 2^attempt`, no jitter.
    pub fn delays(&self) -> impl Iterator<Item = Duration> {
        let unit = self.backoff_unit;
        (0..self.attempts() - 1).map(move |attempt| {
            unit.saturating_mul(2u32.checked_pow(attempt).unwrap_or(u32::MAX))
        })
    }
}
