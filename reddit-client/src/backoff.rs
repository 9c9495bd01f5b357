use std::time::Duration;

/// Configuration for the pause between empty polls of a listing
#[derive(Debug, Clone)]
pub struct BackoffConfig {
    /// Delay after the first empty poll (in milliseconds)
    pub base_delay_ms: u64,
    /// Upper bound for the delay (in milliseconds)
    pub max_delay_ms: u64,
    /// Multiplier applied after every empty poll
    pub backoff_multiplier: f64,
    /// Maximum jitter factor (0.0 to 1.0), applied in both directions
    pub jitter_factor: f64,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            base_delay_ms: 1000,
            max_delay_ms: 16000,
            backoff_multiplier: 2.0,
            jitter_factor: 1.0 / 16.0,
        }
    }
}

/// Exponential pause used while a stream has nothing new to hand out.
///
/// Every empty poll doubles the wait up to the cap; the first poll that finds
/// new items resets it.
#[derive(Debug)]
pub struct PollBackoff {
    config: BackoffConfig,
    attempt: u32,
}

impl PollBackoff {
    pub fn new(config: BackoffConfig) -> Self {
        Self { config, attempt: 0 }
    }

    pub fn next_delay(&mut self) -> Duration {
        let delay = calculate_delay(self.attempt, &self.config);
        self.attempt = self.attempt.saturating_add(1);
        delay
    }

    pub fn reset(&mut self) {
        self.attempt = 0;
    }

    pub fn attempt(&self) -> u32 {
        self.attempt
    }
}

impl Default for PollBackoff {
    fn default() -> Self {
        Self::new(BackoffConfig::default())
    }
}

/// Calculate delay with exponential backoff and symmetric jitter
pub fn calculate_delay(attempt: u32, config: &BackoffConfig) -> Duration {
    let exponential_ms = if attempt == 0 {
        config.base_delay_ms as f64
    } else {
        let multiplier = config.backoff_multiplier.powi(attempt.min(32) as i32);
        (config.base_delay_ms as f64 * multiplier).min(config.max_delay_ms as f64)
    };

    let jitter_range = exponential_ms * config.jitter_factor;
    let jitter = (fastrand::f64() * 2.0 - 1.0) * jitter_range;

    Duration::from_millis((exponential_ms + jitter).max(0.0) as u64)
}
