use reqwest::header::HeaderMap;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{debug, warn};

const REMAINING_HEADER: &str = "x-ratelimit-remaining";
const RESET_HEADER: &str = "x-ratelimit-reset";
const MIN_WAIT: Duration = Duration::from_millis(1);

#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    pub max_requests: u32,
    pub time_window: Duration,
    pub burst_allowance: u32,
}

impl RateLimitConfig {
    pub fn reddit_oauth() -> Self {
        Self {
            max_requests: 100, // Reddit allows 100 requests per minute for OAuth2
            time_window: Duration::from_secs(60),
            burst_allowance: 10,
        }
    }
}

#[derive(Debug)]
pub struct TokenBucket {
    tokens: f64,
    capacity: f64,
    refill_rate: f64, // tokens per second
    last_refill: Instant,
}

impl TokenBucket {
    pub fn new(config: &RateLimitConfig, now: Instant) -> Self {
        let capacity = config.burst_allowance as f64;
        Self {
            tokens: capacity,
            capacity,
            refill_rate: config.max_requests as f64 / config.time_window.as_secs_f64(),
            last_refill: now,
        }
    }

    /// Takes one token, or returns how long until one is available.
    pub fn try_acquire(&mut self, now: Instant) -> Result<(), Duration> {
        let elapsed = now.saturating_duration_since(self.last_refill);
        self.tokens = (self.tokens + elapsed.as_secs_f64() * self.refill_rate).min(self.capacity);
        self.last_refill = now;

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            Ok(())
        } else {
            let wait = Duration::from_secs_f64((1.0 - self.tokens) / self.refill_rate);
            Err(wait.max(MIN_WAIT))
        }
    }

    pub fn available(&self) -> f64 {
        self.tokens
    }
}

/// Paces requests to the OAuth API.
///
/// A local token bucket keeps the steady rate under Reddit's quota, and the
/// `X-Ratelimit-*` headers of each response can hold further requests until
/// the server-side window resets.
#[derive(Debug)]
pub struct RateLimiter {
    bucket: TokenBucket,
    blocked_until: Option<Instant>,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            bucket: TokenBucket::new(&config, Instant::now()),
            blocked_until: None,
        }
    }

    pub async fn acquire_permit(&mut self) {
        while let Some(wait_time) = self.wait_time(Instant::now()) {
            debug!("Rate limit reached, waiting {:?}", wait_time);
            sleep(wait_time).await;
        }
    }

    /// `None` when a request may go out at `now` (and consumes the permit).
    pub fn wait_time(&mut self, now: Instant) -> Option<Duration> {
        if let Some(until) = self.blocked_until {
            if until > now {
                return Some(until - now);
            }
            self.blocked_until = None;
        }
        self.bucket.try_acquire(now).err()
    }

    /// Holds requests until the window resets once Reddit reports no quota left.
    pub fn observe(&mut self, headers: &HeaderMap, now: Instant) {
        let Some((remaining, reset)) = parse_rate_limit_headers(headers) else {
            return;
        };
        if remaining < 1.0 {
            warn!("Reddit request quota used up, pausing for {:?}", reset);
            self.blocked_until = Some(now + reset);
        }
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(RateLimitConfig::reddit_oauth())
    }
}

/// Remaining requests and time until the window resets.
pub fn parse_rate_limit_headers(headers: &HeaderMap) -> Option<(f64, Duration)> {
    let number = |name: &str| {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.trim().parse::<f64>().ok())
            .filter(|value| value.is_finite() && *value >= 0.0)
    };
    Some((number(REMAINING_HEADER)?, Duration::from_secs_f64(number(RESET_HEADER)?)))
}
