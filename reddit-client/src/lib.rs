pub mod api;
pub mod auth;
pub mod backoff;
pub mod rate_limiter;
pub mod stream;

#[cfg(test)]
mod tests;

pub use auth::{AuthState, RedditClient, RedditClientConfig, RedditToken};
pub use backoff::{BackoffConfig, PollBackoff};
pub use rate_limiter::{RateLimitConfig, RateLimiter};
pub use stream::CommentStream;
