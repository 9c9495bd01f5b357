use crate::error::*;
use tracing::error;

pub trait ErrorExt {
    fn log_error(&self) -> &Self;
    /// Whether the failure leaves the comment stream unusable.
    ///
    /// Failures that only concern a single comment (a rejected reply, a
    /// deleted thread, a ban from one subreddit) return `false` and are
    /// absorbed by the watcher; everything else ends the process so the
    /// supervisor can start over.
    fn threatens_stream(&self) -> bool;
    fn user_friendly_message(&self) -> String;
    fn error_code(&self) -> String;
}

impl ErrorExt for CoreError {
    fn log_error(&self) -> &Self {
        error!("{}", self);
        match self {
            CoreError::RedditApi(e) => {
                error!("Reddit API error details: {:?}", e);
            }
            CoreError::Config(e) => {
                error!("Configuration error details: {:?}", e);
            }
            _ => {}
        }
        self
    }

    fn threatens_stream(&self) -> bool {
        match self {
            CoreError::RedditApi(e) => e.threatens_stream(),
            CoreError::Config(e) => e.threatens_stream(),
            _ => true,
        }
    }

    fn user_friendly_message(&self) -> String {
        match self {
            CoreError::RedditApi(e) => e.user_friendly_message(),
            CoreError::Config(e) => e.user_friendly_message(),
            CoreError::Io(e) => format!("File system error: {}", e),
            CoreError::Network(_) => {
                "Network connection error. Please check your internet connection.".to_string()
            }
            CoreError::Url(e) => format!("Malformed URL: {}", e),
            _ => "An unexpected error occurred.".to_string(),
        }
    }

    fn error_code(&self) -> String {
        match self {
            CoreError::RedditApi(_) => "REDDIT_API".to_string(),
            CoreError::Config(_) => "CONFIG".to_string(),
            CoreError::Io(_) => "IO".to_string(),
            CoreError::Network(_) => "NETWORK".to_string(),
            CoreError::Url(_) => "URL".to_string(),
            CoreError::Internal { .. } => "INTERNAL".to_string(),
        }
    }
}

impl ErrorExt for RedditApiError {
    fn log_error(&self) -> &Self {
        error!("RedditApiError: {}", self);
        self
    }

    fn threatens_stream(&self) -> bool {
        !matches!(
            self,
            RedditApiError::ApiRejected { .. }
                | RedditApiError::RateLimitExceeded { .. }
                | RedditApiError::Forbidden { .. }
                | RedditApiError::ResourceNotFound { .. }
        )
    }

    fn user_friendly_message(&self) -> String {
        match self {
            RedditApiError::AuthenticationFailed { .. } => {
                "Reddit authentication failed. Please check the credentials in config.toml."
                    .to_string()
            }
            RedditApiError::RateLimitExceeded { retry_after } => format!(
                "Too many requests. Reddit asks to wait {} seconds.",
                retry_after
            ),
            RedditApiError::Forbidden { resource } => format!(
                "Access denied to {}. The account may be banned or the thread locked.",
                resource
            ),
            RedditApiError::ResourceNotFound { resource } => {
                format!("{} no longer exists.", resource)
            }
            RedditApiError::InvalidToken => {
                "Reddit authentication token is invalid or was revoked.".to_string()
            }
            RedditApiError::RequestTimeout => "Request to Reddit timed out.".to_string(),
            RedditApiError::ApiRejected { code, message } => {
                format!("Reddit refused the reply ({}): {}", code, message)
            }
            _ => "Reddit API error occurred.".to_string(),
        }
    }

    fn error_code(&self) -> String {
        match self {
            RedditApiError::AuthenticationFailed { .. } => "REDDIT_AUTH_FAILED".to_string(),
            RedditApiError::RateLimitExceeded { .. } => "REDDIT_RATE_LIMIT".to_string(),
            RedditApiError::Forbidden { .. } => "REDDIT_FORBIDDEN".to_string(),
            RedditApiError::ResourceNotFound { .. } => "REDDIT_NOT_FOUND".to_string(),
            RedditApiError::InvalidToken => "REDDIT_INVALID_TOKEN".to_string(),
            RedditApiError::RequestTimeout => "REDDIT_TIMEOUT".to_string(),
            RedditApiError::InvalidResponse { .. } => "REDDIT_INVALID_RESPONSE".to_string(),
            RedditApiError::ServerError { .. } => "REDDIT_SERVER_ERROR".to_string(),
            RedditApiError::ApiRejected { .. } => "REDDIT_API_REJECTED".to_string(),
        }
    }
}

impl ErrorExt for ConfigError {
    fn log_error(&self) -> &Self {
        error!("ConfigError: {}", self);
        self
    }

    fn threatens_stream(&self) -> bool {
        true
    }

    fn user_friendly_message(&self) -> String {
        match self {
            ConfigError::FileNotFound { path } => format!(
                "No configuration found. A default one was written to {}; fill it in and restart.",
                path
            ),
            ConfigError::InvalidEncoding { path } => {
                format!("{} is not a text file. It was replaced with a default.", path)
            }
            ConfigError::EmptyList { field } => {
                format!("'{}' needs at least one entry.", field)
            }
            ConfigError::BlankValue { field } => format!("'{}' must not be blank.", field),
            ConfigError::Parse(e) => format!("Invalid configuration: {}", e.message()),
            ConfigError::Serialize(_) => "Could not write the default configuration.".to_string(),
        }
    }

    fn error_code(&self) -> String {
        match self {
            ConfigError::FileNotFound { .. } => "CONFIG_FILE_NOT_FOUND".to_string(),
            ConfigError::InvalidEncoding { .. } => "CONFIG_INVALID_ENCODING".to_string(),
            ConfigError::EmptyList { .. } => "CONFIG_EMPTY_LIST".to_string(),
            ConfigError::BlankValue { .. } => "CONFIG_BLANK_VALUE".to_string(),
            ConfigError::Parse(_) => "CONFIG_PARSE_ERROR".to_string(),
            ConfigError::Serialize(_) => "CONFIG_SERIALIZE_ERROR".to_string(),
        }
    }
}
