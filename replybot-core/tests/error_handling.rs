use replybot_core::{ConfigError, CoreError, ErrorExt, RedditApiError};

#[test]
fn test_error_codes() {
    let reddit_error = CoreError::RedditApi(RedditApiError::InvalidToken);
    assert_eq!(reddit_error.error_code(), "REDDIT_API");

    let config_error = CoreError::Config(ConfigError::EmptyList {
        field: "keywords".to_string(),
    });
    assert_eq!(config_error.error_code(), "CONFIG");

    let io_error = CoreError::Io(std::io::Error::new(
        std::io::ErrorKind::PermissionDenied,
        "config.toml",
    ));
    assert_eq!(io_error.error_code(), "IO");

    let rejected = RedditApiError::ApiRejected {
        code: "THREAD_LOCKED".to_string(),
        message: "that thread is locked".to_string(),
    };
    assert_eq!(rejected.error_code(), "REDDIT_API_REJECTED");
}

#[test]
fn test_reply_level_errors_do_not_threaten_stream() {
    let absorbed = [
        RedditApiError::ApiRejected {
            code: "RATELIMIT".to_string(),
            message: "you are doing that too much".to_string(),
        },
        RedditApiError::RateLimitExceeded { retry_after: 60 },
        RedditApiError::Forbidden {
            resource: "/api/comment".to_string(),
        },
        RedditApiError::ResourceNotFound {
            resource: "/api/comment".to_string(),
        },
    ];
    for error in absorbed {
        assert!(!error.threatens_stream(), "{error} should be absorbed");
        assert!(!CoreError::RedditApi(error).threatens_stream());
    }
}

#[test]
fn test_transport_errors_threaten_stream() {
    let fatal = [
        RedditApiError::InvalidToken,
        RedditApiError::RequestTimeout,
        RedditApiError::ServerError { status_code: 503 },
        RedditApiError::InvalidResponse {
            details: "truncated body".to_string(),
        },
        RedditApiError::AuthenticationFailed {
            reason: "invalid_grant".to_string(),
        },
    ];
    for error in fatal {
        assert!(CoreError::RedditApi(error).threatens_stream());
    }

    let internal = CoreError::Internal {
        message: "boom".to_string(),
    };
    assert!(internal.threatens_stream());
}

#[test]
fn test_user_friendly_messages() {
    let reddit_error = CoreError::RedditApi(RedditApiError::InvalidToken);
    let message = reddit_error.user_friendly_message();
    assert!(message.contains("invalid or was revoked"));

    let config_error = CoreError::Config(ConfigError::EmptyList {
        field: "phrases".to_string(),
    });
    let message = config_error.user_friendly_message();
    assert!(message.contains("phrases"));

    let missing = ConfigError::FileNotFound {
        path: "/opt/bot/config.toml".to_string(),
    };
    assert!(missing.user_friendly_message().contains("/opt/bot/config.toml"));
}

#[test]
fn test_conversions() {
    let error: CoreError = RedditApiError::RequestTimeout.into();
    assert!(matches!(
        error,
        CoreError::RedditApi(RedditApiError::RequestTimeout)
    ));

    let error: CoreError = ConfigError::BlankValue {
        field: "subreddit".to_string(),
    }
    .into();
    assert_eq!(
        error.to_string(),
        "Configuration error: Value must not be blank: subreddit"
    );
}

#[test]
fn test_logging_does_not_panic() {
    let error = CoreError::RedditApi(RedditApiError::InvalidToken);
    error.log_error();
    RedditApiError::RequestTimeout.log_error();
}
