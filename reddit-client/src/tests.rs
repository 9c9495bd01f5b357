use crate::api::RedditCommentData;
use crate::stream::{ListingDeduper, SeenComments};
use crate::{AuthState, RedditClient, RedditClientConfig, RedditToken};
use replybot_core::{CoreError, Credentials, RedditApiError, Settings};
use std::time::{Duration, SystemTime};

fn create_test_config() -> RedditClientConfig {
    RedditClientConfig::new(
        "test_client_id".to_string(),
        "test_client_secret".to_string(),
        "test_user".to_string(),
        "test_password".to_string(),
        "replybot/1.0 by test_user".to_string(),
    )
}

fn comment(id: &str, body: &str) -> RedditCommentData {
    RedditCommentData {
        id: Some(id.to_string()),
        name: Some(format!("t1_{}", id)),
        author: Some("someone".to_string()),
        body: Some(body.to_string()),
        ..RedditCommentData::default()
    }
}

fn ids(items: &[Option<replybot_core::Comment>]) -> Vec<String> {
    items
        .iter()
        .map(|item| item.as_ref().map(|c| c.id.clone()).unwrap_or_default())
        .collect()
}

#[test]
fn test_config_from_settings() {
    let settings = Settings {
        subreddit: "rust".to_string(),
        credentials: Credentials {
            client_id: "id".to_string(),
            client_secret: "secret".to_string(),
            username: "bot_account".to_string(),
            password: "pw".to_string(),
        },
        user_agent: "replybot/1.0".to_string(),
        keywords: vec!["bot".to_string()],
        phrases: vec!["hi".to_string()],
    };

    let config = RedditClientConfig::from_settings(&settings);
    assert_eq!(config.client_id, "id");
    assert_eq!(config.client_secret, "secret");
    assert_eq!(config.username, "bot_account");
    assert_eq!(config.password, "pw");
    assert_eq!(config.user_agent, "replybot/1.0");
}

#[test]
fn test_config_debug_hides_secrets() {
    let debug = format!("{:?}", create_test_config());
    assert!(debug.contains("test_client_id"));
    assert!(!debug.contains("test_password"));
    assert!(!debug.contains("test_client_secret"));
}

#[test]
fn test_client_creation() {
    let client = RedditClient::new(create_test_config());
    assert!(client.is_ok());

    let client = client.unwrap();
    assert!(!client.is_authenticated());
    assert!(!client.needs_refresh());
    assert!(matches!(
        client.get_auth_state(),
        AuthState::NotAuthenticated
    ));
}

#[test]
fn test_required_scopes() {
    let scopes = RedditClient::get_required_scopes();
    assert_eq!(scopes, vec!["identity", "read", "submit"]);
}

#[test]
fn test_token_creation_and_expiry() {
    let now = SystemTime::now();

    let valid_token = RedditToken {
        access_token: "valid_token".to_string(),
        expires_at: now + Duration::from_secs(3600),
        scope: vec!["read".to_string(), "submit".to_string()],
    };
    let expired_token = RedditToken {
        access_token: "expired_token".to_string(),
        expires_at: now - Duration::from_secs(3600),
        scope: vec!["read".to_string()],
    };
    let nearly_expired = RedditToken {
        access_token: "nearly_expired".to_string(),
        expires_at: now + Duration::from_secs(10),
        scope: vec!["read".to_string()],
    };

    let mut client = RedditClient::new(create_test_config()).unwrap();

    client.set_token(valid_token);
    assert!(client.is_authenticated());
    assert!(!client.needs_refresh());
    assert_eq!(client.ensure_authenticated().unwrap(), "valid_token");

    client.set_token(expired_token);
    assert!(!client.is_authenticated());
    assert!(client.needs_refresh());
    assert!(matches!(
        client.get_auth_state(),
        AuthState::TokenExpired { .. }
    ));

    client.set_token(nearly_expired);
    assert!(client.needs_refresh());
}

#[test]
fn test_ensure_authenticated_states() {
    let mut client = RedditClient::new(create_test_config()).unwrap();

    let result = client.ensure_authenticated();
    if let Err(CoreError::RedditApi(RedditApiError::AuthenticationFailed { reason })) = result {
        assert!(reason.contains("Not authenticated"));
    } else {
        panic!("Expected AuthenticationFailed error");
    }

    client.set_token(RedditToken {
        access_token: "old".to_string(),
        expires_at: SystemTime::now() - Duration::from_secs(1),
        scope: Vec::new(),
    });
    assert!(matches!(
        client.ensure_authenticated(),
        Err(CoreError::RedditApi(RedditApiError::InvalidToken))
    ));
}

#[test]
fn test_access_token_uses_valid_token_without_network() {
    let mut client = RedditClient::new(create_test_config()).unwrap();
    client.set_token(RedditToken {
        access_token: "cached".to_string(),
        expires_at: SystemTime::now() + Duration::from_secs(3600),
        scope: Vec::new(),
    });

    let token = tokio_test::block_on(client.access_token()).unwrap();
    assert_eq!(token, "cached");
}

// Stream tests
#[test]
fn test_seen_comments_is_bounded() {
    let mut seen = SeenComments::new(3);
    assert!(seen.insert("a".to_string()));
    assert!(seen.insert("b".to_string()));
    assert!(!seen.insert("a".to_string()));
    assert!(seen.insert("c".to_string()));
    assert!(seen.insert("d".to_string()));

    assert_eq!(seen.len(), 3);
    assert!(!seen.contains("a"));
    assert!(seen.contains("d"));
    // Forgotten ids count as new again.
    assert!(seen.insert("a".to_string()));
}

#[test]
fn test_skip_existing_primes_on_first_listing() {
    let mut deduper = ListingDeduper::new(true);

    let first = deduper.fresh(vec![comment("b", "two"), comment("a", "one")]);
    assert!(first.is_empty());
    assert_eq!(deduper.seen().len(), 2);

    let second = deduper.fresh(vec![
        comment("d", "four"),
        comment("c", "three"),
        comment("b", "two"),
        comment("a", "one"),
    ]);
    assert_eq!(ids(&second), vec!["c", "d"]);
}

#[test]
fn test_without_skip_existing_yields_backlog_oldest_first() {
    let mut deduper = ListingDeduper::new(false);
    let first = deduper.fresh(vec![comment("b", "two"), comment("a", "one")]);
    assert_eq!(ids(&first), vec!["a", "b"]);

    let again = deduper.fresh(vec![comment("b", "two"), comment("a", "one")]);
    assert!(again.is_empty());
}

#[test]
fn test_incomplete_listing_item_is_yielded_as_empty() {
    let mut deduper = ListingDeduper::new(true);
    deduper.fresh(vec![comment("a", "one")]);

    let broken = RedditCommentData {
        id: Some("b".to_string()),
        name: Some("t1_b".to_string()),
        body: None,
        ..RedditCommentData::default()
    };
    let fresh = deduper.fresh(vec![broken, comment("a", "one")]);
    assert_eq!(fresh.len(), 1);
    assert!(fresh[0].is_none());
}
