use crate::rate_limiter::RateLimiter;
use replybot_core::{Comment, CoreError, RedditApiError};
use reqwest::{Client, Method, Response};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, error, warn};
use url::Url;

const REDDIT_API_BASE: &str = "https://oauth.reddit.com";
const REDDIT_WEB_BASE: &str = "https://www.reddit.com";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditListing<T> {
    pub kind: String,
    pub data: RedditListingData<T>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditListingData<T> {
    pub children: Vec<RedditListingChild<T>>,
    pub after: Option<String>,
    pub before: Option<String>,
    pub dist: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditListingChild<T> {
    pub kind: String,
    pub data: T,
}

/// Raw comment as returned by `/r/{subreddit}/comments`.
///
/// Every field is optional so that a truncated item still deserializes; the
/// stream decides what an incomplete item means.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RedditCommentData {
    pub id: Option<String>,
    pub name: Option<String>,
    pub author: Option<String>,
    pub body: Option<String>,
    pub permalink: Option<String>,
    pub link_permalink: Option<String>,
}

impl RedditCommentData {
    /// Converts into a [`Comment`], or `None` when the id or body is missing.
    pub fn into_comment(self) -> Option<Comment> {
        let id = self.id.filter(|id| !id.is_empty())?;
        let body = self.body?;
        let fullname = self.name.unwrap_or_else(|| format!("t1_{}", id));
        let permalink = self
            .permalink
            .or(self.link_permalink)
            .map(|path| absolute_permalink(&path))
            .unwrap_or_default();

        Some(Comment {
            id,
            fullname,
            author: self.author.unwrap_or_default(),
            body,
            permalink,
        })
    }
}

fn absolute_permalink(path: &str) -> String {
    Url::parse(REDDIT_WEB_BASE)
        .and_then(|base| base.join(path))
        .map(|url| url.to_string())
        .unwrap_or_else(|_| path.to_string())
}

/// Envelope returned by `POST /api/comment` with `api_type=json`.
#[derive(Debug, Clone, Deserialize)]
pub struct CommentSubmitResponse {
    pub json: CommentSubmitBody,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommentSubmitBody {
    #[serde(default)]
    pub errors: Vec<Vec<serde_json::Value>>,
}

impl CommentSubmitResponse {
    /// First error reported by Reddit, as `ApiRejected`.
    pub fn rejection(&self) -> Option<RedditApiError> {
        let first = self.json.errors.first()?;
        let field = |index: usize| {
            first
                .get(index)
                .and_then(|value| value.as_str())
                .unwrap_or_default()
                .to_string()
        };
        Some(RedditApiError::ApiRejected {
            code: field(0),
            message: field(1),
        })
    }
}

/// Requests to the OAuth API go out one at a time, paced by `limiter`.
#[derive(Debug)]
pub struct RedditApiClient {
    http_client: Client,
    limiter: RateLimiter,
}

impl RedditApiClient {
    pub fn new(user_agent: String) -> Result<Self, CoreError> {
        let http_client = Client::builder()
            .user_agent(&user_agent)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            http_client,
            limiter: RateLimiter::default(),
        })
    }

    pub fn http_client(&self) -> &Client {
        &self.http_client
    }

    pub async fn make_request(
        &mut self,
        method: Method,
        endpoint: &str,
        access_token: &str,
        query_params: Option<&[(&str, &str)]>,
        form: Option<&[(&str, &str)]>,
    ) -> Result<Response, CoreError> {
        let url = format!("{}{}", REDDIT_API_BASE, endpoint);

        let mut request_builder = self
            .http_client
            .request(method.clone(), &url)
            .bearer_auth(access_token);

        if let Some(params) = query_params {
            request_builder = request_builder.query(params);
        }
        if let Some(fields) = form {
            request_builder = request_builder.form(fields);
        }

        self.limiter.acquire_permit().await;
        debug!("Making Reddit API request: {} {}", method, endpoint);
        let response = match request_builder.send().await {
            Ok(response) => response,
            Err(e) => {
                error!("Network error for {} {}: {}", method, endpoint, e);
                if e.is_timeout() {
                    return Err(CoreError::RedditApi(RedditApiError::RequestTimeout));
                }
                return Err(CoreError::Network(e));
            }
        };

        self.limiter.observe(response.headers(), Instant::now());

        let status = response.status();
        if status.is_success() {
            debug!("Request successful: {} {}", status, endpoint);
            return Ok(response);
        }

        error!("Request failed with status: {} for {}", status, endpoint);
        let error = match status.as_u16() {
            429 => {
                let retry_after = response
                    .headers()
                    .get("retry-after")
                    .and_then(|value| value.to_str().ok())
                    .and_then(|value| value.parse::<u64>().ok())
                    .unwrap_or(60);
                warn!("Rate limited, retry after {} seconds", retry_after);
                RedditApiError::RateLimitExceeded { retry_after }
            }
            401 => RedditApiError::InvalidToken,
            403 => RedditApiError::Forbidden {
                resource: endpoint.to_string(),
            },
            404 => RedditApiError::ResourceNotFound {
                resource: endpoint.to_string(),
            },
            code if status.is_server_error() => RedditApiError::ServerError { status_code: code },
            code => RedditApiError::InvalidResponse {
                details: format!("unexpected status {} for {}", code, endpoint),
            },
        };
        Err(CoreError::RedditApi(error))
    }

    /// Newest comments of a subreddit, newest first.
    pub async fn get_subreddit_comments(
        &mut self,
        access_token: &str,
        subreddit: &str,
        limit: u32,
    ) -> Result<RedditListing<RedditCommentData>, CoreError> {
        let endpoint = format!("/r/{}/comments", subreddit);
        let limit_str = limit.to_string();
        let params = [("limit", limit_str.as_str()), ("raw_json", "1")];

        let response = self
            .make_request(Method::GET, &endpoint, access_token, Some(&params[..]), None)
            .await?;

        let listing: RedditListing<RedditCommentData> = response.json().await.map_err(|e| {
            error!("Failed to parse subreddit comments: {}", e);
            CoreError::RedditApi(RedditApiError::InvalidResponse {
                details: format!("Failed to parse comments for r/{}", subreddit),
            })
        })?;

        debug!(
            "Retrieved {} comments from r/{}",
            listing.data.children.len(),
            subreddit
        );
        Ok(listing)
    }

    /// Posts `text` as a reply to the thing named `thing_id` (a fullname).
    pub async fn post_comment(
        &mut self,
        access_token: &str,
        thing_id: &str,
        text: &str,
    ) -> Result<(), CoreError> {
        let form = [("api_type", "json"), ("thing_id", thing_id), ("text", text)];

        let response = self
            .make_request(Method::POST, "/api/comment", access_token, None, Some(&form[..]))
            .await?;

        let submitted: CommentSubmitResponse = response.json().await.map_err(|e| {
            error!("Failed to parse comment response: {}", e);
            CoreError::RedditApi(RedditApiError::InvalidResponse {
                details: format!("Failed to parse reply response for {}", thing_id),
            })
        })?;

        if let Some(rejection) = submitted.rejection() {
            return Err(CoreError::RedditApi(rejection));
        }

        debug!("Posted reply to {}", thing_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_client_creation() {
        assert!(RedditApiClient::new("test-user-agent/1.0".to_string()).is_ok());
    }

    #[test]
    fn test_comment_conversion() {
        let data = RedditCommentData {
            id: Some("abc123".to_string()),
            name: Some("t1_abc123".to_string()),
            author: Some("someone".to_string()),
            body: Some("is this a bot?".to_string()),
            permalink: Some("/r/test/comments/xyz/title/abc123/".to_string()),
            link_permalink: None,
        };

        let comment = data.into_comment().unwrap();
        assert_eq!(comment.id, "abc123");
        assert_eq!(comment.fullname, "t1_abc123");
        assert_eq!(comment.author, "someone");
        assert_eq!(comment.body, "is this a bot?");
        assert_eq!(
            comment.permalink,
            "https://www.reddit.com/r/test/comments/xyz/title/abc123/"
        );
    }

    #[test]
    fn test_comment_conversion_derives_fullname() {
        let data = RedditCommentData {
            id: Some("def456".to_string()),
            body: Some("hello".to_string()),
            ..RedditCommentData::default()
        };
        let comment = data.into_comment().unwrap();
        assert_eq!(comment.fullname, "t1_def456");
        assert_eq!(comment.permalink, "");
    }

    #[test]
    fn test_incomplete_comment_is_empty() {
        let no_body = RedditCommentData {
            id: Some("abc123".to_string()),
            ..RedditCommentData::default()
        };
        assert!(no_body.into_comment().is_none());

        let blank_id = RedditCommentData {
            id: Some(String::new()),
            body: Some("text".to_string()),
            ..RedditCommentData::default()
        };
        assert!(blank_id.into_comment().is_none());
    }

    #[test]
    fn test_listing_parsing() {
        let json = r#"{
            "kind": "Listing",
            "data": {
                "after": "t1_b",
                "before": null,
                "dist": 2,
                "children": [
                    {"kind": "t1", "data": {"id": "b", "name": "t1_b", "body": "second", "author": "x", "subreddit": "test"}},
                    {"kind": "t1", "data": {"id": "a", "name": "t1_a", "body": "first", "author": "y"}}
                ]
            }
        }"#;
        let listing: RedditListing<RedditCommentData> = serde_json::from_str(json).unwrap();
        assert_eq!(listing.data.children.len(), 2);
        assert_eq!(listing.data.children[0].data.id.as_deref(), Some("b"));
        assert_eq!(listing.data.children[1].data.author.as_deref(), Some("y"));
    }

    #[test]
    fn test_comment_response_rejection() {
        let json = r#"{"json": {"errors": [["THREAD_LOCKED", "that thread is locked", "parent"]]}}"#;
        let response: CommentSubmitResponse = serde_json::from_str(json).unwrap();
        match response.rejection() {
            Some(RedditApiError::ApiRejected { code, message }) => {
                assert_eq!(code, "THREAD_LOCKED");
                assert_eq!(message, "that thread is locked");
            }
            other => panic!("Expected ApiRejected, got {:?}", other),
        }
    }

    #[test]
    fn test_comment_response_success() {
        let json = r#"{"json": {"errors": [], "data": {"things": []}}}"#;
        let response: CommentSubmitResponse = serde_json::from_str(json).unwrap();
        assert!(response.rejection().is_none());
    }
}
