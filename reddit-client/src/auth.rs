use crate::api::{RedditApiClient, RedditCommentData};
use crate::stream::CommentStream;
use oauth2::basic::{BasicClient, BasicErrorResponse};
use oauth2::{
    AuthUrl, ClientId, ClientSecret, HttpRequest, HttpResponse, RequestTokenError,
    ResourceOwnerPassword, ResourceOwnerUsername, Scope, TokenResponse, TokenUrl,
};
use replybot_core::{CoreError, RedditApiError, Settings};
use std::fmt;
use std::time::{Duration, SystemTime};
use tracing::{debug, info};

const REDDIT_AUTH_URL: &str = "https://www.reddit.com/api/v1/authorize";
const REDDIT_TOKEN_URL: &str = "https://www.reddit.com/api/v1/access_token";

/// Lifetime assumed when Reddit omits `expires_in`.
const DEFAULT_TOKEN_LIFETIME: Duration = Duration::from_secs(3600);
/// Tokens this close to expiry are renewed before the next request.
const TOKEN_EXPIRY_MARGIN: Duration = Duration::from_secs(60);

/// Credentials of a Reddit "script" app acting as a single account.
#[derive(Clone)]
pub struct RedditClientConfig {
    pub client_id: String,
    pub client_secret: String,
    pub username: String,
    pub password: String,
    pub user_agent: String,
}

impl RedditClientConfig {
    pub fn new(
        client_id: String,
        client_secret: String,
        username: String,
        password: String,
        user_agent: String,
    ) -> Self {
        Self {
            client_id,
            client_secret,
            username,
            password,
            user_agent,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        let credentials = &settings.credentials;
        Self::new(
            credentials.client_id.clone(),
            credentials.client_secret.clone(),
            credentials.username.clone(),
            credentials.password.clone(),
            settings.user_agent.clone(),
        )
    }
}

impl fmt::Debug for RedditClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedditClientConfig")
            .field("client_id", &self.client_id)
            .field("username", &self.username)
            .field("user_agent", &self.user_agent)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone)]
pub struct RedditToken {
    pub access_token: String,
    pub expires_at: SystemTime,
    pub scope: Vec<String>,
}

impl RedditToken {
    pub fn is_expired(&self) -> bool {
        SystemTime::now() + TOKEN_EXPIRY_MARGIN >= self.expires_at
    }
}

#[derive(Debug, Clone)]
pub enum AuthState {
    NotAuthenticated,
    Authenticated { token: RedditToken },
    TokenExpired { token: RedditToken },
}

pub struct RedditClient {
    config: RedditClientConfig,
    oauth_client: BasicClient,
    api: RedditApiClient,
    auth_state: AuthState,
}

impl RedditClient {
    pub fn new(config: RedditClientConfig) -> Result<Self, CoreError> {
        let oauth_client = BasicClient::new(
            ClientId::new(config.client_id.clone()),
            Some(ClientSecret::new(config.client_secret.clone())),
            AuthUrl::new(REDDIT_AUTH_URL.to_string())?,
            Some(TokenUrl::new(REDDIT_TOKEN_URL.to_string())?),
        );
        let api = RedditApiClient::new(config.user_agent.clone())?;

        Ok(Self {
            config,
            oauth_client,
            api,
            auth_state: AuthState::NotAuthenticated,
        })
    }

    pub fn get_required_scopes() -> Vec<&'static str> {
        vec!["identity", "read", "submit"]
    }

    pub fn get_auth_state(&self) -> &AuthState {
        &self.auth_state
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(&self.auth_state, AuthState::Authenticated { token } if !token.is_expired())
    }

    pub fn needs_refresh(&self) -> bool {
        match &self.auth_state {
            AuthState::NotAuthenticated => false,
            AuthState::Authenticated { token } => token.is_expired(),
            AuthState::TokenExpired { .. } => true,
        }
    }

    pub fn set_token(&mut self, token: RedditToken) {
        self.auth_state = if token.is_expired() {
            AuthState::TokenExpired { token }
        } else {
            AuthState::Authenticated { token }
        };
    }

    /// Runs the OAuth2 password grant for the configured account.
    pub async fn authenticate(&mut self) -> Result<(), CoreError> {
        info!("Authenticating with Reddit as u/{}", self.config.username);

        let username = ResourceOwnerUsername::new(self.config.username.clone());
        let password = ResourceOwnerPassword::new(self.config.password.clone());
        let mut request = self.oauth_client.exchange_password(&username, &password);
        for scope in Self::get_required_scopes() {
            request = request.add_scope(Scope::new(scope.to_string()));
        }

        let http_client = self.api.http_client().clone();
        let response = request
            .request_async(|request| send_token_request(http_client, request))
            .await
            .map_err(map_token_error)?;

        let expires_in = response.expires_in().unwrap_or(DEFAULT_TOKEN_LIFETIME);
        let scope = response
            .scopes()
            .map(|scopes| scopes.iter().map(|s| s.as_str().to_string()).collect())
            .unwrap_or_else(|| {
                Self::get_required_scopes()
                    .into_iter()
                    .map(str::to_string)
                    .collect()
            });

        self.set_token(RedditToken {
            access_token: response.access_token().secret().clone(),
            expires_at: SystemTime::now() + expires_in,
            scope,
        });
        info!(
            "Authenticated as u/{} (token valid for {}s)",
            self.config.username,
            expires_in.as_secs()
        );
        Ok(())
    }

    /// Returns the current access token without touching the network.
    pub fn ensure_authenticated(&self) -> Result<String, CoreError> {
        match &self.auth_state {
            AuthState::Authenticated { token } if !token.is_expired() => {
                Ok(token.access_token.clone())
            }
            AuthState::Authenticated { .. } | AuthState::TokenExpired { .. } => {
                Err(CoreError::RedditApi(RedditApiError::InvalidToken))
            }
            AuthState::NotAuthenticated => {
                Err(CoreError::RedditApi(RedditApiError::AuthenticationFailed {
                    reason: "Not authenticated".to_string(),
                }))
            }
        }
    }

    /// Returns a usable access token, renewing it first when it is about to
    /// expire. Script-app tokens carry no refresh token, so renewal repeats
    /// the password grant.
    pub async fn access_token(&mut self) -> Result<String, CoreError> {
        if self.needs_refresh() {
            debug!("Access token expiring, requesting a new one");
            self.authenticate().await?;
        }
        self.ensure_authenticated()
    }

    /// Newest comments of `subreddit`, newest first.
    pub async fn latest_comments(
        &mut self,
        subreddit: &str,
        limit: u32,
    ) -> Result<Vec<RedditCommentData>, CoreError> {
        let token = self.access_token().await?;
        let listing = self
            .api
            .get_subreddit_comments(&token, subreddit, limit)
            .await?;
        Ok(listing
            .data
            .children
            .into_iter()
            .map(|child| child.data)
            .collect())
    }

    pub async fn reply(&mut self, thing_id: &str, text: &str) -> Result<(), CoreError> {
        let token = self.access_token().await?;
        self.api.post_comment(&token, thing_id, text).await
    }

    /// Opens a live comment stream on `subreddit`.
    pub fn stream_comments(self, subreddit: &str, skip_existing: bool) -> CommentStream {
        CommentStream::new(self, subreddit, skip_existing)
    }
}

async fn send_token_request(
    http_client: reqwest::Client,
    request: HttpRequest,
) -> Result<HttpResponse, reqwest::Error> {
    let response = http_client
        .request(request.method, request.url.as_str())
        .headers(request.headers)
        .body(request.body)
        .send()
        .await?;

    let status_code = response.status();
    let headers = response.headers().clone();
    let body = response.bytes().await?.to_vec();

    Ok(HttpResponse {
        status_code,
        headers,
        body,
    })
}

fn map_token_error(err: RequestTokenError<reqwest::Error, BasicErrorResponse>) -> CoreError {
    match err {
        RequestTokenError::ServerResponse(response) => {
            CoreError::RedditApi(RedditApiError::AuthenticationFailed {
                reason: response.to_string(),
            })
        }
        RequestTokenError::Request(e) if e.is_timeout() => {
            CoreError::RedditApi(RedditApiError::RequestTimeout)
        }
        RequestTokenError::Request(e) => CoreError::Network(e),
        // Reddit answers a wrong password with 200 and `{"error": "invalid_grant"}`.
        RequestTokenError::Parse(_, body) => {
            CoreError::RedditApi(RedditApiError::AuthenticationFailed {
                reason: String::from_utf8_lossy(&body).trim().to_string(),
            })
        }
        RequestTokenError::Other(reason) => {
            CoreError::RedditApi(RedditApiError::AuthenticationFailed { reason })
        }
    }
}
