use std::fmt;

/// Reddit script-app credentials.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Validated settings for one run of the bot.
///
/// Only [`crate::ConfigBootstrap`] builds these, so `keywords` and `phrases`
/// are always non-empty and free of blank entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub subreddit: String,
    pub credentials: Credentials,
    pub user_agent: String,
    pub keywords: Vec<String>,
    pub phrases: Vec<String>,
}

/// A comment delivered by the live feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    pub id: String,
    /// Type-prefixed id (`t1_...`) used as the reply target.
    pub fullname: String,
    pub author: String,
    pub body: String,
    pub permalink: String,
}
