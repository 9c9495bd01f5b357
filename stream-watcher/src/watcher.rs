//! The consume-match-reply loop.
//!
//! The watcher never exits the process itself. Every way the loop can end is
//! reported as a [`RunOutcome`], and the binary turns that into an exit code
//! for the supervisor: `0` for a clean stop, `1` when it should relaunch us.

use crate::matcher::{KeywordMatcher, PhrasePicker};
use reddit_client::{CommentStream, RedditClient, RedditClientConfig};
use replybot_core::{Comment, CommentFeed, CoreError, ErrorExt, Settings};
use std::future::Future;
use thiserror::Error;
use tracing::{debug, error, info};

#[derive(Debug, Error)]
pub enum RestartReason {
    #[error("received an empty comment from the feed")]
    EmptyItem,

    #[error("comment feed failed: {0}")]
    Feed(#[source] CoreError),

    #[error("reply failed: {0}")]
    Reply(#[source] CoreError),
}

#[derive(Debug)]
pub enum RunOutcome {
    /// Operator interrupt; the supervisor should leave us stopped.
    CleanStop,
    /// The stream can't continue; the supervisor should relaunch the process.
    RestartRequested(RestartReason),
}

impl RunOutcome {
    pub const CLEAN_EXIT_CODE: u8 = 0;
    pub const RESTART_EXIT_CODE: u8 = 1;

    pub fn exit_code(&self) -> u8 {
        match self {
            RunOutcome::CleanStop => Self::CLEAN_EXIT_CODE,
            RunOutcome::RestartRequested(_) => Self::RESTART_EXIT_CODE,
        }
    }
}

/// Logs in with the configured account and opens the comment stream of the
/// configured subreddit, skipping comments that existed before this call.
pub async fn authenticate(settings: &Settings) -> Result<CommentStream, CoreError> {
    let config = RedditClientConfig::from_settings(settings);
    let mut client = RedditClient::new(config)?;

    if let Err(e) = client.authenticate().await {
        error!(
            "Could not authenticate as u/{}: {}",
            settings.credentials.username, e
        );
        return Err(e);
    }

    Ok(client.stream_comments(&settings.subreddit, true))
}

pub struct StreamWatcher {
    subreddit: String,
    own_username: String,
    matcher: KeywordMatcher,
    picker: PhrasePicker,
}

impl StreamWatcher {
    pub fn new(settings: &Settings) -> Self {
        Self {
            subreddit: settings.subreddit.clone(),
            own_username: settings.credentials.username.clone(),
            matcher: KeywordMatcher::new(&settings.keywords),
            picker: PhrasePicker::new(&settings.phrases),
        }
    }

    pub fn with_picker(mut self, picker: PhrasePicker) -> Self {
        self.picker = picker;
        self
    }

    /// Consumes `feed` until it fails or `shutdown` completes.
    ///
    /// Comments are handled strictly one after another. A rejected reply is
    /// logged and skipped; anything that leaves the feed in doubt ends the run
    /// with [`RunOutcome::RestartRequested`].
    pub async fn run<F, S>(&mut self, feed: &mut F, shutdown: S) -> RunOutcome
    where
        F: CommentFeed,
        S: Future<Output = ()>,
    {
        info!("Starting the reddit comment stream...");
        debug!("Watching r/{}", self.subreddit);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                biased;
                _ = &mut shutdown => {
                    info!("Interrupt received, stopping the comment stream");
                    return RunOutcome::CleanStop;
                }
                step = self.step(feed) => {
                    if let Some(outcome) = step {
                        return outcome;
                    }
                }
            }
        }
    }

    async fn step<F: CommentFeed>(&mut self, feed: &mut F) -> Option<RunOutcome> {
        let comment = match feed.next_comment().await {
            Ok(Some(comment)) => comment,
            Ok(None) => {
                error!("Received an empty comment, restarting the stream...");
                return Some(RunOutcome::RestartRequested(RestartReason::EmptyItem));
            }
            Err(e) => {
                error!("Comment stream failed ({}): {}", e.error_code(), e);
                return Some(RunOutcome::RestartRequested(RestartReason::Feed(e)));
            }
        };

        match self.process_comment(feed, &comment).await {
            Ok(_) => None,
            Err(e) if e.threatens_stream() => {
                error!(
                    "Reply to {} failed, restarting the stream: {}",
                    comment.id, e
                );
                Some(RunOutcome::RestartRequested(RestartReason::Reply(e)))
            }
            Err(e) => {
                error!("Could not reply to {}: {}", comment.id, e);
                None
            }
        }
    }

    /// Replies to `comment` if it contains a keyword.
    ///
    /// Returns the posted phrase, or `None` when the comment was left alone.
    /// At most one reply is posted per comment.
    pub async fn process_comment<F: CommentFeed>(
        &mut self,
        feed: &mut F,
        comment: &Comment,
    ) -> Result<Option<String>, CoreError> {
        if self.is_own(comment) {
            debug!("Skipping own comment {}", comment.id);
            return Ok(None);
        }

        let Some(keyword) = self.matcher.first_match(&comment.body) else {
            return Ok(None);
        };
        let Some(phrase) = self.picker.pick() else {
            return Ok(None);
        };
        debug!("Comment {} matched keyword '{}'", comment.id, keyword);
        let phrase = phrase.to_string();

        feed.reply_to(comment, &phrase).await?;
        info!("Replied to: {} in {}", comment.id, comment.permalink);
        Ok(Some(phrase))
    }

    fn is_own(&self, comment: &Comment) -> bool {
        !comment.author.is_empty() && comment.author.eq_ignore_ascii_case(&self.own_username)
    }
}
