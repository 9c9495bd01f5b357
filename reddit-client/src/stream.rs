use crate::api::RedditCommentData;
use crate::auth::RedditClient;
use crate::backoff::PollBackoff;
use replybot_core::{Comment, CommentFeed, CoreError};
use std::collections::{HashSet, VecDeque};
use tokio::time::sleep;
use tracing::debug;

/// Number of comments requested per poll (Reddit's maximum).
const LISTING_LIMIT: u32 = 100;
/// How many ids the stream remembers for deduplication.
const SEEN_CAPACITY: usize = 301;

/// Insertion-ordered set that forgets its oldest entry once full.
#[derive(Debug)]
pub struct SeenComments {
    order: VecDeque<String>,
    ids: HashSet<String>,
    capacity: usize,
}

impl SeenComments {
    pub fn new(capacity: usize) -> Self {
        Self {
            order: VecDeque::with_capacity(capacity),
            ids: HashSet::with_capacity(capacity),
            capacity,
        }
    }

    /// Records `id`, returning `false` if it was already present.
    pub fn insert(&mut self, id: String) -> bool {
        if self.ids.contains(&id) {
            return false;
        }
        if self.order.len() >= self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.ids.remove(&oldest);
            }
        }
        self.ids.insert(id.clone());
        self.order.push_back(id);
        true
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// Turns successive listings into a deduplicated, oldest-first sequence.
///
/// With `skip_existing` the first listing only primes the seen set, so the
/// stream starts with comments written after it was opened.
#[derive(Debug)]
pub struct ListingDeduper {
    seen: SeenComments,
    skip_existing: bool,
    primed: bool,
}

impl ListingDeduper {
    pub fn new(skip_existing: bool) -> Self {
        Self {
            seen: SeenComments::new(SEEN_CAPACITY),
            skip_existing,
            primed: false,
        }
    }

    /// Takes a newest-first listing and returns the unseen items oldest-first.
    /// Items without an id or body come back as `None`.
    pub fn fresh(&mut self, listing: Vec<RedditCommentData>) -> Vec<Option<Comment>> {
        let skip = self.skip_existing && !self.primed;
        self.primed = true;

        let mut fresh = Vec::new();
        for data in listing.into_iter().rev() {
            if let Some(key) = data.name.clone().or_else(|| data.id.clone()) {
                if !self.seen.insert(key) {
                    continue;
                }
            }
            if !skip {
                fresh.push(data.into_comment());
            }
        }
        fresh
    }

    pub fn seen(&self) -> &SeenComments {
        &self.seen
    }
}

/// Live comment feed of one subreddit, built by polling its newest comments.
pub struct CommentStream {
    client: RedditClient,
    subreddit: String,
    deduper: ListingDeduper,
    pending: VecDeque<Option<Comment>>,
    backoff: PollBackoff,
}

impl CommentStream {
    pub fn new(client: RedditClient, subreddit: &str, skip_existing: bool) -> Self {
        Self {
            client,
            subreddit: subreddit.to_string(),
            deduper: ListingDeduper::new(skip_existing),
            pending: VecDeque::new(),
            backoff: PollBackoff::default(),
        }
    }

    async fn poll(&mut self) -> Result<(), CoreError> {
        let listing = self
            .client
            .latest_comments(&self.subreddit, LISTING_LIMIT)
            .await?;
        let fresh = self.deduper.fresh(listing);

        if fresh.is_empty() {
            let delay = self.backoff.next_delay();
            debug!(
                "No new comments in r/{}, polling again in {:?}",
                self.subreddit, delay
            );
            sleep(delay).await;
        } else {
            debug!("{} new comments in r/{}", fresh.len(), self.subreddit);
            self.backoff.reset();
            self.pending.extend(fresh);
        }
        Ok(())
    }
}

impl CommentFeed for CommentStream {
    async fn next_comment(&mut self) -> Result<Option<Comment>, CoreError> {
        loop {
            if let Some(item) = self.pending.pop_front() {
                return Ok(item);
            }
            self.poll().await?;
        }
    }

    async fn reply_to(&mut self, comment: &Comment, text: &str) -> Result<(), CoreError> {
        self.client.reply(&comment.fullname, text).await
    }
}
