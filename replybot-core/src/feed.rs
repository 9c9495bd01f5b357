use crate::{Comment, CoreError};

/// A live, deduplicated source of comments that can also post replies.
///
/// `next_comment` waits until the next comment arrives. `Ok(None)` means the
/// feed handed over an empty item, which callers treat as a malfunction of
/// the feed rather than the end of it.
#[allow(async_fn_in_trait)]
pub trait CommentFeed {
    async fn next_comment(&mut self) -> Result<Option<Comment>, CoreError>;

    async fn reply_to(&mut self, comment: &Comment, text: &str) -> Result<(), CoreError>;
}
