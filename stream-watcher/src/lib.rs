pub mod matcher;
pub mod watcher;

pub use matcher::{KeywordMatcher, PhrasePicker};
pub use watcher::{authenticate, RestartReason, RunOutcome, StreamWatcher};
