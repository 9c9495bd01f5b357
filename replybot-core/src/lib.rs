pub mod config;
pub mod error;
pub mod error_utils;
pub mod feed;
pub mod types;

pub use config::*;
pub use error::*;
pub use error_utils::*;
pub use feed::*;
pub use types::*;
