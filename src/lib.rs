pub mod auth;
pub mod client;
pub mod config;
pub mod errno;
pub mod error;
pub mod listing;
pub mod logging;
pub mod metas;
pub mod response;
pub mod source;
pub mod transport;
pub mod types;
pub mod walker;

pub use auth::OAuthToken;
pub use client::PanClient;
pub use config::{ClientConfig, Credentials, RetryPolicy, WalkOptions};
pub use errno::errno_message;
pub use error::{BoxError, PanError, Result};
pub use response::{ApiResponse, Payload};
pub use source::DirectorySource;
pub use types::{Category, FileMeta, ListEntry, ListPage};
pub use walker::{WalkStats, Walker};
