use async_trait::async_trait;
use crate::{error::Result, types::{FileMeta, ListPage}};

/// Core abstraction the tree walker runs against
///
/// Implementors list directory pages and resolve file metadata in
/// batches. `PanClient` is the network-backed implementation.
#[async_trait]
pub trait DirectorySource: Send + Sync {
    /// Fetch one page of a directory's children, ordered by name
    ///
    /// An exhausted or empty directory yields an empty page, not an error
    async fn list_page(&self, path: &str, start: u64, limit: u32) -> Result<ListPage>;

    /// Resolve metadata for a batch of file ids
    ///
    /// Results may come back in any order and may omit ids
    async fn resolve_metas(&self, fs_ids: &[u64]) -> Result<Vec<FileMeta>>;

    /// Get a human-readable identifier for this source (for logging/debugging)
    fn identifier(&self) -> String;
}
