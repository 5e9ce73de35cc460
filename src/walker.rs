use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{debug, info, instrument};

use crate::{
    config::WalkOptions,
    error::{BoxError, PanError, Result},
    source::DirectorySource,
    types::{FileMeta, ListEntry, ListPage},
};

/// Counters collected over one walk
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WalkStats {
    pub directories: u64,
    pub pages: u64,
    pub batches: u64,
    pub files_emitted: u64,
    /// Accepted ids the metadata lookup did not return
    pub metadata_misses: u64,
}

/// Depth-first walker over a `DirectorySource`
///
/// Each directory is read page by page. Subdirectories are walked to
/// completion as soon as they are met, before the rest of the page is
/// looked at. Once a page is fully partitioned its accepted files are
/// resolved in one batch, put back in acceptance order, numbered from
/// the shared counter and handed to the batch handler.
pub struct Walker<'a, S: DirectorySource + ?Sized> {
    source: &'a S,
    counter: &'a AtomicU64,
    options: WalkOptions,
}

/// Position inside one directory
struct DirCursor {
    path: String,
    start: u64,
    page: Option<PageState>,
}

/// A fetched page that is partly partitioned
struct PageState {
    entries: std::vec::IntoIter<ListEntry>,
    fetched: usize,
    pending: Vec<u64>,
}

impl DirCursor {
    fn new(path: String) -> Self {
        Self {
            path,
            start: 0,
            page: None,
        }
    }
}

impl PageState {
    fn new(page: ListPage) -> Self {
        Self {
            entries: page.entries.into_iter(),
            fetched: page.fetched,
            pending: Vec::new(),
        }
    }

    /// Consume entries until the next subdirectory, collecting accepted files
    fn partition<F>(&mut self, filter: &mut F) -> Option<String>
    where
        F: FnMut(&ListEntry) -> bool,
    {
        for entry in self.entries.by_ref() {
            if !entry.is_file() {
                return Some(entry.path);
            }
            if filter(&entry) {
                self.pending.push(entry.fs_id);
            }
        }
        None
    }
}

impl<'a, S: DirectorySource + ?Sized> Walker<'a, S> {
    pub fn new(source: &'a S, counter: &'a AtomicU64, options: WalkOptions) -> Self {
        Self {
            source,
            counter,
            options,
        }
    }

    /// Walk everything under `root`
    ///
    /// The first error from listing, metadata resolution or the batch
    /// handler ends the walk and is returned as is.
    #[instrument(skip(self, filter, on_batch), fields(source = %self.source.identifier()))]
    pub async fn walk<F, B>(&self, root: &str, mut filter: F, mut on_batch: B) -> Result<WalkStats>
    where
        F: FnMut(&ListEntry) -> bool,
        B: FnMut(Vec<FileMeta>) -> std::result::Result<(), BoxError>,
    {
        let limit = self.options.page_size.max(1);
        let mut stats = WalkStats::default();
        let mut stack = vec![DirCursor::new(root.to_string())];
        self.enter(root, &mut stats).await;

        while let Some(cursor) = stack.last_mut() {
            let mut page = match cursor.page.take() {
                Some(page) => page,
                None => {
                    let listed = self.source.list_page(&cursor.path, cursor.start, limit).await?;
                    stats.pages += 1;
                    PageState::new(listed)
                }
            };

            if let Some(child) = page.partition(&mut filter) {
                cursor.page = Some(page);
                self.enter(&child, &mut stats).await;
                stack.push(DirCursor::new(child));
                continue;
            }

            let batch = self.resolve_in_order(&page.pending, &mut stats).await?;
            stats.batches += 1;
            stats.files_emitted += batch.len() as u64;
            on_batch(batch).map_err(PanError::Callback)?;

            if page.fetched < limit as usize {
                stack.pop();
            } else {
                cursor.start += u64::from(limit);
            }
        }

        info!(
            "Walk of {} finished: {} directories, {} files",
            root, stats.directories, stats.files_emitted
        );
        Ok(stats)
    }

    async fn enter(&self, path: &str, stats: &mut WalkStats) {
        info!("Walking {}", path);
        stats.directories += 1;
        let delay = self.options.politeness_delay();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }

    /// Resolve `pending` and restore its order, numbering each record
    async fn resolve_in_order(
        &self,
        pending: &[u64],
        stats: &mut WalkStats,
    ) -> Result<Vec<FileMeta>> {
        if pending.is_empty() {
            return Ok(Vec::new());
        }

        let mut by_id: HashMap<u64, FileMeta> = self
            .source
            .resolve_metas(pending)
            .await?
            .into_iter()
            .map(|meta| (meta.fs_id, meta))
            .collect();

        let mut batch = Vec::with_capacity(pending.len());
        for fs_id in pending {
            let Some(mut meta) = by_id.remove(fs_id) else {
                stats.metadata_misses += 1;
                continue;
            };
            meta.walk_index = Some(self.counter.fetch_add(1, Ordering::SeqCst));
            batch.push(meta);
        }

        if batch.len() < pending.len() {
            debug!(
                "Metadata lookup returned {} of {} files",
                batch.len(),
                pending.len()
            );
        }
        Ok(batch)
    }
}
