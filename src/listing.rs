use tracing::{debug, instrument, warn};

use crate::{
    client::PanClient,
    error::Result,
    response::{ApiResponse, Payload},
    types::{ListEntry, ListPage},
};

/// File API endpoint shared by both listing methods
pub const FILE_API_PATH: &str = "/rest/2.0/xpan/file";

/// Page size used when the caller passes zero
pub const DEFAULT_PAGE_LIMIT: u32 = 20;

impl PanClient {
    /// List one page of a directory, ordered by name
    ///
    /// An absent `list` payload means the directory is empty or exhausted
    /// and yields an empty page.
    #[instrument(skip(self))]
    pub async fn list_dir(&self, dir: &str, start: u64, limit: u32) -> Result<ListPage> {
        let limit = if limit == 0 { DEFAULT_PAGE_LIMIT } else { limit };

        let page = self
            .api_get_with(
                FILE_API_PATH,
                &[
                    ("method", "list".to_string()),
                    ("dir", dir.to_string()),
                    ("start", start.to_string()),
                    ("limit", limit.to_string()),
                    ("order", "name".to_string()),
                ],
                |response| decode_page(&response, "list"),
            )
            .await?;

        debug!("Listed {} entries from {}", page.entries.len(), dir);
        Ok(page)
    }

    /// List one page of a directory through the media-oriented method
    ///
    /// `method` defaults to `list` when `None` or empty.
    #[instrument(skip(self))]
    pub async fn list_media_dir(
        &self,
        parent_path: &str,
        page: u32,
        num: u32,
        method: Option<&str>,
    ) -> Result<ListPage> {
        let num = if num == 0 { DEFAULT_PAGE_LIMIT } else { num };
        let method = method.filter(|m| !m.is_empty()).unwrap_or("list");

        self.api_get_with(
            FILE_API_PATH,
            &[
                ("method", method.to_string()),
                ("parent_path", parent_path.to_string()),
                ("page", page.to_string()),
                ("num", num.to_string()),
            ],
            |response| decode_page(&response, "info"),
        )
        .await
    }
}

fn decode_page(response: &ApiResponse, key: &str) -> Result<ListPage> {
    let items = match response.items(key)? {
        Payload::Absent => return Ok(ListPage::default()),
        Payload::Items(items) => items,
    };

    let entries = items
        .iter()
        .filter_map(|raw| {
            let entry = ListEntry::from_value(raw);
            if entry.is_none() {
                warn!("Skipping listing record without fs_id/path: {}", raw);
            }
            entry
        })
        .collect();

    Ok(ListPage {
        entries,
        fetched: items.len(),
    })
}
