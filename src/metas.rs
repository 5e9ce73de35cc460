use tracing::{debug, instrument};

use crate::{
    client::PanClient,
    error::{PanError, Result},
    response::{ApiResponse, Payload},
    types::FileMeta,
};

/// Multimedia API endpoint serving `filemetas`
pub const MULTIMEDIA_API_PATH: &str = "/rest/2.0/xpan/multimedia";

impl PanClient {
    /// Resolve full metadata, download links and media duration in one batch
    ///
    /// Results come back in provider order, which need not match `fs_ids`.
    /// An empty id list returns an empty result without a request.
    #[instrument(skip(self, fs_ids), fields(count = fs_ids.len()))]
    pub async fn file_metas(&self, fs_ids: &[u64]) -> Result<Vec<FileMeta>> {
        if fs_ids.is_empty() {
            return Ok(Vec::new());
        }

        let metas = self
            .api_get_with(
                MULTIMEDIA_API_PATH,
                &[
                    ("method", "filemetas".to_string()),
                    ("fsids", fsids_param(fs_ids)),
                    ("dlink", "1".to_string()),
                    ("needmedia", "1".to_string()),
                ],
                |response| decode_metas(&response),
            )
            .await?;

        debug!("Resolved {} of {} file metas", metas.len(), fs_ids.len());
        Ok(metas)
    }
}

fn decode_metas(response: &ApiResponse) -> Result<Vec<FileMeta>> {
    let items = match response.items("list")? {
        Payload::Absent => return Ok(Vec::new()),
        Payload::Items(items) => items,
    };

    items
        .iter()
        .map(|raw| {
            serde_json::from_value::<FileMeta>(raw.clone()).map_err(|e| PanError::Decode {
                message: format!("file meta record: {}", e),
            })
        })
        .collect()
}

/// Serialize ids as a bracketed numeric list, e.g. `[1,2,3]`
pub(crate) fn fsids_param(fs_ids: &[u64]) -> String {
    let joined = fs_ids
        .iter()
        .map(u64::to_string)
        .collect::<Vec<_>>()
        .join(",");
    format!("[{}]", joined)
}
