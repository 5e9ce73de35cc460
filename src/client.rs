use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use reqwest::{Client, Url};

use crate::{
    config::ClientConfig,
    error::{BoxError, PanError, Result},
    source::DirectorySource,
    types::{FileMeta, ListEntry, ListPage},
    walker::{WalkStats, Walker},
};

/// Netdisk REST API client
///
/// Talks to the provider over stateless HTTP GET requests:
/// - directory and media listings
/// - batched metadata lookups with download links
/// - recursive tree walks built on both
///
/// The walk counter lives as long as the client and is never reset, so
/// walk indices stay unique across every walk made with one instance.
pub struct PanClient {
    pub(crate) http: Client,
    pub(crate) config: ClientConfig,
    pub(crate) base: Url,
    walk_index: AtomicU64,
}

impl PanClient {
    /// Create a new client from a validated configuration
    pub fn new(config: ClientConfig) -> Result<Self> {
        config.validate()?;
        let base = Url::parse(&config.api_host).map_err(|e| PanError::InvalidConfig {
            message: format!("api_host: {}", e),
        })?;

        let http = Client::builder()
            .user_agent(concat!("pan-walker/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_else(|_| Client::new());

        Ok(Self {
            http,
            config,
            base,
            walk_index: AtomicU64::new(0),
        })
    }

    /// Create a client for the default host with only an access token
    pub fn with_access_token(token: impl Into<String>) -> Result<Self> {
        Self::new(ClientConfig::default().with_access_token(token))
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Replace the access token, e.g. after an authorization-code exchange
    pub fn set_access_token(&mut self, token: impl Into<String>) {
        self.config.credentials.access_token = token.into();
    }

    /// Next walk index that will be handed out
    pub fn walk_index(&self) -> u64 {
        self.walk_index.load(Ordering::SeqCst)
    }

    /// Resolve an API path against the host; absolute URLs pass through
    pub(crate) fn endpoint_url(&self, path: &str) -> Result<Url> {
        let parsed = if path.starts_with("http://") || path.starts_with("https://") {
            Url::parse(path)
        } else {
            self.base.join(path)
        };
        parsed.map_err(|e| PanError::InvalidConfig {
            message: format!("invalid endpoint `{}`: {}", path, e),
        })
    }

    /// Walk the tree under `path` depth-first
    ///
    /// `filter` picks the files whose metadata is resolved; `on_batch`
    /// receives each directory page's resolved, indexed metadata. Any
    /// listing, metadata or handler failure stops the whole walk.
    pub async fn walk<F, B>(&self, path: &str, filter: F, on_batch: B) -> Result<WalkStats>
    where
        F: FnMut(&ListEntry) -> bool,
        B: FnMut(Vec<FileMeta>) -> std::result::Result<(), BoxError>,
    {
        Walker::new(self, &self.walk_index, self.config.walk)
            .walk(path, filter, on_batch)
            .await
    }
}

#[async_trait]
impl DirectorySource for PanClient {
    async fn list_page(&self, path: &str, start: u64, limit: u32) -> Result<ListPage> {
        self.list_dir(path, start, limit).await
    }

    async fn resolve_metas(&self, fs_ids: &[u64]) -> Result<Vec<FileMeta>> {
        self.file_metas(fs_ids).await
    }

    fn identifier(&self) -> String {
        format!("pan://{}", self.base.host_str().unwrap_or_default())
    }
}

/// Render a URL for logs with the access token masked
pub(crate) fn redact_url(url: &Url) -> String {
    let mut shown = url.clone();
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| {
            let v = if k == "access_token" { "***".into() } else { v.into_owned() };
            (k.into_owned(), v)
        })
        .collect();
    if !pairs.is_empty() {
        shown.query_pairs_mut().clear().extend_pairs(pairs);
    }
    shown.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> PanClient {
        PanClient::with_access_token("tok").unwrap()
    }

    #[test]
    fn test_endpoint_url_relative_and_absolute() {
        let client = client();
        assert_eq!(
            client.endpoint_url("/rest/2.0/xpan/file").unwrap().as_str(),
            "https://pan.baidu.com/rest/2.0/xpan/file"
        );
        assert_eq!(
            client
                .endpoint_url("https://openapi.baidu.com/oauth/2.0/token")
                .unwrap()
                .as_str(),
            "https://openapi.baidu.com/oauth/2.0/token"
        );
    }

    #[test]
    fn test_redact_url_masks_token() {
        let url = Url::parse("https://pan.baidu.com/x?dir=%2Fa&access_token=secret").unwrap();
        let shown = redact_url(&url);
        assert!(!shown.contains("secret"));
        assert!(shown.contains("dir=%2Fa"));
    }

    #[test]
    fn test_walk_index_starts_at_zero() {
        assert_eq!(client().walk_index(), 0);
    }

    #[test]
    fn test_identifier() {
        assert_eq!(client().identifier(), "pan://pan.baidu.com");
    }
}
