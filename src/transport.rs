use std::any::Any;
use std::panic::AssertUnwindSafe;

use futures::FutureExt;
use reqwest::{StatusCode, Url};
use tracing::{debug, instrument, warn};

use crate::{
    client::{redact_url, PanClient},
    error::{PanError, Result},
    response::ApiResponse,
};

/// How a non-200 response body is interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Endpoint {
    /// REST API: every non-200 status is a retryable status error
    Api,
    /// OAuth token endpoint: a JSON `error` body is a final OAuth error
    Token,
}

impl PanClient {
    /// Signed, retried GET against the API
    ///
    /// `path` is relative to the configured host (it may carry its own
    /// query string) or an absolute URL. The access token is appended to
    /// the query of every request.
    pub async fn api_get(&self, path: &str, query: &[(&str, String)]) -> Result<ApiResponse> {
        self.api_get_with(path, query, Ok).await
    }

    /// Like `api_get`, with `decode` run inside each attempt
    ///
    /// A shape or decode error (or panic) raised by `decode` fails that
    /// attempt and is retried like a transport error.
    #[instrument(skip(self, query, decode), fields(path = %path))]
    pub async fn api_get_with<T, D>(
        &self,
        path: &str,
        query: &[(&str, String)],
        decode: D,
    ) -> Result<T>
    where
        T: Send,
        D: FnMut(ApiResponse) -> Result<T> + Send,
    {
        let token = &self.config.credentials.access_token;
        if token.is_empty() {
            return Err(PanError::MissingAccessToken);
        }

        let mut url = self.endpoint_url(path)?;
        url.query_pairs_mut()
            .extend_pairs(query.iter().map(|(k, v)| (*k, v.as_str())))
            .append_pair("access_token", token);

        self.get_with_retry(url, Endpoint::Api, decode).await
    }

    /// Run one GET under the configured retry policy
    ///
    /// Every failure except a non-retryable one is retried with an
    /// exponentially growing delay until the attempt budget is spent.
    pub(crate) async fn get_with_retry<T, D>(
        &self,
        url: Url,
        endpoint: Endpoint,
        mut decode: D,
    ) -> Result<T>
    where
        T: Send,
        D: FnMut(ApiResponse) -> Result<T> + Send,
    {
        let policy = self.config.retry;
        let shown = redact_url(&url);
        let mut attempt = 0;

        loop {
            attempt += 1;

            let outcome = AssertUnwindSafe(self.attempt(&url, endpoint, &mut decode))
                .catch_unwind()
                .await
                .unwrap_or_else(|payload| {
                    Err(PanError::AttemptPanicked {
                        message: panic_message(payload.as_ref()),
                    })
                });

            match outcome {
                Ok(value) => {
                    debug!("API request succeeded: url={} attempt={}", shown, attempt);
                    return Ok(value);
                }
                Err(e) if e.is_retryable() && attempt < policy.attempts => {
                    let delay = policy.delay_after(attempt);
                    warn!(
                        "API request failed (attempt {}/{}): {}, retrying in {:?}",
                        attempt, policy.attempts, e, delay
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    warn!(
                        "API request failed after {} attempt(s): url={} error={}",
                        attempt, shown, e
                    );
                    return Err(e);
                }
            }
        }
    }

    async fn attempt<T, D>(&self, url: &Url, endpoint: Endpoint, decode: &mut D) -> Result<T>
    where
        D: FnMut(ApiResponse) -> Result<T>,
    {
        // The request URL carries the access token; keep it out of errors
        let response = self
            .http
            .get(url.clone())
            .send()
            .await
            .map_err(|e| PanError::Network(e.without_url()))?;
        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| PanError::Network(e.without_url()))?;

        if status != StatusCode::OK {
            if endpoint == Endpoint::Token {
                if let Some(err) = ApiResponse::from_slice(&body)
                    .ok()
                    .and_then(|res| res.oauth_error())
                {
                    return Err(err);
                }
            }
            return Err(PanError::Status {
                status: status.as_u16(),
            });
        }

        let response = ApiResponse::from_slice(&body)?;
        response.check_errno()?;
        decode(response)
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
