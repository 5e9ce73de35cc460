use serde::Deserialize;
use serde_json::Value;
use tracing::{info, instrument};

use crate::{
    client::PanClient,
    error::{PanError, Result},
    response::ApiResponse,
    transport::Endpoint,
};

/// Token set returned by the authorization-code exchange
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct OAuthToken {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: u64,
    pub scope: String,
    pub session_key: String,
    pub session_secret: String,
}

impl PanClient {
    /// Exchange an out-of-band authorization code for an access token
    ///
    /// Unlike other calls this does not need an existing access token.
    #[instrument(skip(self, code))]
    pub async fn access_token_by_code(&self, code: &str) -> Result<OAuthToken> {
        let credentials = &self.config.credentials;
        let mut url = self.endpoint_url(&self.config.oauth_token_url)?;
        url.query_pairs_mut()
            .append_pair("code", code)
            .append_pair("grant_type", "authorization_code")
            .append_pair("client_id", &credentials.app_key)
            .append_pair("client_secret", &credentials.secret_key)
            .append_pair("redirect_uri", "oob");

        let token = self
            .get_with_retry(url, Endpoint::Token, |response| decode_token(&response))
            .await?;
        info!("Obtained access token, expires in {}s", token.expires_in);
        Ok(token)
    }
}

fn decode_token(response: &ApiResponse) -> Result<OAuthToken> {
    if let Some(err) = response.oauth_error() {
        return Err(err);
    }
    response.required_str("access_token")?;

    Ok(serde_json::from_value(Value::Object(response.as_map().clone()))?)
}

impl OAuthToken {
    /// Fail on a token set without an access token
    pub fn into_access_token(self) -> Result<String> {
        if self.access_token.is_empty() {
            return Err(PanError::MissingAccessToken);
        }
        Ok(self.access_token)
    }
}
