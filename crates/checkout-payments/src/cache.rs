//! Metadata Cache Endpoint
//!
//! Persists side-channel checkout metadata (save-info flag) against the
//! payment before it is confirmed, so server-side webhook processing finds it.

use async_trait::async_trait;
use checkout_core::{CacheError, CheckoutSettings, ConfigError, MetadataCache};
use reqwest::Url;

use crate::csrf::cookie_value;

/// `save_info` value sent when the checkbox is ticked
const SAVE_INFO_ON: &str = "on";

/// Client for the metadata cache endpoint
#[derive(Clone, Debug)]
pub struct HttpMetadataCache {
    client: reqwest::Client,
    endpoint: Url,
    csrf_header: String,
    csrf_token: Option<String>,
}

impl HttpMetadataCache {
    /// Create a client posting to `endpoint`
    pub fn new(endpoint: Url, csrf_token: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint,
            csrf_header: CheckoutSettings::default().csrf_header,
            csrf_token,
        }
    }

    /// Build from page settings.
    ///
    /// Relative endpoints resolve against `origin`; the CSRF token is read
    /// from the page's cookie string.
    pub fn from_settings(
        origin: &str,
        settings: &CheckoutSettings,
        cookies: &str,
    ) -> Result<Self, ConfigError> {
        let endpoint = Url::parse(origin)
            .and_then(|base| base.join(&settings.cache_url))
            .map_err(|e| ConfigError::Malformed {
                id: "cache_url".into(),
                reason: e.to_string(),
            })?;

        let csrf_token = cookie_value(cookies, &settings.csrf_cookie);
        if csrf_token.is_none() {
            tracing::warn!(cookie = %settings.csrf_cookie, "CSRF cookie not found");
        }

        Ok(Self {
            csrf_header: settings.csrf_header.clone(),
            ..Self::new(endpoint, csrf_token)
        })
    }

    pub const fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait(?Send)]
impl MetadataCache for HttpMetadataCache {
    async fn cache_checkout_data(
        &self,
        client_secret: &str,
        save_info: bool,
    ) -> Result<(), CacheError> {
        let save_info = if save_info { SAVE_INFO_ON } else { "" };

        let mut request = self
            .client
            .post(self.endpoint.clone())
            .form(&[("client_secret", client_secret), ("save_info", save_info)]);
        if let Some(token) = &self.csrf_token {
            request = request.header(self.csrf_header.as_str(), token.as_str());
        }

        let response = request
            .send()
            .await
            .map_err(|e| CacheError::Transport(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            tracing::debug!(endpoint = %self.endpoint, "Checkout metadata stored");
            return Ok(());
        }

        let detail = response
            .text()
            .await
            .ok()
            .map(|body| body.trim().to_string())
            .filter(|body| !body.is_empty());

        tracing::warn!(status = status.as_u16(), "Metadata cache rejected the request");
        Err(CacheError::Rejected {
            status: status.as_u16(),
            detail,
        })
    }
}
