//! HTTP transport for gateway back-channel calls.
//!
//! Requests are posted as `application/x-www-form-urlencoded`; the response
//! body is returned as text for the caller to parse and authenticate.

use crate::infra::config::GatewayConfig;
use crate::infra::error::{GatewayError, GatewayResult};
use std::future::Future;
use std::time::Duration;

/// Form POST seam between the gateway client and the network.
pub trait GatewayTransport: Send + Sync {
    /// Post `form` to `url` and return the response body.
    fn post_form(
        &self,
        url: &str,
        form: &[(String, String)],
    ) -> impl Future<Output = GatewayResult<String>> + Send;
}

/// Settings for [`HttpTransport`].
#[derive(Debug, Clone)]
pub struct HttpTransportConfig {
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for HttpTransportConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            user_agent: concat!("unionpay-gateway/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl From<&GatewayConfig> for HttpTransportConfig {
    fn from(config: &GatewayConfig) -> Self {
        Self {
            timeout: config.timeout(),
            ..Self::default()
        }
    }
}

/// `reqwest` backed transport. No retries: a failed gateway call surfaces
/// to the caller as [`GatewayError::Network`].
#[derive(Debug, Clone)]
pub struct HttpTransport {
    http: reqwest::Client,
}

impl HttpTransport {
    pub fn new(cfg: &HttpTransportConfig) -> GatewayResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(cfg.timeout)
            .user_agent(cfg.user_agent.as_str())
            .build()
            .map_err(|e| GatewayError::Network(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { http })
    }
}

impl GatewayTransport for HttpTransport {
    async fn post_form(&self, url: &str, form: &[(String, String)]) -> GatewayResult<String> {
        log::debug!("gateway POST {url} ({} fields)", form.len());
        let resp = self
            .http
            .post(url)
            .header(
                "Content-Type",
                "application/x-www-form-urlencoded;charset=UTF-8",
            )
            .body(encode_form(form))
            .send()
            .await
            .map_err(|e| GatewayError::Network(format!("HTTP error: {e}")))?;

        if !resp.status().is_success() {
            return Err(GatewayError::Network(format!(
                "HTTP {} from {url}",
                resp.status()
            )));
        }
        resp.text()
            .await
            .map_err(|e| GatewayError::Network(format!("Read body failed: {e}")))
    }
}

/// Form-encode `(name, value)` pairs for a request body.
#[must_use]
pub fn encode_form(form: &[(String, String)]) -> String {
    url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(form.iter().map(|(k, v)| (k.as_str(), v.as_str())))
        .finish()
}
