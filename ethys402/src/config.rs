use std::{fmt::Debug, time::Duration};

use bon::Builder;
use url::Url;

use crate::errors::ClientError;

/// Public ETHYS x402 endpoint.
pub const DEFAULT_BASE_URL: &str = "https://402.ethys.dev";

/// Request timeout used when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Connection settings for [`EthysClient`](crate::client::EthysClient).
///
/// ```
/// use std::time::Duration;
/// use ethys402::config::EthysConfig;
///
/// let config = EthysConfig::builder()
///     .base_url("http://localhost:8080/")
///     .api_key("secret")
///     .timeout(Duration::from_secs(5))
///     .build();
///
/// assert_eq!(config.parsed_base_url().unwrap().as_str(), "http://localhost:8080/");
/// ```
#[derive(Builder, Clone, PartialEq, Eq)]
pub struct EthysConfig {
    /// Server base URL, `http://` or `https://`.
    #[builder(into, default = DEFAULT_BASE_URL.to_string())]
    pub base_url: String,
    /// Sent as `Authorization: Bearer <api_key>` when set.
    #[builder(into)]
    pub api_key: Option<String>,
    #[builder(default = DEFAULT_TIMEOUT)]
    pub timeout: Duration,
}

impl Default for EthysConfig {
    fn default() -> Self {
        EthysConfig::builder().build()
    }
}

impl EthysConfig {
    /// Validate and parse the base URL.
    ///
    /// Trailing slashes are normalized so that the returned URL always ends in
    /// exactly one `/`, ready for relative joins.
    pub fn parsed_base_url(&self) -> Result<Url, ClientError> {
        let trimmed = self.base_url.trim();
        if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
            return Err(ClientError::InvalidBaseUrl(self.base_url.clone()));
        }

        let url = Url::parse(&format!("{}/", trimmed.trim_end_matches('/')))?;
        Ok(url)
    }
}

impl Debug for EthysConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EthysConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("timeout", &self.timeout)
            .finish()
    }
}
