//! HTTP client for the ETHYS x402 REST API.

use std::time::Duration;

use http::{
    HeaderMap, HeaderName, HeaderValue,
    header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
};
use reqwest::RequestBuilder;
use serde::{Serialize, de::DeserializeOwned};
use serde_json::json;
use url::Url;

use crate::{
    config::EthysConfig,
    errors::ClientError,
    telemetry::TelemetryTransport,
    transport::{
        ConnectRequest, ConnectResponse, DiscoverySearchParams, DiscoverySearchResponse,
        InfoResponse, ReviewsSubmitRequest, ReviewsSubmitResponse, TelemetryRequest,
        TelemetryResponse, TrustAttestRequest, TrustAttestResponse, TrustScoreParams,
        TrustScoreResponse, VerifyPaymentRequest, VerifyPaymentResponse, paths,
    },
    types::AnyJson,
};

/// Query for requests that take no parameters.
pub const NO_QUERY: &[(&str, &str)] = &[];

/// A client for the ETHYS server.
///
/// Every request carries the default headers (`Content-Type` and `Accept` set
/// to JSON, plus `Authorization: Bearer` when an API key is configured).
/// Cloning is cheap; clones share the underlying connection pool.
#[derive(Debug, Clone)]
pub struct EthysClient {
    pub base_url: Url,
    pub client: reqwest::Client,
    pub headers: HeaderMap,
    timeout: Duration,
}

impl EthysClient {
    pub fn new(config: &EthysConfig) -> Result<Self, ClientError> {
        let base_url = config.parsed_base_url()?;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        if let Some(api_key) = &config.api_key {
            let mut value = HeaderValue::from_str(&format!("Bearer {api_key}"))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(ClientError::Network)?;

        Ok(EthysClient {
            base_url,
            client,
            headers,
            timeout: config.timeout,
        })
    }

    /// Client for the public endpoint with default settings.
    pub fn with_defaults() -> Result<Self, ClientError> {
        EthysClient::new(&EthysConfig::default())
    }

    /// Add a header sent with every request.
    pub fn header(mut self, key: &HeaderName, value: &HeaderValue) -> Self {
        self.headers.insert(key, value.to_owned());
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn url(&self, path: &str) -> Result<Url, ClientError> {
        Ok(self.base_url.join(path.trim_start_matches('/'))?)
    }

    /// `GET` `path` with `query` encoded into the URL, returning the JSON body.
    pub async fn get<Q>(&self, path: &str, query: &Q) -> Result<AnyJson, ClientError>
    where
        Q: Serialize + ?Sized,
    {
        let request = self
            .client
            .get(self.url(path)?)
            .headers(self.headers.clone())
            .query(query);

        self.send(path, request).await
    }

    /// `POST` `body` as JSON to `path`, returning the JSON body.
    ///
    /// `extra_headers` are merged over the default headers for this request only.
    pub async fn post<B>(
        &self,
        path: &str,
        body: &B,
        extra_headers: Option<HeaderMap>,
    ) -> Result<AnyJson, ClientError>
    where
        B: Serialize + ?Sized,
    {
        let mut headers = self.headers.clone();
        if let Some(extra) = extra_headers {
            headers.extend(extra);
        }

        let request = self
            .client
            .post(self.url(path)?)
            .headers(headers)
            .json(body);

        self.send(path, request).await
    }

    async fn send(&self, path: &str, request: RequestBuilder) -> Result<AnyJson, ClientError> {
        let response = request
            .send()
            .await
            .map_err(|err| self.transport_error(path, err))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|err| self.transport_error(path, err))?;

        if !status.is_success() {
            #[cfg(feature = "tracing")]
            tracing::debug!("ETHYS request to '{}' failed with status {}", path, status);

            let body = serde_json::from_str(&text).unwrap_or_else(|_| json!({ "error": text }));
            return Err(ClientError::Api { status, body });
        }

        serde_json::from_str(&text).map_err(|source| ClientError::InvalidResponse {
            path: path.to_string(),
            source,
        })
    }

    fn transport_error(&self, path: &str, err: reqwest::Error) -> ClientError {
        if err.is_timeout() {
            ClientError::Timeout {
                path: path.to_string(),
                timeout: self.timeout,
            }
        } else {
            ClientError::Network(err)
        }
    }

    async fn get_as<T, Q>(&self, path: &str, query: &Q) -> Result<T, ClientError>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        decode(path, self.get(path, query).await?)
    }

    async fn post_as<T, B>(&self, path: &str, body: &B) -> Result<T, ClientError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        decode(path, self.post(path, body, None).await?)
    }

    /// Protocol metadata: pricing, onboarding steps, network and endpoints.
    pub async fn info(&self) -> Result<InfoResponse, ClientError> {
        self.get_as(paths::INFO, NO_QUERY).await
    }

    /// Register an agent with a wallet signature.
    pub async fn connect(&self, request: &ConnectRequest) -> Result<ConnectResponse, ClientError> {
        self.post_as(paths::CONNECT, request).await
    }

    pub async fn verify_payment(
        &self,
        request: &VerifyPaymentRequest,
    ) -> Result<VerifyPaymentResponse, ClientError> {
        self.post_as(paths::VERIFY_PAYMENT, request).await
    }

    /// Submit an already signed telemetry batch.
    pub async fn telemetry(
        &self,
        request: &TelemetryRequest,
    ) -> Result<TelemetryResponse, ClientError> {
        self.post_as(paths::TELEMETRY, request).await
    }

    pub async fn discovery_search(
        &self,
        params: &DiscoverySearchParams,
    ) -> Result<DiscoverySearchResponse, ClientError> {
        self.get_as(paths::DISCOVERY_SEARCH, params).await
    }

    /// Trust metrics of an agent, looked up by id or id key.
    pub async fn trust_score(
        &self,
        params: &TrustScoreParams,
    ) -> Result<TrustScoreResponse, ClientError> {
        let is_blank = |value: &Option<String>| value.as_deref().is_none_or(str::is_empty);
        if is_blank(&params.agent_id) && is_blank(&params.agent_id_key) {
            return Err(ClientError::Validation(
                "Either agent_id or agent_id_key must be provided".to_string(),
            ));
        }

        self.get_as(paths::TRUST_SCORE, params).await
    }

    pub async fn trust_attest(
        &self,
        request: &TrustAttestRequest,
    ) -> Result<TrustAttestResponse, ClientError> {
        if let Some(rating) = request.rating {
            check_rating(rating)?;
        }
        self.post_as(paths::TRUST_ATTEST, request).await
    }

    pub async fn reviews_submit(
        &self,
        request: &ReviewsSubmitRequest,
    ) -> Result<ReviewsSubmitResponse, ClientError> {
        check_rating(request.rating)?;
        self.post_as(paths::REVIEWS_SUBMIT, request).await
    }
}

impl TelemetryTransport for EthysClient {
    type Error = ClientError;

    async fn submit_telemetry(
        &self,
        request: TelemetryRequest,
    ) -> Result<TelemetryResponse, Self::Error> {
        self.telemetry(&request).await
    }
}

fn decode<T: DeserializeOwned>(path: &str, value: AnyJson) -> Result<T, ClientError> {
    serde_json::from_value(value).map_err(|source| ClientError::InvalidResponse {
        path: path.to_string(),
        source,
    })
}

/// Ratings are on a 1 to 5 scale.
pub(crate) fn check_rating(rating: u8) -> Result<(), ClientError> {
    if (1..=5).contains(&rating) {
        Ok(())
    } else {
        Err(ClientError::Validation(
            "rating must be between 1 and 5".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_headers() {
        let client = EthysClient::with_defaults().unwrap();
        assert_eq!(client.headers[CONTENT_TYPE], "application/json");
        assert_eq!(client.headers[ACCEPT], "application/json");
        assert!(!client.headers.contains_key(AUTHORIZATION));
        assert_eq!(client.timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_api_key_sets_bearer_header() {
        let config = EthysConfig::builder().api_key("k-123").build();
        let client = EthysClient::new(&config).unwrap();
        assert_eq!(client.headers[AUTHORIZATION], "Bearer k-123");
        assert!(client.headers[AUTHORIZATION].is_sensitive());
    }

    #[test]
    fn test_bad_api_key_is_rejected() {
        let config = EthysConfig::builder().api_key("line\nbreak").build();
        assert!(matches!(
            EthysClient::new(&config),
            Err(ClientError::InvalidHeader(_))
        ));
    }

    #[test]
    fn test_paths_join_under_base_path() {
        let config = EthysConfig::builder()
            .base_url("https://example.com/proxy")
            .build();
        let client = EthysClient::new(&config).unwrap();
        assert_eq!(
            client.url(paths::INFO).unwrap().as_str(),
            "https://example.com/proxy/api/v1/402/info"
        );
    }

    #[test]
    fn test_rating_bounds() {
        assert!(check_rating(1).is_ok());
        assert!(check_rating(5).is_ok());
        assert!(matches!(check_rating(0), Err(ClientError::Validation(_))));
        assert!(matches!(check_rating(6), Err(ClientError::Validation(_))));
    }
}
