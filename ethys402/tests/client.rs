mod common;

use std::time::Duration;

use common::MockEthys;
use ethys402::{
    client::{EthysClient, NO_QUERY},
    config::EthysConfig,
    errors::ClientError,
    transport::{DiscoverySearchParams, TrustScoreParams, VerifyPaymentRequest, paths},
};
use http::{HeaderMap, HeaderValue, StatusCode};
use serde_json::json;
use wiremock::{
    Mock, ResponseTemplate,
    matchers::{body_json, header, method, path, query_param, query_param_is_missing},
};

fn info_body() -> serde_json::Value {
    json!({
        "protocol": "x402",
        "name": "ETHYS",
        "description": "Agent trust network",
        "version": "1.2.0",
        "onboarding": { "steps": ["connect", "buy tier", "verify payment"] },
        "pricing": { "tiers": [] },
        "network": { "chainId": 8453 },
        "endpoints": { "info": "/api/v1/402/info" },
        "features": ["telemetry", "discovery"]
    })
}

#[tokio::test]
async fn test_info_sends_json_headers() {
    let mock = MockEthys::start().await;
    Mock::given(method("GET"))
        .and(path(paths::INFO))
        .and(header("accept", "application/json"))
        .and(header("content-type", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(info_body()))
        .expect(1)
        .mount(&mock.server)
        .await;

    let info = mock.client().info().await.unwrap();

    assert_eq!(info.protocol, "x402");
    assert_eq!(info.version, "1.2.0");
    assert_eq!(info.onboarding_steps().len(), 3);
    assert_eq!(info.features, vec!["telemetry", "discovery"]);
}

#[tokio::test]
async fn test_api_key_is_sent_as_bearer() {
    let mock = MockEthys::start().await;
    Mock::given(method("GET"))
        .and(path(paths::INFO))
        .and(header("authorization", "Bearer test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(info_body()))
        .expect(1)
        .mount(&mock.server)
        .await;

    let config = EthysConfig::builder()
        .base_url(mock.server.uri())
        .api_key("test-key")
        .build();
    let client = EthysClient::new(&config).unwrap();

    client.info().await.unwrap();
}

#[tokio::test]
async fn test_error_status_with_json_body() {
    let mock = MockEthys::start().await;
    mock.mock_get(paths::INFO, 404, json!({ "error": "not found", "code": 404 }))
        .await;

    let err = mock.client().info().await.unwrap_err();

    assert_eq!(err.status(), Some(StatusCode::NOT_FOUND));
    match err {
        ClientError::Api { body, .. } => {
            assert_eq!(body, json!({ "error": "not found", "code": 404 }))
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[tokio::test]
async fn test_error_status_with_text_body() {
    let mock = MockEthys::start().await;
    Mock::given(method("POST"))
        .and(path(paths::VERIFY_PAYMENT))
        .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
        .mount(&mock.server)
        .await;

    let request = VerifyPaymentRequest {
        agent_id: "agent-1".to_string(),
        tx_hash: None,
    };
    let err = mock.client().verify_payment(&request).await.unwrap_err();

    match err {
        ClientError::Api { status, body } => {
            assert_eq!(status, StatusCode::BAD_GATEWAY);
            assert_eq!(body, json!({ "error": "Bad Gateway" }));
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[tokio::test]
async fn test_undecodable_success_body() {
    let mock = MockEthys::start().await;
    Mock::given(method("GET"))
        .and(path(paths::INFO))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&mock.server)
        .await;

    let err = mock.client().info().await.unwrap_err();
    assert!(matches!(err, ClientError::InvalidResponse { path, .. } if path == paths::INFO));

    // Valid JSON of the wrong shape is also rejected.
    let mock = MockEthys::start().await;
    mock.mock_get(paths::INFO, 200, json!({ "protocol": 402 })).await;
    let err = mock.client().info().await.unwrap_err();
    assert!(matches!(err, ClientError::InvalidResponse { .. }));
}

#[tokio::test]
async fn test_timeout() {
    let mock = MockEthys::start().await;
    Mock::given(method("GET"))
        .and(path(paths::INFO))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(info_body())
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&mock.server)
        .await;

    let config = EthysConfig::builder()
        .base_url(mock.server.uri())
        .timeout(Duration::from_millis(100))
        .build();
    let err = EthysClient::new(&config).unwrap().info().await.unwrap_err();

    match err {
        ClientError::Timeout { path, timeout } => {
            assert_eq!(path, paths::INFO);
            assert_eq!(timeout, Duration::from_millis(100));
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[tokio::test]
async fn test_connection_refused_is_network_error() {
    let config = EthysConfig::builder()
        .base_url("http://127.0.0.1:1")
        .timeout(Duration::from_secs(2))
        .build();
    let err = EthysClient::new(&config).unwrap().info().await.unwrap_err();
    assert!(matches!(err, ClientError::Network(_)), "got {err:?}");
}

#[tokio::test]
async fn test_discovery_query_skips_absent_params() {
    let mock = MockEthys::start().await;
    Mock::given(method("GET"))
        .and(path(paths::DISCOVERY_SEARCH))
        .and(query_param("query", "translation"))
        .and(query_param("minTrustScore", "50"))
        .and(query_param_is_missing("offset"))
        .and(query_param_is_missing("serviceTypes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "agents": [{ "agentId": "agent-1", "trustScore": 80 }],
            "total": 1
        })))
        .expect(1)
        .mount(&mock.server)
        .await;

    let params = DiscoverySearchParams::builder()
        .query("translation")
        .min_trust_score(50)
        .build();
    let response = mock.client().discovery_search(&params).await.unwrap();

    assert_eq!(response.agents.len(), 1);
    assert_eq!(response.agents[0].trust_score, Some(80));
    assert_eq!(response.total, Some(1));
    assert_eq!(response.offset, None);
}

#[tokio::test]
async fn test_trust_score_requires_an_identifier() {
    let mock = MockEthys::start().await;
    mock.expect_no_requests().await;

    let err = mock
        .client()
        .trust_score(&TrustScoreParams {
            agent_id: Some(String::new()),
            agent_id_key: None,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Validation(_)));
}

#[tokio::test]
async fn test_post_merges_extra_headers() {
    let mock = MockEthys::start().await;
    Mock::given(method("POST"))
        .and(path("/custom"))
        .and(header("x-payment", "proof"))
        .and(header("accept", "application/json"))
        .and(body_json(json!({ "hello": "world" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
        .expect(1)
        .mount(&mock.server)
        .await;

    let mut extra = HeaderMap::new();
    extra.insert("x-payment", HeaderValue::from_static("proof"));

    let body = mock
        .client()
        .post("/custom", &json!({ "hello": "world" }), Some(extra))
        .await
        .unwrap();
    assert_eq!(body, json!({ "ok": true }));
}

#[tokio::test]
async fn test_raw_get_with_no_query() {
    let mock = MockEthys::start().await;
    mock.mock_get("/api/v1/402/anything", 200, json!([1, 2, 3])).await;

    let body = mock
        .client()
        .get("/api/v1/402/anything", NO_QUERY)
        .await
        .unwrap();
    assert_eq!(body, json!([1, 2, 3]));
}
