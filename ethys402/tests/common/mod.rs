//! Mock ETHYS server shared by the integration tests.
#![allow(dead_code)]

use std::time::Duration;

use ethys402::{client::EthysClient, config::EthysConfig};
use serde_json::Value;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path},
};

/// Well-known development key, never holds funds.
pub const TEST_KEY: &str = "0x4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318";

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing_subscriber::filter::LevelFilter::DEBUG)
        .with_test_writer()
        .try_init();
}

pub struct MockEthys {
    pub server: MockServer,
}

impl MockEthys {
    pub async fn start() -> Self {
        init_tracing();
        MockEthys {
            server: MockServer::start().await,
        }
    }

    pub fn config(&self) -> EthysConfig {
        EthysConfig::builder()
            .base_url(self.server.uri())
            .timeout(Duration::from_secs(5))
            .build()
    }

    pub fn client(&self) -> EthysClient {
        EthysClient::new(&self.config()).expect("valid mock config")
    }

    /// Answer `GET route` with `status` and a JSON body.
    pub async fn mock_get(&self, route: &str, status: u16, body: Value) {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(status).set_body_json(body))
            .mount(&self.server)
            .await;
    }

    /// Answer `POST route` with `status` and a JSON body.
    pub async fn mock_post(&self, route: &str, status: u16, body: Value) {
        Mock::given(method("POST"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(status).set_body_json(body))
            .mount(&self.server)
            .await;
    }

    /// Fail the test if any request reaches the server.
    pub async fn expect_no_requests(&self) {
        Mock::given(wiremock::matchers::any())
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(&self.server)
            .await;
    }

    /// JSON bodies of every request received so far.
    pub async fn received_bodies(&self) -> Vec<Value> {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .map(|request| request.body_json::<Value>().expect("JSON request body"))
            .collect()
    }
}
