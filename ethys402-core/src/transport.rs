//! Request and response bodies of the ETHYS x402 REST API.
//!
//! All bodies are camelCase JSON. Query-parameter structs skip absent fields
//! so they can be passed straight to an HTTP client's query builder.

use bon::Builder;
use serde::{Deserialize, Serialize};

use crate::{
    identity::AgentIdKey,
    signing::Nonce,
    types::{AnyJson, EvmAddress, EvmSignature, Record},
};

/// Endpoint paths, relative to the server base URL.
pub mod paths {
    pub const INFO: &str = "/api/v1/402/info";
    pub const CONNECT: &str = "/api/v1/402/connect";
    pub const VERIFY_PAYMENT: &str = "/api/v1/402/verify-payment";
    pub const TELEMETRY: &str = "/api/v1/402/telemetry";
    pub const DISCOVERY_SEARCH: &str = "/api/v1/402/discovery/search";
    pub const TRUST_SCORE: &str = "/api/v1/402/trust/score";
    pub const TRUST_ATTEST: &str = "/api/v1/402/trust/attest";
    pub const REVIEWS_SUBMIT: &str = "/api/v1/402/reviews/submit";
}

/// Response of `GET /info`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InfoResponse {
    pub protocol: String,
    pub name: String,
    pub description: String,
    pub version: String,
    pub onboarding: AnyJson,
    pub pricing: AnyJson,
    pub network: AnyJson,
    pub endpoints: AnyJson,
    #[serde(default)]
    pub features: Vec<String>,
}

impl InfoResponse {
    /// The `onboarding.steps` array, or empty if the server omitted it.
    pub fn onboarding_steps(&self) -> Vec<AnyJson> {
        self.onboarding
            .get("steps")
            .and_then(AnyJson::as_array)
            .cloned()
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectRequest {
    pub address: String,
    /// Wallet signature over `message`.
    pub signature: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectResponse {
    pub success: bool,
    pub agent_id: Option<String>,
    pub agent_id_key: Option<String>,
    pub onboarding: Option<AnyJson>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyPaymentRequest {
    pub agent_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tx_hash: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyPaymentResponse {
    pub success: bool,
    pub message: Option<String>,
    pub agent_id: Option<String>,
    pub api_key: Option<String>,
}

/// A single telemetry event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TelemetryEvent {
    #[serde(alias = "event_type")]
    pub event_type: String,
    /// Unix seconds at which the observed action happened.
    pub timestamp: u64,
    #[serde(default)]
    pub data: Record<AnyJson>,
}

/// Body of `POST /telemetry`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TelemetryRequest {
    pub agent_id: String,
    pub address: EvmAddress,
    pub ts: u64,
    pub nonce: Nonce,
    pub events: Vec<TelemetryEvent>,
    /// EIP-191 signature over the canonical payload of the other fields.
    pub signature: EvmSignature,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TelemetryResponse {
    pub success: bool,
    pub message: Option<String>,
    pub events_processed: Option<u64>,
}

/// Query of `GET /discovery/search`.
#[derive(Builder, Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoverySearchParams {
    #[builder(into)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_trust_score: Option<u32>,
    /// Comma-separated service types.
    #[builder(into)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_types: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveryAgent {
    pub agent_id: String,
    pub agent_id_key: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub trust_score: Option<i64>,
    pub service_types: Option<Vec<String>>,
    pub capabilities: Option<AnyJson>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoverySearchResponse {
    pub success: bool,
    #[serde(default)]
    pub agents: Vec<DiscoveryAgent>,
    pub total: Option<u64>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

/// Query of `GET /trust/score`. At least one field must be set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrustScoreParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent_id_key: Option<String>,
}

impl From<AgentIdKey> for TrustScoreParams {
    fn from(key: AgentIdKey) -> Self {
        TrustScoreParams {
            agent_id: None,
            agent_id_key: Some(key.to_string()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrustScoreResponse {
    pub success: bool,
    pub agent_id: Option<String>,
    pub agent_id_key: Option<String>,
    pub trust_score: Option<i64>,
    pub reliability_score: Option<f64>,
    pub coherence_index: Option<f64>,
    pub endorsement_count: Option<u64>,
}

#[derive(Builder, Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrustAttestRequest {
    #[builder(into)]
    pub agent_id: String,
    #[builder(into)]
    pub target_agent_id: String,
    #[builder(into)]
    pub interaction_type: String,
    /// 1 to 5.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<u8>,
    #[builder(into)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrustAttestResponse {
    pub success: bool,
    pub message: Option<String>,
    pub attestation_id: Option<String>,
}

/// Body of `POST /reviews/submit`: an EIP-712 signed client review.
#[derive(Builder, Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewsSubmitRequest {
    #[builder(into)]
    pub agent_id: String,
    /// 1 to 5.
    pub rating: u8,
    #[builder(into)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub review_text: Option<String>,
    #[builder(into)]
    pub signature: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<AnyJson>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub types: Option<AnyJson>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<AnyJson>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewsSubmitResponse {
    pub success: bool,
    pub message: Option<String>,
    pub review_id: Option<String>,
}
