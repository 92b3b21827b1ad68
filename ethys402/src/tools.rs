//! The ETHYS API as named tools for an agent host.
//!
//! Each [`ToolKind`] has a stable name, a description and a JSON schema of its
//! arguments. [`Toolkit::invoke`] decodes the arguments, validates them, calls
//! the server and returns a snake_case JSON result.
//!
//! ```no_run
//! # async fn run() -> Result<(), ethys402::errors::ClientError> {
//! use ethys402::{client::EthysClient, tools::Toolkit};
//! use serde_json::json;
//!
//! let toolkit = Toolkit::new(EthysClient::with_defaults()?);
//! let score = toolkit
//!     .invoke("ethys_trust_score", json!({ "agent_id": "agent-42" }))
//!     .await?;
//! println!("{}", score["trust_score"]);
//! # Ok(())
//! # }
//! ```

use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::json;

use crate::{
    client::EthysClient,
    errors::ClientError,
    signing::Nonce,
    transport::{
        ConnectRequest, DiscoverySearchParams, ReviewsSubmitRequest, TelemetryEvent,
        TelemetryRequest, TrustAttestRequest, TrustScoreParams, VerifyPaymentRequest,
    },
    types::{AnyJson, EvmAddress, EvmSignature},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolKind {
    GetInfo,
    Connect,
    VerifyPayment,
    Telemetry,
    DiscoverySearch,
    TrustScore,
    TrustAttest,
    ReviewsSubmit,
}

impl ToolKind {
    pub const ALL: [ToolKind; 8] = [
        ToolKind::GetInfo,
        ToolKind::Connect,
        ToolKind::VerifyPayment,
        ToolKind::Telemetry,
        ToolKind::DiscoverySearch,
        ToolKind::TrustScore,
        ToolKind::TrustAttest,
        ToolKind::ReviewsSubmit,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            ToolKind::GetInfo => "ethys_get_info",
            ToolKind::Connect => "ethys_connect",
            ToolKind::VerifyPayment => "ethys_verify_payment",
            ToolKind::Telemetry => "ethys_telemetry",
            ToolKind::DiscoverySearch => "ethys_discovery_search",
            ToolKind::TrustScore => "ethys_trust_score",
            ToolKind::TrustAttest => "ethys_trust_attest",
            ToolKind::ReviewsSubmit => "ethys_reviews_submit",
        }
    }

    pub const fn description(self) -> &'static str {
        match self {
            ToolKind::GetInfo => {
                "Get ETHYS x402 protocol information including pricing, onboarding steps, \
                 network configuration, and available endpoints. No authentication required."
            }
            ToolKind::Connect => {
                "Connect/register an agent with ETHYS using a wallet signature. \
                 Requires: address (wallet address), signature (wallet signature), \
                 and message (the message that was signed). \
                 Returns agent_id and onboarding information."
            }
            ToolKind::VerifyPayment => {
                "Verify an ETHYS payment transaction after purchasing a tier on the contract. \
                 Requires: agent_id (from connect) and optionally tx_hash (transaction hash). \
                 Returns success status and API key if payment is verified."
            }
            ToolKind::Telemetry => {
                "Submit agent telemetry events with a wallet signature. \
                 Requires: agent_id, address, timestamp, nonce, events (list of event objects), \
                 and signature (wallet signature of the payload). \
                 Returns success status and number of events processed."
            }
            ToolKind::DiscoverySearch => {
                "Search for agents in the ETHYS discovery system. \
                 Optional parameters: query (search string), min_trust_score (minimum score), \
                 service_types (comma-separated list), limit (max results), offset (pagination). \
                 Returns matching agents with their trust scores and service types."
            }
            ToolKind::TrustScore => {
                "Get an agent's trust score and reputation metrics. \
                 Requires either agent_id or agent_id_key. \
                 Returns trust_score, reliability_score, coherence_index, and endorsement_count."
            }
            ToolKind::TrustAttest => {
                "Submit a trust attestation for an interaction with another agent. \
                 Requires: agent_id, target_agent_id, interaction_type, \
                 and optionally rating (1-5) and notes. \
                 Returns success status and attestation_id."
            }
            ToolKind::ReviewsSubmit => {
                "Submit a client review with an EIP-712 signature. \
                 Requires: agent_id (being reviewed), rating (1-5), signature (EIP-712), \
                 and optionally review_text, domain, types, message (EIP-712 components). \
                 Returns success status and review_id."
            }
        }
    }

    /// JSON schema of the tool's arguments.
    pub fn input_schema(self) -> AnyJson {
        match self {
            ToolKind::GetInfo => object_schema(json!({}), &[]),
            ToolKind::Connect => object_schema(
                json!({
                    "address": string("Ethereum wallet address (0x-prefixed)"),
                    "signature": string("Wallet signature of the message"),
                    "message": string("Message that was signed"),
                }),
                &["address", "signature", "message"],
            ),
            ToolKind::VerifyPayment => object_schema(
                json!({
                    "agent_id": string("Agent ID from connect step"),
                    "tx_hash": string("Transaction hash (optional)"),
                }),
                &["agent_id"],
            ),
            ToolKind::Telemetry => object_schema(
                json!({
                    "agent_id": string("Agent ID"),
                    "address": string("Wallet address"),
                    "timestamp": integer("Unix timestamp"),
                    "nonce": string("32-byte hex nonce"),
                    "events": {
                        "type": "array",
                        "description": "List of telemetry events",
                        "items": {
                            "type": "object",
                            "properties": {
                                "eventType": string("Event type identifier"),
                                "timestamp": integer("Unix timestamp"),
                                "data": { "type": "object", "description": "Event data" },
                            },
                            "required": ["eventType", "timestamp"],
                        },
                    },
                    "signature": string("Wallet signature of the telemetry payload"),
                }),
                &["agent_id", "address", "timestamp", "nonce", "events", "signature"],
            ),
            ToolKind::DiscoverySearch => object_schema(
                json!({
                    "query": string("Search query string"),
                    "min_trust_score": integer("Minimum trust score"),
                    "service_types": string("Comma-separated service types"),
                    "limit": integer("Maximum number of results"),
                    "offset": integer("Pagination offset"),
                }),
                &[],
            ),
            ToolKind::TrustScore => object_schema(
                json!({
                    "agent_id": string("Agent ID"),
                    "agent_id_key": string("Agent ID key (bytes32 hex)"),
                }),
                &[],
            ),
            ToolKind::TrustAttest => object_schema(
                json!({
                    "agent_id": string("Your agent ID"),
                    "target_agent_id": string("Target agent ID"),
                    "interaction_type": string("Type of interaction"),
                    "rating": rating("Rating (1-5)"),
                    "notes": string("Optional notes"),
                }),
                &["agent_id", "target_agent_id", "interaction_type"],
            ),
            ToolKind::ReviewsSubmit => object_schema(
                json!({
                    "agent_id": string("Agent ID being reviewed"),
                    "rating": rating("Rating (1-5)"),
                    "signature": string("EIP-712 signature"),
                    "review_text": string("Review text"),
                    "domain": { "type": "object", "description": "EIP-712 domain" },
                    "types": { "type": "object", "description": "EIP-712 types" },
                    "message": { "type": "object", "description": "EIP-712 message" },
                }),
                &["agent_id", "rating", "signature"],
            ),
        }
    }

    pub fn definition(self) -> ToolDefinition {
        ToolDefinition {
            name: self.name(),
            description: self.description(),
            input_schema: self.input_schema(),
        }
    }
}

impl FromStr for ToolKind {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ToolKind::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| ClientError::UnknownTool(s.to_string()))
    }
}

impl Display for ToolKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// What a host needs to advertise a tool to a model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolDefinition {
    pub name: &'static str,
    pub description: &'static str,
    pub input_schema: AnyJson,
}

fn string(description: &str) -> AnyJson {
    json!({ "type": "string", "description": description })
}

fn integer(description: &str) -> AnyJson {
    json!({ "type": "integer", "description": description })
}

fn rating(description: &str) -> AnyJson {
    json!({ "type": "integer", "minimum": 1, "maximum": 5, "description": description })
}

fn object_schema(properties: AnyJson, required: &[&str]) -> AnyJson {
    json!({
        "type": "object",
        "properties": properties,
        "required": required,
    })
}

#[derive(Debug, Clone, Deserialize)]
struct ConnectInput {
    address: String,
    signature: String,
    message: String,
}

#[derive(Debug, Clone, Deserialize)]
struct VerifyPaymentInput {
    agent_id: String,
    tx_hash: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct TelemetryInput {
    agent_id: String,
    address: EvmAddress,
    timestamp: u64,
    nonce: Nonce,
    events: Vec<TelemetryEvent>,
    signature: EvmSignature,
}

#[derive(Debug, Clone, Deserialize)]
struct DiscoverySearchInput {
    query: Option<String>,
    min_trust_score: Option<u32>,
    service_types: Option<String>,
    limit: Option<u32>,
    offset: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
struct TrustScoreInput {
    agent_id: Option<String>,
    agent_id_key: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct TrustAttestInput {
    agent_id: String,
    target_agent_id: String,
    interaction_type: String,
    rating: Option<u8>,
    notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct ReviewsSubmitInput {
    agent_id: String,
    rating: u8,
    signature: String,
    review_text: Option<String>,
    domain: Option<AnyJson>,
    types: Option<AnyJson>,
    message: Option<AnyJson>,
}

/// Decode tool arguments. A missing (`null`) argument object reads as `{}`.
fn decode_args<T: DeserializeOwned>(kind: ToolKind, args: AnyJson) -> Result<T, ClientError> {
    let args = if args.is_null() { json!({}) } else { args };
    serde_json::from_value(args)
        .map_err(|err| ClientError::Validation(format!("invalid arguments for {kind}: {err}")))
}

/// Runs ETHYS tools against one client.
#[derive(Debug, Clone)]
pub struct Toolkit {
    client: EthysClient,
}

impl Toolkit {
    pub fn new(client: EthysClient) -> Self {
        Toolkit { client }
    }

    pub fn client(&self) -> &EthysClient {
        &self.client
    }

    /// Definitions of every tool, in a stable order.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        ToolKind::ALL.into_iter().map(ToolKind::definition).collect()
    }

    /// Run the tool called `name` with JSON `args`.
    pub async fn invoke(&self, name: &str, args: AnyJson) -> Result<AnyJson, ClientError> {
        let kind: ToolKind = name.parse()?;
        self.invoke_kind(kind, args).await
    }

    pub async fn invoke_kind(&self, kind: ToolKind, args: AnyJson) -> Result<AnyJson, ClientError> {
        #[cfg(feature = "tracing")]
        tracing::debug!("Invoking tool '{}'", kind);

        match kind {
            ToolKind::GetInfo => self.get_info().await,
            ToolKind::Connect => self.connect(decode_args(kind, args)?).await,
            ToolKind::VerifyPayment => self.verify_payment(decode_args(kind, args)?).await,
            ToolKind::Telemetry => self.telemetry(decode_args(kind, args)?).await,
            ToolKind::DiscoverySearch => self.discovery_search(decode_args(kind, args)?).await,
            ToolKind::TrustScore => self.trust_score(decode_args(kind, args)?).await,
            ToolKind::TrustAttest => self.trust_attest(decode_args(kind, args)?).await,
            ToolKind::ReviewsSubmit => self.reviews_submit(decode_args(kind, args)?).await,
        }
    }

    async fn get_info(&self) -> Result<AnyJson, ClientError> {
        let info = self.client.info().await?;
        Ok(json!({
            "success": true,
            "protocol": info.protocol,
            "version": info.version,
            "description": info.description,
            "pricing": info.pricing,
            "onboarding_steps": info.onboarding_steps(),
            "network": info.network,
            "endpoints": info.endpoints,
            "features": info.features,
        }))
    }

    async fn connect(&self, input: ConnectInput) -> Result<AnyJson, ClientError> {
        let request = ConnectRequest {
            address: input.address,
            signature: input.signature,
            message: input.message,
        };
        let response = self.client.connect(&request).await?;
        Ok(json!({
            "success": response.success,
            "agent_id": response.agent_id,
            "agent_id_key": response.agent_id_key,
            "onboarding": response.onboarding,
        }))
    }

    async fn verify_payment(&self, input: VerifyPaymentInput) -> Result<AnyJson, ClientError> {
        let request = VerifyPaymentRequest {
            agent_id: input.agent_id,
            tx_hash: input.tx_hash,
        };
        let response = self.client.verify_payment(&request).await?;
        Ok(json!({
            "success": response.success,
            "message": response.message,
            "agent_id": response.agent_id,
            "api_key": response.api_key,
        }))
    }

    async fn telemetry(&self, input: TelemetryInput) -> Result<AnyJson, ClientError> {
        let request = TelemetryRequest {
            agent_id: input.agent_id,
            address: input.address,
            ts: input.timestamp,
            nonce: input.nonce,
            events: input.events,
            signature: input.signature,
        };
        let response = self.client.telemetry(&request).await?;
        Ok(json!({
            "success": response.success,
            "message": response.message,
            "events_processed": response.events_processed,
        }))
    }

    async fn discovery_search(&self, input: DiscoverySearchInput) -> Result<AnyJson, ClientError> {
        let params = DiscoverySearchParams {
            query: input.query,
            min_trust_score: input.min_trust_score,
            service_types: input.service_types,
            limit: input.limit,
            offset: input.offset,
        };
        let response = self.client.discovery_search(&params).await?;

        let agents: Vec<AnyJson> = response
            .agents
            .iter()
            .map(|agent| {
                json!({
                    "agent_id": agent.agent_id,
                    "name": agent.name,
                    "trust_score": agent.trust_score,
                    "service_types": agent.service_types,
                })
            })
            .collect();

        Ok(json!({
            "success": response.success,
            "agents": agents,
            "total": response.total,
            "limit": response.limit,
            "offset": response.offset,
        }))
    }

    async fn trust_score(&self, input: TrustScoreInput) -> Result<AnyJson, ClientError> {
        let params = TrustScoreParams {
            agent_id: input.agent_id,
            agent_id_key: input.agent_id_key,
        };
        let response = self.client.trust_score(&params).await?;
        Ok(json!({
            "success": response.success,
            "agent_id": response.agent_id,
            "agent_id_key": response.agent_id_key,
            "trust_score": response.trust_score,
            "reliability_score": response.reliability_score,
            "coherence_index": response.coherence_index,
            "endorsement_count": response.endorsement_count,
        }))
    }

    async fn trust_attest(&self, input: TrustAttestInput) -> Result<AnyJson, ClientError> {
        let request = TrustAttestRequest {
            agent_id: input.agent_id,
            target_agent_id: input.target_agent_id,
            interaction_type: input.interaction_type,
            rating: input.rating,
            notes: input.notes,
        };
        let response = self.client.trust_attest(&request).await?;
        Ok(json!({
            "success": response.success,
            "message": response.message,
            "attestation_id": response.attestation_id,
        }))
    }

    async fn reviews_submit(&self, input: ReviewsSubmitInput) -> Result<AnyJson, ClientError> {
        let request = ReviewsSubmitRequest {
            agent_id: input.agent_id,
            rating: input.rating,
            review_text: input.review_text,
            signature: input.signature,
            domain: input.domain,
            types: input.types,
            message: input.message,
        };
        let response = self.client.reviews_submit(&request).await?;
        Ok(json!({
            "success": response.success,
            "message": response.message,
            "review_id": response.review_id,
        }))
    }
}
