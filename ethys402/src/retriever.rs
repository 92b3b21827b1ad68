//! Discovery search results as retrievable documents.

use bon::Builder;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::{
    client::EthysClient,
    errors::ClientError,
    transport::{DiscoveryAgent, DiscoverySearchParams},
    types::{AnyJson, Record},
};

/// `source` metadata value of every document produced here.
pub const DOCUMENT_SOURCE: &str = "ethys_discovery";

/// A piece of text plus metadata, as consumed by retrieval pipelines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub page_content: String,
    pub metadata: Record<AnyJson>,
}

impl From<&DiscoveryAgent> for Document {
    fn from(agent: &DiscoveryAgent) -> Self {
        let non_empty = |value: &Option<String>| value.clone().filter(|s| !s.is_empty());
        let service_types = agent
            .service_types
            .as_ref()
            .filter(|types| !types.is_empty());

        let mut lines = Vec::new();
        if let Some(name) = non_empty(&agent.name) {
            lines.push(format!("Agent: {name}"));
        }
        if let Some(description) = non_empty(&agent.description) {
            lines.push(format!("Description: {description}"));
        }
        if let Some(score) = agent.trust_score {
            lines.push(format!("Trust Score: {score}"));
        }
        if let Some(types) = service_types {
            lines.push(format!("Service Types: {}", types.join(", ")));
        }
        if let Some(capabilities) = agent.capabilities.as_ref().filter(|c| !is_empty_json(c)) {
            let rendered = match capabilities {
                AnyJson::String(s) => s.clone(),
                other => other.to_string(),
            };
            lines.push(format!("Capabilities: {rendered}"));
        }

        let mut metadata = Record::new();
        metadata.insert("agent_id".to_string(), json!(agent.agent_id));
        metadata.insert("source".to_string(), json!(DOCUMENT_SOURCE));
        if let Some(key) = non_empty(&agent.agent_id_key) {
            metadata.insert("agent_id_key".to_string(), json!(key));
        }
        if let Some(score) = agent.trust_score {
            metadata.insert("trust_score".to_string(), json!(score));
        }
        if let Some(types) = service_types {
            metadata.insert("service_types".to_string(), json!(types));
        }

        Document {
            page_content: lines.join("\n"),
            metadata,
        }
    }
}

fn is_empty_json(value: &AnyJson) -> bool {
    match value {
        AnyJson::Null => true,
        AnyJson::Bool(b) => !b,
        AnyJson::String(s) => s.is_empty(),
        AnyJson::Array(items) => items.is_empty(),
        AnyJson::Object(map) => map.is_empty(),
        AnyJson::Number(_) => false,
    }
}

/// Searches ETHYS discovery and returns one [`Document`] per agent.
#[derive(Builder, Debug, Clone)]
pub struct DiscoveryRetriever {
    pub client: EthysClient,
    /// `0` disables the filter.
    #[builder(default)]
    pub min_trust_score: u32,
    /// Comma-separated; empty disables the filter.
    #[builder(into, default)]
    pub service_types: String,
    #[builder(default = 10)]
    pub limit: u32,
}

impl DiscoveryRetriever {
    /// Query parameters sent for `query`.
    pub fn search_params(&self, query: &str) -> DiscoverySearchParams {
        DiscoverySearchParams {
            query: Some(query.to_string()),
            min_trust_score: (self.min_trust_score > 0).then_some(self.min_trust_score),
            service_types: (!self.service_types.is_empty()).then(|| self.service_types.clone()),
            limit: Some(self.limit),
            offset: None,
        }
    }

    pub async fn retrieve(&self, query: &str) -> Result<Vec<Document>, ClientError> {
        let response = self
            .client
            .discovery_search(&self.search_params(query))
            .await?;

        #[cfg(feature = "tracing")]
        tracing::debug!(
            "Discovery search '{}' returned {} agents",
            query,
            response.agents.len()
        );

        Ok(response.agents.iter().map(Document::from).collect())
    }
}
