mod common;

use common::MockEthys;
use ethys402::{retriever::DiscoveryRetriever, transport::paths};
use serde_json::json;
use wiremock::{
    Mock, ResponseTemplate,
    matchers::{method, path, query_param, query_param_is_missing},
};

#[tokio::test]
async fn test_retrieve_builds_documents() {
    let mock = MockEthys::start().await;
    Mock::given(method("GET"))
        .and(path(paths::DISCOVERY_SEARCH))
        .and(query_param("query", "summarize legal documents"))
        .and(query_param("limit", "10"))
        .and(query_param_is_missing("minTrustScore"))
        .and(query_param_is_missing("serviceTypes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "agents": [
                {
                    "agentId": "agent-1",
                    "agentIdKey": "0x01",
                    "name": "LexBot",
                    "description": "Legal summaries",
                    "trustScore": 93,
                    "serviceTypes": ["summarization", "legal"]
                },
                { "agentId": "agent-2" }
            ]
        })))
        .expect(1)
        .mount(&mock.server)
        .await;

    let retriever = DiscoveryRetriever::builder().client(mock.client()).build();
    let documents = retriever.retrieve("summarize legal documents").await.unwrap();

    assert_eq!(documents.len(), 2);
    assert_eq!(
        documents[0].page_content,
        "Agent: LexBot\nDescription: Legal summaries\nTrust Score: 93\nService Types: summarization, legal"
    );
    assert_eq!(documents[0].metadata["agent_id_key"], "0x01");
    assert_eq!(documents[0].metadata["trust_score"], 93);

    assert_eq!(documents[1].page_content, "");
    assert_eq!(documents[1].metadata["agent_id"], "agent-2");
    assert_eq!(documents[1].metadata["source"], "ethys_discovery");
    assert!(!documents[1].metadata.contains_key("trust_score"));
}

#[tokio::test]
async fn test_retrieve_forwards_filters() {
    let mock = MockEthys::start().await;
    Mock::given(method("GET"))
        .and(path(paths::DISCOVERY_SEARCH))
        .and(query_param("minTrustScore", "60"))
        .and(query_param("serviceTypes", "ocr,vision"))
        .and(query_param("limit", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "agents": []
        })))
        .expect(1)
        .mount(&mock.server)
        .await;

    let retriever = DiscoveryRetriever::builder()
        .client(mock.client())
        .min_trust_score(60)
        .service_types("ocr,vision")
        .limit(2)
        .build();

    assert!(retriever.retrieve("scan receipts").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_retrieve_surfaces_api_errors() {
    let mock = MockEthys::start().await;
    mock.mock_get(paths::DISCOVERY_SEARCH, 503, json!({ "error": "maintenance" }))
        .await;

    let retriever = DiscoveryRetriever::builder().client(mock.client()).build();
    let err = retriever.retrieve("anything").await.unwrap_err();

    assert_eq!(err.status().map(|s| s.as_u16()), Some(503));
}
