mod common;

use std::sync::Arc;

use common::{MockEthys, TEST_KEY};
use ethys402::{
    client::EthysClient,
    signing::{build_signable_payload, signer_from_key, verify_signature},
    telemetry::{FlushOutcome, TelemetryBatcher, TelemetryCallback},
    transport::{TelemetryRequest, paths},
    types::Record,
};
use serde_json::json;
use wiremock::{
    Mock, ResponseTemplate,
    matchers::{method, path},
};

fn batcher(mock: &MockEthys, batch_size: usize) -> TelemetryBatcher<EthysClient> {
    TelemetryBatcher::builder()
        .transport(Arc::new(mock.client()))
        .signer(signer_from_key(TEST_KEY).unwrap())
        .agent_id("agent-1")
        .batch_size(batch_size)
        .build()
}

async fn accept_telemetry(mock: &MockEthys) {
    mock.mock_post(
        paths::TELEMETRY,
        200,
        json!({ "success": true, "eventsProcessed": 2 }),
    )
    .await;
}

#[tokio::test]
async fn test_batch_reaches_server_signed() {
    let mock = MockEthys::start().await;
    accept_telemetry(&mock).await;

    let mut batcher = batcher(&mock, 2);
    batcher
        .record("tool_start", Record::from([("tool".to_string(), json!("search"))]))
        .await;
    let outcome = batcher.record("tool_end", Record::new()).await;

    assert_eq!(
        outcome,
        FlushOutcome::Sent {
            events: 2,
            events_processed: Some(2)
        }
    );

    let bodies = mock.received_bodies().await;
    assert_eq!(bodies.len(), 1);
    let body = &bodies[0];

    let mut keys: Vec<&str> = body.as_object().unwrap().keys().map(String::as_str).collect();
    keys.sort();
    assert_eq!(keys, ["address", "agentId", "events", "nonce", "signature", "ts"]);
    assert_eq!(body["events"][0]["eventType"], "tool_start");
    assert_eq!(body["events"][0]["data"]["tool"], "search");

    let request: TelemetryRequest = serde_json::from_value(body.clone()).unwrap();
    let payload = build_signable_payload(
        &request.agent_id,
        &request.address,
        request.ts,
        &request.nonce,
        &request.events,
    )
    .unwrap();
    assert!(verify_signature(
        &payload,
        body["signature"].as_str().unwrap(),
        body["address"].as_str().unwrap()
    ));
}

#[tokio::test]
async fn test_server_error_keeps_batch() {
    let mock = MockEthys::start().await;
    mock.mock_post(paths::TELEMETRY, 500, json!({ "error": "database down" }))
        .await;

    let mut batcher = batcher(&mock, 10);
    batcher.record("llm_start", Record::new()).await;

    let outcome = batcher.flush().await;
    assert!(matches!(outcome, FlushOutcome::Retained { pending: 1, .. }));
    assert_eq!(batcher.pending().len(), 1);
    assert_eq!(batcher.last_send_time(), None);

    // Closing makes one more attempt, then discards the batch.
    assert!(matches!(
        batcher.close().await,
        FlushOutcome::Retained { pending: 1, .. }
    ));
    assert_eq!(mock.received_bodies().await.len(), 2);
}

#[tokio::test]
async fn test_unsuccessful_response_keeps_batch() {
    let mock = MockEthys::start().await;
    Mock::given(method("POST"))
        .and(path(paths::TELEMETRY))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": false,
            "message": "nonce already used"
        })))
        .expect(2)
        .mount(&mock.server)
        .await;

    let mut batcher = batcher(&mock, 10);
    batcher.record("llm_start", Record::new()).await;

    match batcher.flush().await {
        FlushOutcome::Retained { pending, reason } => {
            assert_eq!(pending, 1);
            assert!(reason.contains("nonce already used"));
        }
        other => panic!("unexpected outcome {other:?}"),
    }

    assert!(matches!(
        batcher.close().await,
        FlushOutcome::Retained { pending: 1, .. }
    ));
}

#[tokio::test]
async fn test_callback_feeds_batcher() {
    let mock = MockEthys::start().await;
    accept_telemetry(&mock).await;

    let mut callback = TelemetryCallback::new(batcher(&mock, 2));

    let outcome = callback
        .on_event("llm_start", &json!({ "serialized": {}, "prompts": ["hi"] }))
        .await;
    assert_eq!(outcome, FlushOutcome::Skipped);

    // Unknown events are not recorded.
    callback.on_event("retriever_start", &json!({})).await;
    assert_eq!(callback.batcher().pending().len(), 1);

    let outcome = callback
        .on_event("tool_end", &json!({ "output": "42" }))
        .await;
    assert!(matches!(outcome, FlushOutcome::Sent { events: 2, .. }));

    let bodies = mock.received_bodies().await;
    assert_eq!(bodies.len(), 1);
    assert_eq!(bodies[0]["events"][0]["data"], json!({ "serialized": {}, "prompt_count": 1 }));
    assert_eq!(bodies[0]["events"][1]["data"], json!({ "output_length": 2 }));
}

#[tokio::test]
async fn test_callback_custom_handler() {
    let mock = MockEthys::start().await;
    accept_telemetry(&mock).await;

    let mut callback = TelemetryCallback::new(batcher(&mock, 10));
    assert!(!callback.handles("retriever_end"));

    callback.register("retriever_end", |payload| {
        Record::from([(
            "document_count".to_string(),
            json!(payload["documents"].as_array().map_or(0, Vec::len)),
        )])
    });
    assert!(callback.handles("retriever_end"));

    callback
        .on_event("retriever_end", &json!({ "documents": [1, 2, 3] }))
        .await;
    assert!(matches!(callback.close().await, FlushOutcome::Sent { events: 1, .. }));

    let bodies = mock.received_bodies().await;
    assert_eq!(bodies[0]["events"][0]["eventType"], "retriever_end");
    assert_eq!(bodies[0]["events"][0]["data"]["document_count"], 3);
}
