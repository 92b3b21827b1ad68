//! Lifecycle-event telemetry for agent hosts.
//!
//! The host reports what happened as an event name plus a JSON payload, e.g.
//! `("tool_start", {"serialized": {"name": "search"}, "input": "..."})`. A
//! dispatch table maps each name to a handler that extracts the fields worth
//! keeping, and the result is recorded in a [`TelemetryBatcher`].
//!
//! | event           | payload fields read        | recorded data                   |
//! |-----------------|----------------------------|---------------------------------|
//! | `llm_start`     | `serialized`, `prompts`    | `serialized`, `prompt_count`    |
//! | `llm_end`       | `generations`              | `generation_count`              |
//! | `*_error`       | `error`, `error_type`      | `error`, `error_type`           |
//! | `chain_start`   | `serialized`               | `serialized`                    |
//! | `chain_end`     | `outputs`                  | `output_keys`                   |
//! | `tool_start`    | `serialized.name`, `input` | `tool`, `input` (100 chars)     |
//! | `tool_end`      | `output`                   | `output_length`                 |
//! | `agent_action`  | `tool`, `tool_input`       | `tool`, `tool_input` (100 chars)|
//! | `agent_finish`  | `return_values`            | `return_values_keys`            |

use std::collections::HashMap;

use serde_json::json;

use crate::{
    telemetry::{FlushOutcome, TelemetryBatcher, TelemetryTransport},
    types::{AnyJson, Record},
};

/// Turns an event payload into the data recorded for it.
pub type EventHandler = fn(&AnyJson) -> Record<AnyJson>;

/// Free-text fields are cut to this many characters before recording.
pub const MAX_INPUT_CHARS: usize = 100;

/// The built-in lifecycle events and their handlers.
pub fn default_handlers() -> HashMap<&'static str, EventHandler> {
    let mut handlers: HashMap<&'static str, EventHandler> = HashMap::new();
    handlers.insert("llm_start", llm_start);
    handlers.insert("llm_end", llm_end);
    handlers.insert("llm_error", error_event);
    handlers.insert("chain_start", chain_start);
    handlers.insert("chain_end", chain_end);
    handlers.insert("chain_error", error_event);
    handlers.insert("tool_start", tool_start);
    handlers.insert("tool_end", tool_end);
    handlers.insert("tool_error", error_event);
    handlers.insert("agent_action", agent_action);
    handlers.insert("agent_finish", agent_finish);
    handlers
}

/// Routes host lifecycle events into a [`TelemetryBatcher`].
#[derive(Debug)]
pub struct TelemetryCallback<T: TelemetryTransport> {
    batcher: TelemetryBatcher<T>,
    handlers: HashMap<&'static str, EventHandler>,
}

impl<T: TelemetryTransport> TelemetryCallback<T> {
    /// A callback with the [default handlers](default_handlers).
    pub fn new(batcher: TelemetryBatcher<T>) -> Self {
        TelemetryCallback {
            batcher,
            handlers: default_handlers(),
        }
    }

    /// Add or replace the handler for `event`, returning the previous one.
    pub fn register(&mut self, event: &'static str, handler: EventHandler) -> Option<EventHandler> {
        self.handlers.insert(event, handler)
    }

    pub fn handles(&self, event: &str) -> bool {
        self.handlers.contains_key(event)
    }

    pub fn batcher(&self) -> &TelemetryBatcher<T> {
        &self.batcher
    }

    pub fn batcher_mut(&mut self) -> &mut TelemetryBatcher<T> {
        &mut self.batcher
    }

    /// Record `event` if a handler is registered for it; unknown events are ignored.
    pub async fn on_event(&mut self, event: &str, payload: &AnyJson) -> FlushOutcome {
        let Some((name, handler)) = self.handlers.get_key_value(event) else {
            #[cfg(feature = "tracing")]
            tracing::trace!("Ignoring unhandled telemetry event '{}'", event);
            return FlushOutcome::Skipped;
        };

        let data = handler(payload);
        self.batcher.record(*name, data).await
    }

    pub async fn flush(&mut self) -> FlushOutcome {
        self.batcher.flush().await
    }

    pub async fn close(self) -> FlushOutcome {
        self.batcher.close().await
    }
}

fn record(value: AnyJson) -> Record<AnyJson> {
    match value {
        AnyJson::Object(map) => map.into_iter().collect(),
        _ => Record::new(),
    }
}

fn field<'a>(payload: &'a AnyJson, key: &str) -> &'a AnyJson {
    payload.get(key).unwrap_or(&AnyJson::Null)
}

fn len_of(value: &AnyJson) -> usize {
    match value {
        AnyJson::Array(items) => items.len(),
        AnyJson::String(s) => s.chars().count(),
        AnyJson::Object(map) => map.len(),
        _ => 0,
    }
}

fn keys_of(value: &AnyJson) -> Vec<String> {
    value
        .as_object()
        .map(|map| map.keys().cloned().collect())
        .unwrap_or_default()
}

/// Strings are taken as is, anything else by its JSON text. Null is empty.
fn text_of(value: &AnyJson) -> String {
    match value {
        AnyJson::Null => String::new(),
        AnyJson::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn truncate(text: &str) -> String {
    text.chars().take(MAX_INPUT_CHARS).collect()
}

fn llm_start(payload: &AnyJson) -> Record<AnyJson> {
    record(json!({
        "serialized": field(payload, "serialized"),
        "prompt_count": len_of(field(payload, "prompts")),
    }))
}

fn llm_end(payload: &AnyJson) -> Record<AnyJson> {
    record(json!({ "generation_count": len_of(field(payload, "generations")) }))
}

fn error_event(payload: &AnyJson) -> Record<AnyJson> {
    let error_type = payload
        .get("error_type")
        .and_then(AnyJson::as_str)
        .unwrap_or("Error");

    record(json!({
        "error": text_of(field(payload, "error")),
        "error_type": error_type,
    }))
}

fn chain_start(payload: &AnyJson) -> Record<AnyJson> {
    record(json!({ "serialized": field(payload, "serialized") }))
}

fn chain_end(payload: &AnyJson) -> Record<AnyJson> {
    record(json!({ "output_keys": keys_of(field(payload, "outputs")) }))
}

fn tool_start(payload: &AnyJson) -> Record<AnyJson> {
    let tool = field(payload, "serialized")
        .get("name")
        .and_then(AnyJson::as_str)
        .unwrap_or("unknown");

    record(json!({
        "tool": tool,
        "input": truncate(&text_of(field(payload, "input"))),
    }))
}

fn tool_end(payload: &AnyJson) -> Record<AnyJson> {
    let output = text_of(field(payload, "output"));
    record(json!({ "output_length": output.chars().count() }))
}

fn agent_action(payload: &AnyJson) -> Record<AnyJson> {
    record(json!({
        "tool": text_of(field(payload, "tool")),
        "tool_input": truncate(&text_of(field(payload, "tool_input"))),
    }))
}

fn agent_finish(payload: &AnyJson) -> Record<AnyJson> {
    record(json!({ "return_values_keys": keys_of(field(payload, "return_values")) }))
}
