//! Decoding of the agent's own event payloads.
//!
//! Agents disagree on field names, so every field is resolved through an
//! ordered list of accepted keys. Unknown events decode to
//! [`AgentEvent::Other`] and are ignored by callers.

use serde_json::{Map, Value};

const KIND_KEYS: &[&str] = &["type", "event", "status"];
const STEP_MESSAGE_KEYS: &[&str] = &[
    "purpose",
    "message",
    "action",
    "description",
    "step",
    "status",
];
const PREVIEW_URL_KEYS: &[&str] = &[
    "streamingUrl",
    "streaming_url",
    "liveUrl",
    "live_url",
    "url",
];
const RESULT_KEYS: &[&str] = &[
    "resultJson",
    "result_json",
    "result",
    "output",
    "data",
    "extracted",
];
const ERROR_KEYS: &[&str] = &["error", "message", "reason", "detail"];

const STEP_FALLBACK: &str = "Agent is working";
const ERROR_FALLBACK: &str = "agent reported an error";

const COMPLETE_KINDS: &[&str] = &["complete", "completed", "done", "success", "result"];
const FAILED_KINDS: &[&str] = &["error", "failed", "failure", "cancelled", "canceled"];
const STEP_KINDS: &[&str] = &["step", "progress", "action", "started", "running", "log"];
const PREVIEW_KINDS: &[&str] = &["streaming_url", "streamingurl", "live_url", "preview"];

/// One decoded agent event.
#[derive(Debug, Clone, PartialEq)]
pub enum AgentEvent {
    /// Intermediate progress with a never-empty message.
    Step { message: String },
    /// A live-preview URL for the browser session.
    StreamingUrl { url: String },
    /// Terminal success. `None` means the agent sent no usable payload.
    Complete { result: Option<Value> },
    /// Terminal failure.
    Failed { message: String },
    /// Anything else (heartbeats, unknown kinds).
    Other,
}

impl AgentEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete { .. } | Self::Failed { .. })
    }
}

/// Decode one JSON payload from the agent stream.
pub fn decode_event(payload: &Value) -> AgentEvent {
    decode_named_event(payload, None)
}

/// Decode a payload that arrived under an SSE `event:` name.
///
/// The name only decides the kind when the payload carries none itself.
/// The SSE default name `message` says nothing and is ignored.
pub fn decode_named_event(payload: &Value, event_name: Option<&str>) -> AgentEvent {
    let Value::Object(obj) = payload else {
        return AgentEvent::Other;
    };

    let kind = first_text(obj, KIND_KEYS)
        .or_else(|| {
            event_name
                .filter(|name| !name.eq_ignore_ascii_case("message"))
                .map(str::to_string)
        })
        .map(|k| k.to_ascii_lowercase())
        .unwrap_or_default();

    if COMPLETE_KINDS.contains(&kind.as_str()) {
        if status_is_failed(obj) {
            return failed(obj);
        }
        let result = RESULT_KEYS
            .iter()
            .find_map(|key| obj.get(*key).filter(|v| !v.is_null()))
            .cloned();
        return AgentEvent::Complete { result };
    }

    if FAILED_KINDS.contains(&kind.as_str()) {
        return failed(obj);
    }

    if PREVIEW_KINDS.contains(&kind.as_str()) || (kind.is_empty() && has_preview_key(obj)) {
        return match first_text(obj, PREVIEW_URL_KEYS) {
            Some(url) => AgentEvent::StreamingUrl { url },
            None => AgentEvent::Other,
        };
    }

    if STEP_KINDS.contains(&kind.as_str()) {
        let message =
            first_text(obj, STEP_MESSAGE_KEYS).unwrap_or_else(|| STEP_FALLBACK.to_string());
        return AgentEvent::Step { message };
    }

    AgentEvent::Other
}

fn failed(obj: &Map<String, Value>) -> AgentEvent {
    let message = ERROR_KEYS
        .iter()
        .find_map(|key| obj.get(*key).and_then(error_text))
        .unwrap_or_else(|| ERROR_FALLBACK.to_string());
    AgentEvent::Failed { message }
}

fn status_is_failed(obj: &Map<String, Value>) -> bool {
    obj.get("status")
        .and_then(Value::as_str)
        .is_some_and(|s| FAILED_KINDS.contains(&s.to_ascii_lowercase().as_str()))
}

fn has_preview_key(obj: &Map<String, Value>) -> bool {
    PREVIEW_URL_KEYS[..4].iter().any(|key| obj.contains_key(*key))
}

fn first_text(obj: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| obj.get(*key).and_then(scalar_text))
}

fn scalar_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}

/// Errors are sometimes nested as `{"error": {"message": "..."}}`.
fn error_text(value: &Value) -> Option<String> {
    match value {
        Value::Object(inner) => first_text(inner, ERROR_KEYS),
        other => scalar_text(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn step_uses_message_chain_and_fallback() {
        assert_eq!(
            decode_event(&json!({ "type": "PROGRESS", "purpose": "Opening docs" })),
            AgentEvent::Step {
                message: "Opening docs".into()
            }
        );
        assert_eq!(
            decode_event(&json!({ "type": "STEP", "action": "" })),
            AgentEvent::Step {
                message: "Agent is working".into()
            }
        );
    }

    #[test]
    fn discriminator_falls_back_to_event_then_status() {
        assert_eq!(
            decode_event(&json!({ "event": "complete", "output": { "overview": "x" } })),
            AgentEvent::Complete {
                result: Some(json!({ "overview": "x" }))
            }
        );
        assert!(matches!(
            decode_event(&json!({ "status": "COMPLETED", "resultJson": "{}" })),
            AgentEvent::Complete { result: Some(_) }
        ));
    }

    #[test]
    fn complete_with_null_result_is_undefined_payload() {
        assert_eq!(
            decode_event(&json!({ "type": "COMPLETE", "resultJson": null })),
            AgentEvent::Complete { result: None }
        );
    }

    #[test]
    fn complete_with_failed_status_is_failure() {
        assert_eq!(
            decode_event(&json!({ "type": "COMPLETE", "status": "FAILED", "error": "blocked" })),
            AgentEvent::Failed {
                message: "blocked".into()
            }
        );
    }

    #[test]
    fn error_message_chain_handles_nesting() {
        assert_eq!(
            decode_event(&json!({ "type": "error", "error": { "message": "timeout" } })),
            AgentEvent::Failed {
                message: "timeout".into()
            }
        );
        assert_eq!(
            decode_event(&json!({ "type": "ERROR" })),
            AgentEvent::Failed {
                message: "agent reported an error".into()
            }
        );
    }

    #[test]
    fn preview_url_is_recognized() {
        assert_eq!(
            decode_event(&json!({ "type": "STREAMING_URL", "streamingUrl": "https://live/1" })),
            AgentEvent::StreamingUrl {
                url: "https://live/1".into()
            }
        );
        assert_eq!(
            decode_event(&json!({ "live_url": "https://live/2" })),
            AgentEvent::StreamingUrl {
                url: "https://live/2".into()
            }
        );
    }

    #[test]
    fn unknown_payloads_are_ignored() {
        assert_eq!(decode_event(&json!({ "type": "heartbeat" })), AgentEvent::Other);
        assert_eq!(decode_event(&json!("ping")), AgentEvent::Other);
        assert!(!AgentEvent::Other.is_terminal());
    }

    #[test]
    fn sse_event_name_is_a_fallback_kind() {
        let payload = json!({ "message": "blocked" });
        assert_eq!(
            decode_named_event(&payload, Some("error")),
            AgentEvent::Failed {
                message: "blocked".into()
            }
        );
        assert_eq!(decode_named_event(&payload, None), AgentEvent::Other);

        // The payload's own kind wins over the name.
        assert_eq!(
            decode_named_event(&json!({ "type": "step", "message": "x" }), Some("error")),
            AgentEvent::Step {
                message: "x".into()
            }
        );

        // The default name does not hide a bare preview payload.
        assert_eq!(
            decode_named_event(&json!({ "liveUrl": "https://live/1" }), Some("message")),
            AgentEvent::StreamingUrl {
                url: "https://live/1".into()
            }
        );
    }
}
