//! Route groups and the request → prompt → model → reply plumbing they share.

mod account;
mod audio;
mod chat;
mod clinic;
mod health;
mod status;

pub use account::account_routes;
pub use audio::audio_routes;
pub use chat::persona_routes;
pub use clinic::clinic_routes;
pub use health::health_eval_routes;
pub use status::status_routes;

use axum::body::Bytes;
use axum::Json;
use medchat_core::UpstreamPolicy;
use medchat_llm::sanitize;
use serde_json::{json, Map, Value};
use tracing::{info, warn};

use crate::error::{ApiError, Result};
use crate::state::AppState;

pub(crate) const NO_DATA: &str = "No data received";

/// Log the raw payload and parse it as a JSON object.
pub(crate) fn parse_object(route: &str, body: &Bytes) -> Result<Map<String, Value>> {
    info!(route, payload = %String::from_utf8_lossy(body), "Received data");
    read_object(body)
}

/// Parse a JSON object body without logging it. Used where the body carries
/// credentials.
///
/// Empty, non-JSON and non-object bodies are all "No data received".
pub(crate) fn read_object(body: &Bytes) -> Result<Map<String, Value>> {
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(map)) if !map.is_empty() => Ok(map),
        _ => Err(ApiError::validation(NO_DATA)),
    }
}

/// A non-empty string field, or `No <field> provided`. Whitespace counts as
/// text.
pub(crate) fn required_text<'a>(map: &'a Map<String, Value>, field: &str) -> Result<&'a str> {
    map.get(field)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::validation(format!("No {field} provided")))
}

/// Send `prompt` upstream and sanitize the reply, applying the family's
/// failure policy.
pub(crate) async fn complete(state: &AppState, prompt: String) -> Result<String> {
    let request = state.request(prompt);
    match state.model.generate(&request).await {
        Ok(response) => Ok(sanitize(&response.text)),
        Err(e) => match state.settings.policy {
            UpstreamPolicy::Propagate => Err(e.into()),
            UpstreamPolicy::Fallback => {
                warn!(service = %state.settings.kind, error = %e, "Model call failed, answering with fallback");
                Ok(UpstreamPolicy::FALLBACK_REPLY.to_string())
            }
        },
    }
}

/// `{ "response": ... }`
pub(crate) fn reply(text: String) -> Json<Value> {
    Json(json!({ "response": text }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_and_non_object_bodies_are_no_data() {
        for body in ["", "not json", "[]", "42", "null", "{}"] {
            let err = parse_object("/chat", &Bytes::from(body)).expect_err(body);
            assert_eq!(err.to_string(), NO_DATA, "{body:?}");
        }
    }

    #[test]
    fn required_text_rejects_missing_empty_and_non_string() {
        let map = parse_object("/x", &Bytes::from(r#"{"a":"","b":"  ","c":3,"d":"ok"}"#))
            .expect("object");
        for field in ["a", "c", "missing"] {
            let err = required_text(&map, field).expect_err(field);
            assert_eq!(err.to_string(), format!("No {field} provided"));
        }
        assert_eq!(required_text(&map, "b").expect("b"), "  ");
        assert_eq!(required_text(&map, "d").expect("d"), "ok");
    }

    #[test]
    fn read_object_applies_the_same_rules() {
        for body in ["", "[]", "{}"] {
            assert!(read_object(&Bytes::from(body)).is_err(), "{body:?}");
        }
        assert!(read_object(&Bytes::from(r#"{"email":"a"}"#)).is_ok());
    }
}
