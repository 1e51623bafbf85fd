//! `/chat` for the persona-table families (advisor and dosage).

use axum::body::Bytes;
use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use serde_json::Value;
use tracing::debug;

use super::{complete, parse_object, reply, required_text};
use crate::error::Result;
use crate::state::AppState;

pub fn persona_routes() -> Router<AppState> {
    Router::new().route("/chat", post(persona_chat))
}

/// `{ context_type?, user_question }` → `{ response }`.
///
/// An absent, non-string or unknown `context_type` composes the question on
/// its own.
async fn persona_chat(State(state): State<AppState>, body: Bytes) -> Result<Json<Value>> {
    let data = parse_object("/chat", &body)?;
    let question = required_text(&data, "user_question")?;
    let category = data.get("context_type").and_then(Value::as_str);

    let prompt = state.personas.compose(category, question);
    debug!(
        service = %state.settings.kind,
        category = category.unwrap_or(""),
        prompt_chars = prompt.chars().count(),
        "Composed prompt"
    );

    let text = complete(&state, prompt).await?;
    Ok(reply(text))
}
