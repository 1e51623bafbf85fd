//! Fixed-persona chats of the clinic family.

use axum::body::Bytes;
use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use medchat_llm::FixedPersona;
use serde_json::Value;

use super::{complete, parse_object, reply, required_text};
use crate::error::Result;
use crate::state::AppState;

pub fn clinic_routes() -> Router<AppState> {
    Router::new()
        .route("/condition_chat", post(condition_chat))
        .route("/medicine_chat", post(medicine_chat))
        .route("/psychology_chat", post(psychology_chat))
}

async fn condition_chat(State(state): State<AppState>, body: Bytes) -> Result<Json<Value>> {
    fixed_chat(&state, FixedPersona::Condition, "/condition_chat", &body).await
}

async fn medicine_chat(State(state): State<AppState>, body: Bytes) -> Result<Json<Value>> {
    fixed_chat(&state, FixedPersona::Medicine, "/medicine_chat", &body).await
}

async fn psychology_chat(State(state): State<AppState>, body: Bytes) -> Result<Json<Value>> {
    fixed_chat(&state, FixedPersona::Psychology, "/psychology_chat", &body).await
}

async fn fixed_chat(
    state: &AppState,
    persona: FixedPersona,
    route: &str,
    body: &Bytes,
) -> Result<Json<Value>> {
    let data = parse_object(route, body)?;
    let message = required_text(&data, "message")?;
    let text = complete(state, persona.render(message)).await?;
    Ok(reply(text))
}
