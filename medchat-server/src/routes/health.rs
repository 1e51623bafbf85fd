//! `/chat` for the health family: evaluate a reading, then ask the model to
//! explain the report.

use axum::body::Bytes;
use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use medchat_core::{HealthReading, HealthReport};
use medchat_llm::prompt::health_analysis_prompt;
use serde_json::Value;
use tracing::debug;

use super::{complete, parse_object, reply};
use crate::error::Result;
use crate::state::AppState;

pub fn health_eval_routes() -> Router<AppState> {
    Router::new().route("/chat", post(health_chat))
}

async fn health_chat(State(state): State<AppState>, body: Bytes) -> Result<Json<Value>> {
    let data = parse_object("/chat", &body)?;
    let reading = HealthReading::from_json(&data)?;
    let report = HealthReport::evaluate(&reading);
    debug!(
        age = reading.age,
        status = %report.blood_pressure_status,
        "Health reading evaluated"
    );

    let text = complete(&state, health_analysis_prompt(&report.to_summary())).await?;
    Ok(reply(text))
}
