//! `/audio_transcribe`: multipart `audio` upload → transcription + summary.

use std::path::{Path, PathBuf};

use axum::body::Bytes;
use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, State};
use axum::routing::post;
use axum::{Json, Router};
use chrono::Utc;
use medchat_llm::{AudioInput, FixedPersona};
use serde_json::{json, Value};
use tracing::{info, warn};
use uuid::Uuid;

use super::complete;
use crate::error::{ApiError, Result};
use crate::state::AppState;

const NO_AUDIO: &str = "No audio file provided";
const NO_SELECTED_FILE: &str = "No selected file";
const DEFAULT_EXTENSION: &str = "m4a";

pub fn audio_routes() -> Router<AppState> {
    Router::new().route("/audio_transcribe", post(audio_transcribe))
}

async fn audio_transcribe(
    State(state): State<AppState>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Json<Value>> {
    let mut multipart = multipart.map_err(|_| ApiError::validation(NO_AUDIO))?;
    let upload = read_audio_field(&mut multipart).await?;
    info!(
        route = "/audio_transcribe",
        file_name = %upload.file_name,
        bytes = upload.bytes.len(),
        "Received audio"
    );

    let path = upload_path(&state.upload_dir, &upload.file_name);
    tokio::fs::write(&path, &upload.bytes)
        .await
        .map_err(|e| ApiError::Internal(format!("Failed to save upload: {e}")))?;
    let audio = AudioInput {
        path,
        file_name: upload.file_name,
        content_type: upload.content_type,
    };

    let transcription = state.transcriber.transcribe(&audio).await;

    if let Err(e) = tokio::fs::remove_file(&audio.path).await {
        warn!(path = %audio.path.display(), error = %e, "Failed to remove upload");
    }

    let transcription = transcription?;
    let summary = complete(&state, FixedPersona::AudioSummary.render(&transcription)).await?;

    Ok(Json(json!({
        "transcription": transcription,
        "summary": summary,
    })))
}

/// The `audio` form part, still in memory.
struct Upload {
    file_name: String,
    content_type: Option<String>,
    bytes: Bytes,
}

/// Pull the `audio` part out of the form.
async fn read_audio_field(multipart: &mut Multipart) -> Result<Upload> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::validation(e.body_text()))?
    {
        if field.name() != Some("audio") {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        if file_name.is_empty() {
            return Err(ApiError::validation(NO_SELECTED_FILE));
        }
        let content_type = field.content_type().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::validation(e.body_text()))?;
        return Ok(Upload {
            file_name,
            content_type,
            bytes,
        });
    }
    Err(ApiError::validation(NO_AUDIO))
}

/// `<upload_dir>/<YYYYmmdd_HHMMSS>_<uuid>.<ext>`, keeping the client's
/// extension when it has one.
fn upload_path(dir: &Path, file_name: &str) -> PathBuf {
    let ext = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty() && e.chars().all(|c| c.is_ascii_alphanumeric()))
        .unwrap_or(DEFAULT_EXTENSION);
    dir.join(format!(
        "{}_{}.{ext}",
        Utc::now().format("%Y%m%d_%H%M%S"),
        Uuid::new_v4().simple()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upload_path_keeps_safe_extension() {
        let dir = Path::new("/tmp/uploads");
        let p = upload_path(dir, "visit.wav");
        assert_eq!(p.extension().and_then(|e| e.to_str()), Some("wav"));
        assert!(p.starts_with(dir));

        let p = upload_path(dir, "recording");
        assert_eq!(p.extension().and_then(|e| e.to_str()), Some("m4a"));

        let p = upload_path(dir, "../../etc/passwd.s h");
        assert_eq!(p.extension().and_then(|e| e.to_str()), Some("m4a"));
        assert_eq!(p.parent(), Some(dir));
    }

    #[test]
    fn upload_names_are_unique() {
        let dir = Path::new("/tmp");
        assert_ne!(upload_path(dir, "a.m4a"), upload_path(dir, "a.m4a"));
    }
}
