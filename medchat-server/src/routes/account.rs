//! Registration, login and the authenticated account endpoints.
//!
//! Store calls (argon2 hashing included) run on the blocking pool so a slow
//! hash never stalls the runtime.

use axum::body::Bytes;
use axum::extract::{FromRequestParts, Path, State};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use medchat_core::auth::token_from_header;
use medchat_core::{AccountField, AccountStore, MedchatError, UserId};
use serde_json::{json, Value};
use tracing::info;

use super::{read_object, required_text, NO_DATA};
use crate::error::{ApiError, Result};
use crate::state::{Accounts, AppState};

pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/account", get(get_account))
        .route("/account/{field}", put(update_field).post(append_entry))
}

// ---------------------------------------------------------------------------
// Auth extractor
// ---------------------------------------------------------------------------

/// The user behind a valid `Authorization` token.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser(pub UserId);

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(token_from_header)
            .filter(|t| !t.is_empty())
            .ok_or(MedchatError::TokenMissing)?;

        let claims = state.accounts()?.signer.verify(header)?;
        Ok(AuthUser(claims.user_id))
    }
}

/// Run `f` against the store on the blocking pool.
async fn with_store<T, F>(accounts: &Accounts, f: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce(&AccountStore) -> medchat_core::error::Result<T> + Send + 'static,
{
    let store = accounts.store.clone();
    tokio::task::spawn_blocking(move || f(&*store.lock()))
        .await
        .map_err(|e| ApiError::Internal(format!("store task failed: {e}")))?
        .map_err(ApiError::from)
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn register(State(state): State<AppState>, body: Bytes) -> Result<(StatusCode, Json<Value>)> {
    let data = read_object(&body)?;
    let email = required_text(&data, "email")?.to_string();
    let password = required_text(&data, "password")?.to_string();
    info!(route = "/register", %email, "Received credentials");

    let accounts = state.accounts()?;
    let user_id = with_store(accounts, move |s| s.create_user(&email, &password)).await?;
    let token = accounts.signer.issue(user_id)?;
    info!(user = %user_id, "Registered account");

    Ok((
        StatusCode::CREATED,
        Json(json!({ "user_id": user_id, "token": token })),
    ))
}

async fn login(State(state): State<AppState>, body: Bytes) -> Result<Json<Value>> {
    let data = read_object(&body)?;
    let email = required_text(&data, "email")?.to_string();
    let password = required_text(&data, "password")?.to_string();
    info!(route = "/login", %email, "Received credentials");

    let accounts = state.accounts()?;
    let account = with_store(accounts, move |s| s.authenticate(&email, &password)).await?;
    let token = accounts.signer.issue(account.id)?;
    info!(user = %account.id, "Login");

    Ok(Json(json!({ "token": token })))
}

async fn get_account(State(state): State<AppState>, AuthUser(id): AuthUser) -> Result<Json<Value>> {
    let account = with_store(state.accounts()?, move |s| {
        s.get_account(id)?.ok_or(MedchatError::AccountNotFound(id))
    })
    .await?;
    serde_json::to_value(account)
        .map(Json)
        .map_err(|e| ApiError::Internal(e.to_string()))
}

/// Replace one JSON field with the request body (any JSON value).
async fn update_field(
    State(state): State<AppState>,
    AuthUser(id): AuthUser,
    Path(field): Path<String>,
    body: Bytes,
) -> Result<Json<Value>> {
    let field: AccountField = field.parse().map_err(ApiError::NotFound)?;
    info!(route = "/account", %field, payload = %String::from_utf8_lossy(&body), "Received data");
    let value: Value =
        serde_json::from_slice(&body).map_err(|_| ApiError::validation(NO_DATA))?;

    with_store(state.accounts()?, move |s| s.update_field(id, field, &value)).await?;
    Ok(Json(json!({ "updated": field.column() })))
}

/// Append one entry to a list field. Only `chat_history` is a list.
async fn append_entry(
    State(state): State<AppState>,
    AuthUser(id): AuthUser,
    Path(field): Path<String>,
    body: Bytes,
) -> Result<Json<Value>> {
    let field: AccountField = field.parse().map_err(ApiError::NotFound)?;
    if field != AccountField::ChatHistory {
        return Err(ApiError::validation(format!("{field} does not accept appends")));
    }
    info!(route = "/account", %field, payload = %String::from_utf8_lossy(&body), "Received data");
    let entry: Value =
        serde_json::from_slice(&body).map_err(|_| ApiError::validation(NO_DATA))?;

    with_store(state.accounts()?, move |s| s.append_chat_history(id, entry)).await?;
    Ok(Json(json!({ "updated": field.column() })))
}
