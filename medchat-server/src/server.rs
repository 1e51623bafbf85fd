use std::net::SocketAddr;

use axum::extract::DefaultBodyLimit;
use axum::http::{header, Method};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::routes::{
    account_routes, audio_routes, clinic_routes, health_eval_routes, persona_routes, status_routes,
};
use crate::service::ServiceKind;
use crate::state::AppState;

/// Router for the family named in `state.settings`.
pub fn build_router(state: AppState, max_body_bytes: usize) -> Router {
    let routes = match state.settings.kind {
        ServiceKind::Advisor | ServiceKind::Dosage => persona_routes(),
        ServiceKind::Health => health_eval_routes(),
        ServiceKind::Clinic => clinic_routes().merge(audio_routes()).merge(account_routes()),
    };

    // Mobile and web clients call from arbitrary origins.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    routes
        .merge(status_routes())
        .with_state(state)
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

/// Bind `host:port` and serve until the process is stopped.
///
/// # Errors
/// Fails if the address does not parse or the port cannot be bound.
pub async fn serve(state: AppState, host: &str, max_body_bytes: usize) -> std::io::Result<()> {
    let kind = state.settings.kind;
    let addr: SocketAddr = format!("{host}:{}", state.settings.port)
        .parse()
        .map_err(|e| {
            std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("Invalid address {host}:{}: {e}", state.settings.port),
            )
        })?;

    let app = build_router(state, max_body_bytes);

    tracing::info!(service = %kind, "Starting {} service on http://{}", kind, addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!(service = %kind, "Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
