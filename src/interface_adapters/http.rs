// Headless admin HTTP façade. Unauthenticated iff no
// `HEADLESS_ADMIN_TOKEN` is configured; otherwise every route requires a
// matching `X-Admin-Token` header.

use crate::interface_adapters::state::AppState;
use crate::use_cases::types::{AdminConfigPatch, AuthorityCommand};
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(placeholder))
        .route("/status", get(status))
        .route("/kick", post(kick))
        .route("/start", post(start))
        .route("/reset", post(reset))
        .route("/config", post(update_config))
        .route("/lock", post(lock))
        .with_state(state)
}

fn authorized(state: &AppState, headers: &HeaderMap) -> bool {
    match &state.admin_token {
        None => true,
        Some(expected) => headers
            .get("X-Admin-Token")
            .and_then(|v| v.to_str().ok())
            .is_some_and(|got| got == expected),
    }
}

fn unauthorized() -> impl IntoResponse {
    (StatusCode::UNAUTHORIZED, Json(ErrorResponse { error: "unauthorized".to_string() }))
}

async fn placeholder() -> impl IntoResponse {
    Json(serde_json::json!({ "service": "arena-authority", "admin": true }))
}

#[derive(Debug, Serialize)]
struct StatusResponse {
    uptime_secs: u64,
    player_count: usize,
    match_active: bool,
    lobby_locked: bool,
    join_locked: bool,
}

async fn status(State(state): State<AppState>, headers: HeaderMap) -> axum::response::Response {
    if !authorized(&state, &headers) {
        return unauthorized().into_response();
    }
    let (tx, rx) = oneshot::channel();
    if state.authority.sender.send(AuthorityCommand::AdminStatus { reply: tx }).await.is_err() {
        return (StatusCode::SERVICE_UNAVAILABLE, Json(ErrorResponse { error: "authority unavailable".to_string() }))
            .into_response();
    }
    match rx.await {
        Ok(snapshot) => Json(StatusResponse {
            uptime_secs: snapshot.uptime_secs,
            player_count: snapshot.player_count,
            match_active: snapshot.match_active,
            lobby_locked: snapshot.lobby_locked,
            join_locked: snapshot.join_locked,
        })
        .into_response(),
        Err(_) => (StatusCode::SERVICE_UNAVAILABLE, Json(ErrorResponse { error: "authority unavailable".to_string() }))
            .into_response(),
    }
}

#[derive(Debug, Deserialize)]
struct KickRequest {
    player_id: String,
}

async fn kick(State(state): State<AppState>, headers: HeaderMap, Json(body): Json<KickRequest>) -> axum::response::Response {
    if !authorized(&state, &headers) {
        return unauthorized().into_response();
    }
    let player_id = crate::interface_adapters::protocol::player_id_from(&body.player_id);
    let _ = state.authority.sender.send(AuthorityCommand::AdminKick { player_id }).await;
    StatusCode::NO_CONTENT.into_response()
}

#[derive(Debug, Deserialize, Default)]
struct StartRequest {
    #[serde(default)]
    seed: Option<String>,
}

async fn start(State(state): State<AppState>, headers: HeaderMap, body: Option<Json<StartRequest>>) -> axum::response::Response {
    if !authorized(&state, &headers) {
        return unauthorized().into_response();
    }
    let seed = body.map(|Json(b)| b.seed).unwrap_or(None);
    let (tx, rx) = oneshot::channel();
    if state.authority.sender.send(AuthorityCommand::AdminForceStart { seed, reply: tx }).await.is_err() {
        return (StatusCode::SERVICE_UNAVAILABLE, Json(ErrorResponse { error: "authority unavailable".to_string() }))
            .into_response();
    }
    match rx.await {
        Ok(ok) => Json(serde_json::json!({ "ok": ok })).into_response(),
        Err(_) => (StatusCode::SERVICE_UNAVAILABLE, Json(ErrorResponse { error: "authority unavailable".to_string() }))
            .into_response(),
    }
}

async fn reset(State(state): State<AppState>, headers: HeaderMap) -> axum::response::Response {
    if !authorized(&state, &headers) {
        return unauthorized().into_response();
    }
    let _ = state.authority.sender.send(AuthorityCommand::AdminReset).await;
    StatusCode::NO_CONTENT.into_response()
}

#[derive(Debug, Deserialize, Default)]
struct ConfigRequest {
    #[serde(default)]
    auto_start: Option<bool>,
    #[serde(default)]
    min_players: Option<usize>,
    #[serde(default)]
    ready_required: Option<bool>,
    #[serde(default)]
    ready_timeout: Option<f32>,
    #[serde(default)]
    start_delay: Option<f32>,
    #[serde(default)]
    reset_delay: Option<f32>,
    #[serde(default)]
    map_name: Option<String>,
}

async fn update_config(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<ConfigRequest>,
) -> axum::response::Response {
    if !authorized(&state, &headers) {
        return unauthorized().into_response();
    }
    let patch = AdminConfigPatch {
        auto_start: body.auto_start,
        min_players: body.min_players,
        ready_required: body.ready_required,
        ready_timeout: body.ready_timeout,
        start_delay: body.start_delay,
        reset_delay: body.reset_delay,
        map_name: body.map_name,
    };
    let (tx, rx) = oneshot::channel();
    if state.authority.sender.send(AuthorityCommand::AdminUpdateConfig { patch, reply: tx }).await.is_err() {
        return (StatusCode::SERVICE_UNAVAILABLE, Json(ErrorResponse { error: "authority unavailable".to_string() }))
            .into_response();
    }
    match rx.await {
        Ok(config) => Json(serde_json::json!({
            "auto_start": config.auto_start,
            "min_players": config.min_players,
            "ready_required": config.ready_required,
            "ready_timeout": config.ready_timeout,
            "start_delay": config.start_delay,
            "reset_delay": config.reset_delay,
            "map_name": config.map_name,
        }))
        .into_response(),
        Err(_) => StatusCode::SERVICE_UNAVAILABLE.into_response(),
    }
}

#[derive(Debug, Deserialize)]
struct LockRequest {
    locked: bool,
}

async fn lock(State(state): State<AppState>, headers: HeaderMap, Json(body): Json<LockRequest>) -> axum::response::Response {
    if !authorized(&state, &headers) {
        return unauthorized().into_response();
    }
    let _ = state.authority.sender.send(AuthorityCommand::AdminSetLock { locked: body.locked }).await;
    StatusCode::NO_CONTENT.into_response()
}
