// src/api/mod.rs
//! HTTP and WebSocket surface
//!
//! Thin translation layer over [`GameService`]: JSON in, public snapshots
//! out. The WebSocket endpoint pushes a snapshot on connect and then relays
//! every post-mutation snapshot; clients may ping to keep the socket warm.

use crate::game::model::PublicState;
use crate::game::GameService;
use crate::utils::errors::ArenaError;
use axum::extract::ws::{Message as WsMessage, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tokio::sync::broadcast;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::debug;

#[derive(Debug, Deserialize, Default)]
pub struct CreateGameRequest {
    /// Agent bindings in player order; defaults apply when absent
    pub models: Option<Vec<String>>,
}

pub fn router(service: Arc<GameService>) -> Router {
    Router::new()
        .route("/api/game/create", post(create_game))
        .route("/api/game/{id}/start", post(start_game))
        .route("/api/game/{id}/state", get(get_state))
        .route("/api/game/{id}/advance", post(advance_phase))
        .route("/api/game/{id}", delete(delete_game))
        .route("/ws/{id}", get(websocket))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(service)
}

impl IntoResponse for ArenaError {
    fn into_response(self) -> Response {
        let status = match &self {
            ArenaError::NotFound(_) => StatusCode::NOT_FOUND,
            ArenaError::InvalidConfiguration(_) | ArenaError::InvalidState(_) => {
                StatusCode::BAD_REQUEST
            }
            ArenaError::InvariantViolation(_) | ArenaError::Config(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

async fn create_game(
    State(service): State<Arc<GameService>>,
    body: Option<Json<CreateGameRequest>>,
) -> Result<Json<PublicState>, ArenaError> {
    let request = body.map(|Json(r)| r).unwrap_or_default();
    Ok(Json(service.create_game(request.models)?))
}

async fn start_game(
    State(service): State<Arc<GameService>>,
    Path(id): Path<String>,
) -> Result<Json<PublicState>, ArenaError> {
    Ok(Json(service.start_game(&id).await?))
}

async fn get_state(
    State(service): State<Arc<GameService>>,
    Path(id): Path<String>,
) -> Result<Json<PublicState>, ArenaError> {
    Ok(Json(service.get_state(&id).await?))
}

async fn advance_phase(
    State(service): State<Arc<GameService>>,
    Path(id): Path<String>,
) -> Result<Json<PublicState>, ArenaError> {
    Ok(Json(service.advance_phase(&id).await?))
}

async fn delete_game(
    State(service): State<Arc<GameService>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ArenaError> {
    service.delete_game(&id)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn websocket(
    State(service): State<Arc<GameService>>,
    Path(id): Path<String>,
    upgrade: WebSocketUpgrade,
) -> Result<Response, ArenaError> {
    let snapshot = service.get_state(&id).await?;
    let updates = service.subscribe(&id)?;
    Ok(upgrade.on_upgrade(move |socket| relay(socket, snapshot, updates)))
}

async fn relay(
    mut socket: WebSocket,
    snapshot: PublicState,
    mut updates: broadcast::Receiver<PublicState>,
) {
    if send_json(&mut socket, &json!({ "type": "game_state", "data": snapshot })).await.is_err() {
        return;
    }

    loop {
        tokio::select! {
            update = updates.recv() => match update {
                Ok(state) => {
                    let frame = json!({ "type": "game_state_update", "data": state });
                    if send_json(&mut socket, &frame).await.is_err() {
                        return;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    debug!(skipped, "subscriber lagged, snapshots dropped");
                }
                // Game deleted
                Err(broadcast::error::RecvError::Closed) => return,
            },
            incoming = socket.recv() => match incoming {
                Some(Ok(WsMessage::Text(text))) => {
                    let is_ping = serde_json::from_str::<serde_json::Value>(&text)
                        .ok()
                        .is_some_and(|v| v["type"] == "ping");
                    if is_ping && send_json(&mut socket, &json!({ "type": "pong" })).await.is_err() {
                        return;
                    }
                }
                Some(Ok(WsMessage::Close(_))) | None => return,
                Some(Ok(_)) => {}
                Some(Err(_)) => return,
            },
        }
    }
}

async fn send_json(socket: &mut WebSocket, frame: &serde_json::Value) -> Result<(), axum::Error> {
    let text = frame.to_string();
    socket.send(WsMessage::Text(text.into())).await
}
