use axum::{extract::State, response::Json};
use serde::Deserialize;
use std::path::PathBuf;
use taskboard_core::protocol::{HostMessage, ViewMessage};
use taskboard_core::reconcile::BoardIntent;
use taskboard_core::types::Board;

use super::{api_error, ApiError};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct PathBody {
    path: PathBuf,
}

pub async fn get_board(State(state): State<AppState>) -> Result<Json<HostMessage>, ApiError> {
    state
        .handle_view_message(ViewMessage::RequestBoardData)
        .await
        .map(Json)
        .map_err(|e| api_error("taskboard.api.get_board", e))
}

pub async fn put_board(
    State(state): State<AppState>,
    Json(board): Json<Board>,
) -> Result<Json<HostMessage>, ApiError> {
    state
        .handle_view_message(ViewMessage::BoardUpdated { board })
        .await
        .map(Json)
        .map_err(|e| api_error("taskboard.api.put_board", e))
}

pub async fn post_intent(
    State(state): State<AppState>,
    Json(intent): Json<BoardIntent>,
) -> Result<Json<HostMessage>, ApiError> {
    state
        .handle_view_message(ViewMessage::Intent { intent })
        .await
        .map(Json)
        .map_err(|e| api_error("taskboard.api.intent", e))
}

pub async fn post_message(
    State(state): State<AppState>,
    Json(message): Json<ViewMessage>,
) -> Result<Json<HostMessage>, ApiError> {
    state
        .handle_view_message(message)
        .await
        .map(Json)
        .map_err(|e| api_error("taskboard.api.message", e))
}

pub async fn open_board(
    State(state): State<AppState>,
    Json(body): Json<PathBody>,
) -> Result<Json<HostMessage>, ApiError> {
    state
        .open_board(&body.path)
        .await
        .map(Json)
        .map_err(|e| api_error("taskboard.api.open_board", e))
}

pub async fn new_board(
    State(state): State<AppState>,
    Json(body): Json<PathBody>,
) -> Result<Json<HostMessage>, ApiError> {
    state
        .create_board(&body.path)
        .await
        .map(Json)
        .map_err(|e| api_error("taskboard.api.new_board", e))
}
