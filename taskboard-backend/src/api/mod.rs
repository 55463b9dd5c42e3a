use axum::{
    http::StatusCode,
    response::Json,
    routing::{get, post, put},
    Router,
};
use serde::Serialize;
use std::io::ErrorKind;
use taskboard_core::storage::StorageError;
use taskboard_core::BoardError;

mod board;
mod events;
mod preferences;

use crate::state::{AppState, HostError};

/// Axum REST API routes.
///
///   GET  /status                   -> health check (+ open board)
///   GET  /board                    -> boardData for the open board
///   PUT  /board                    -> whole-board save (boardUpdated)
///   POST /board/intents            -> apply one mutation intent
///   POST /board/messages           -> any view message (requestBoardData, boardUpdated, intent)
///   POST /board/open   { path }    -> open an existing board file
///   POST /board/new    { path }    -> create a board file
///   GET  /events                   -> SSE stream of host messages
///   GET  /logs                     -> recent log entries
///   GET  /preferences              -> workspace preferences
///   PUT  /preferences/column-order -> set the column order
///   DELETE /preferences            -> reset preferences
pub fn api_router() -> Router<AppState> {
    Router::new()
        .route("/status", get(events::status))
        .route("/board", get(board::get_board).put(board::put_board))
        .route("/board/intents", post(board::post_intent))
        .route("/board/messages", post(board::post_message))
        .route("/board/open", post(board::open_board))
        .route("/board/new", post(board::new_board))
        .route("/events", get(events::sse_events))
        .route("/logs", get(events::list_logs))
        .route(
            "/preferences",
            get(preferences::get_preferences).delete(preferences::clear_preferences),
        )
        .route(
            "/preferences/column-order",
            put(preferences::put_column_order),
        )
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

pub type ApiError = (StatusCode, Json<ErrorResponse>);

fn log_api_issue(status: StatusCode, target: &'static str, message: impl AsRef<str>) {
    let message = message.as_ref();
    if status.is_server_error() {
        log::error!(target: target, "{}", message);
    } else {
        log::warn!(target: target, "{}", message);
    }
}

fn status_for(error: &HostError) -> StatusCode {
    match error {
        HostError::NoBoard => StatusCode::NOT_FOUND,
        HostError::AlreadyExists(_) => StatusCode::CONFLICT,
        HostError::Storage(StorageError::Board(BoardError::UnsupportedFormat(_))) => {
            StatusCode::BAD_REQUEST
        }
        HostError::Storage(StorageError::Board(_)) => StatusCode::UNPROCESSABLE_ENTITY,
        HostError::Storage(StorageError::Io(e)) if e.kind() == ErrorKind::NotFound => {
            StatusCode::NOT_FOUND
        }
        HostError::Storage(StorageError::Io(_)) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Map a host error to an HTTP status and JSON body, logging it under `target`.
fn api_error(target: &'static str, error: HostError) -> ApiError {
    let status = status_for(&error);
    let error = error.to_string();
    log_api_issue(status, target, &error);
    (status, Json(ErrorResponse { error }))
}
