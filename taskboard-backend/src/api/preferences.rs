use axum::{extract::State, response::Json};
use taskboard_core::config::WorkspaceState;
use taskboard_core::types::Status;

use crate::state::AppState;

pub async fn get_preferences(State(state): State<AppState>) -> Json<WorkspaceState> {
    Json(state.workspace_snapshot())
}

pub async fn put_column_order(
    State(state): State<AppState>,
    Json(order): Json<Vec<Status>>,
) -> Json<WorkspaceState> {
    Json(state.update_workspace(|w| w.set_column_order(&order)))
}

pub async fn clear_preferences(State(state): State<AppState>) -> Json<WorkspaceState> {
    log::info!("[taskboard.prefs] Clearing preferences");
    Json(state.update_workspace(WorkspaceState::clear))
}
