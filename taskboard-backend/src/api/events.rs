use axum::{
    extract::State,
    response::{sse::Event, Json, Sse},
};
use std::convert::Infallible;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;

use crate::state::AppState;

/// SSE endpoint: streams HostMessage as JSON to connected views.
pub async fn sse_events(
    State(state): State<AppState>,
) -> Sse<impl tokio_stream::Stream<Item = Result<Event, Infallible>>> {
    let rx = state.host_tx.subscribe();
    let stream = BroadcastStream::new(rx).filter_map(|result| {
        let message = result.ok()?;
        let json = serde_json::to_string(&message).ok()?;
        Some(Ok(Event::default().data(json)))
    });

    // Keep-alive every 30 seconds
    let stream = stream.merge(tokio_stream::StreamExt::map(
        tokio_stream::wrappers::IntervalStream::new(tokio::time::interval(
            std::time::Duration::from_secs(30),
        )),
        |_| Ok(Event::default().comment("keep-alive")),
    ));

    Sse::new(stream)
}

pub async fn status(State(state): State<AppState>) -> Json<serde_json::Value> {
    let session = state.session.lock().await;
    let board = session.as_ref().map(|s| {
        serde_json::json!({
            "file": s.file(),
            "version": s.version(),
        })
    });
    Json(serde_json::json!({
        "status": "running",
        "port": state.port,
        "bind_address": state.bind_address,
        "board": board,
    }))
}

pub async fn list_logs() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "entries": crate::log_bridge::recent_entries(),
        "filePath": crate::log_bridge::log_file_path(),
    }))
}
