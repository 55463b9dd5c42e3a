/// HTTP server: axum on the tokio runtime, shut down through a watch channel.
use axum::Router;
use tokio::sync::watch;
use tower_http::cors::{Any, CorsLayer};

use crate::api::api_router;
use crate::state::AppState;

pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    api_router().layer(cors).with_state(state)
}

/// Bind and serve in a background task. Returns the port actually bound.
pub async fn spawn_server(
    state: AppState,
    mut shutdown_rx: watch::Receiver<bool>,
) -> Result<u16, Box<dyn std::error::Error>> {
    let port = state.port;
    let bind_addr = state.bind_address.clone();
    let app = app(state);

    let listener = tokio::net::TcpListener::bind(format!("{}:{}", bind_addr, port)).await?;
    let actual_port = listener.local_addr()?.port();

    log::info!(
        "HTTP server listening on http://{}:{}",
        bind_addr,
        actual_port
    );

    tokio::spawn(async move {
        let shutdown = async move {
            let _ = shutdown_rx.changed().await;
        };
        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await
        {
            log::error!("HTTP server exited with error: {}", e);
        }
    });

    Ok(actual_port)
}
