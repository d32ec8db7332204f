use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::server::AppState;

mod fleet;
mod gateway;
mod geo;
mod server;
mod snapshot;
mod tracking;

const DEFAULT_PORT: u16 = 3000;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let state = Arc::new(AppState::new(fleet::startup_fleet()));
    let app = server::router(state);

    let port = std::env::var("PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_PORT);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port))
        .await
        .unwrap();

    info!("Server is running on http://localhost:{}", port);
    axum::serve(listener, app).await.unwrap();
}
