//! HTTP server initialization and routing

use axum::{routing::get, Router};
use log::{error, info};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::core::shared::AppState;
use crate::core::urls::ApiUrls;
use crate::security::create_cors_layer;

use super::{db_status, health_check, shutdown_signal};

pub fn build_router(app_state: Arc<AppState>) -> Router {
    let cors = create_cors_layer(&app_state.config.server.cors_allowed_origins);

    Router::new()
        .route(ApiUrls::HEALTH, get(health_check))
        .route(ApiUrls::DB_STATUS, get(db_status))
        .merge(crate::directory::configure())
        .merge(crate::project::configure())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}

pub async fn run_axum_server(app_state: Arc<AppState>) -> std::io::Result<()> {
    let server = &app_state.config.server;
    let addr: SocketAddr = format!("{}:{}", server.host, server.port)
        .parse()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;

    let app = build_router(Arc::clone(&app_state));

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            error!(
                "Failed to bind to {}: {} - is another instance running?",
                addr, e
            );
            return Err(e);
        }
    };
    info!("HTTP server listening on {} ({})", addr, server.environment);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}
