//! Router setup with relay routes and middleware.

use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use sakila_core::config::SakilaConfig;
use sakila_core::{Result, SakilaError};

use crate::handlers;
use crate::state::RelayState;

/// Create the axum Router for the relay.
///
/// The question route comes from configuration; `/health` is always present.
pub fn create_router(state: RelayState) -> Router {
    let origins: Vec<HeaderValue> = state
        .allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT]);

    let route = state.route.to_string();

    Router::new()
        .route("/health", get(handlers::health))
        .route(&route, post(handlers::relay))
        .layer(DefaultBodyLimit::max(64 * 1024))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Start the relay on 127.0.0.1 and serve until Ctrl-C.
pub async fn start_server(config: &SakilaConfig, state: RelayState) -> Result<()> {
    let addr = format!("127.0.0.1:{}", config.relay.port);
    let route = state.route.clone();
    let upstream = state.upstream.clone();

    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| SakilaError::Api(format!("Failed to bind {}: {}", addr, e)))?;

    tracing::info!("Relay listening on http://{}{} -> {}", addr, route, upstream);

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutting down relay");
        })
        .await
        .map_err(|e| SakilaError::Api(format!("Server error: {}", e)))?;

    Ok(())
}
