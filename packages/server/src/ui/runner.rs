//! Server bootstrap: store selection, routing and the accept loop.

use std::{sync::Arc, time::Duration};

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    routing::get,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    config::{ServerConfig, StoreKind},
    domain::MessageRepository,
    error::ServerError,
    infrastructure::repository::{InMemoryMessageRepository, SqliteMessageRepository},
    ui::{
        handler::{get_messages, health_check, websocket_handler},
        signal::shutdown_signal,
        state::AppState,
    },
};

/// Routes served by the chat server.
pub fn build_router(state: Arc<AppState>, cors_origin: HeaderValue) -> Router {
    Router::new()
        .route("/ws", get(websocket_handler))
        .route("/api/health", get(health_check))
        .route("/api/messages", get(get_messages))
        .layer(cors_layer(cors_origin))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Browser access from a single origin, with cookies.
///
/// Credentials rule out a wildcard origin, so exactly one origin is allowed.
fn cors_layer(origin: HeaderValue) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(origin)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT])
        .max_age(Duration::from_secs(86400))
}

/// Open the message store selected by `--store`.
pub async fn open_repository(
    config: &ServerConfig,
) -> Result<Arc<dyn MessageRepository>, ServerError> {
    match config.store {
        StoreKind::Memory => {
            tracing::warn!("using in-memory message store; history is lost on restart");
            Ok(Arc::new(InMemoryMessageRepository::new()))
        }
        StoreKind::Sqlite => {
            let repository = SqliteMessageRepository::connect(&config.db_path).await?;
            Ok(Arc::new(repository))
        }
    }
}

/// Run the server until a shutdown signal arrives.
pub async fn run(config: ServerConfig) -> Result<(), ServerError> {
    let repository = open_repository(&config).await?;

    let gateway = config.gateway();
    if gateway.is_empty() {
        tracing::warn!("no tokens configured; every connection will be rejected");
    }

    let state = Arc::new(AppState::new(
        repository,
        Arc::new(gateway),
        config.history_limit,
    ));
    let app = build_router(state, config.cors_origin.clone());

    let address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .map_err(|source| ServerError::Bind {
            address: address.clone(),
            source,
        })?;

    tracing::info!("WebSocket server listening on ws://{}/ws", address);
    tracing::info!("Health check: http://{}/api/health", address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server stopped");
    Ok(())
}
