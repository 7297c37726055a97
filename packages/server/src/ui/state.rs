//! Server state shared by every handler.

use serde::Deserialize;
use std::sync::Arc;

use crate::{
    domain::{AuthGateway, MessageRepository},
    infrastructure::registry::ConnectionRegistry,
    usecase::Broadcaster,
};

/// Query parameters for WebSocket connection
#[derive(Debug, Deserialize)]
pub struct ConnectQuery {
    pub token: Option<String>,
}

/// Query parameters for the message list endpoint
#[derive(Debug, Deserialize)]
pub struct MessagesQuery {
    pub limit: Option<i64>,
}

/// Shared application state
pub struct AppState {
    /// Repository（データアクセス層の抽象化）
    pub repository: Arc<dyn MessageRepository>,
    pub gateway: Arc<dyn AuthGateway>,
    pub registry: Arc<ConnectionRegistry>,
    pub broadcaster: Arc<Broadcaster>,
    /// Messages replayed to each new session
    pub history_limit: i64,
}

impl AppState {
    pub fn new(
        repository: Arc<dyn MessageRepository>,
        gateway: Arc<dyn AuthGateway>,
        history_limit: i64,
    ) -> Self {
        let registry = Arc::new(ConnectionRegistry::new());
        let broadcaster = Arc::new(Broadcaster::new(registry.clone()));
        Self {
            repository,
            gateway,
            registry,
            broadcaster,
            history_limit,
        }
    }
}
