//! HTTP API response DTOs for the chat application.

use serde::{Deserialize, Serialize};

use super::websocket::MessageDto;

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthDto {
    pub status: String,
    /// Number of live WebSocket sessions
    pub connections: usize,
}

/// Recent message list
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageListDto {
    pub messages: Vec<MessageDto>,
}

/// Body of every error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponseDto {
    pub error: String,
}
