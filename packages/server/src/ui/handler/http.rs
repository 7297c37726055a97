//! HTTP API endpoint handlers.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
};

use crate::{
    infrastructure::dto::{
        http::{ErrorResponseDto, HealthDto, MessageListDto},
        websocket::MessageDto,
    },
    ui::state::{AppState, MessagesQuery},
};

/// Health check endpoint
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthDto> {
    Json(HealthDto {
        status: "ok".to_string(),
        connections: state.registry.len().await,
    })
}

/// Recent messages, oldest-first
pub async fn get_messages(
    State(state): State<Arc<AppState>>,
    Query(query): Query<MessagesQuery>,
) -> Result<Json<MessageListDto>, (StatusCode, Json<ErrorResponseDto>)> {
    let limit = query.limit.unwrap_or(state.history_limit);

    match state.repository.recent(limit).await {
        Ok(messages) => Ok(Json(MessageListDto {
            messages: messages.iter().map(MessageDto::from).collect(),
        })),
        Err(e) => {
            tracing::error!("failed to list messages: {}", e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponseDto {
                    error: "failed to load messages".to_string(),
                }),
            ))
        }
    }
}
