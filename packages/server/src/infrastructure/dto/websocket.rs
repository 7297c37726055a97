//! WebSocket envelope DTOs for the chat application.
//!
//! Every frame is `{ "type": "...", "payload": ... }`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{Message, MessageId};

/// Message as it appears on the wire
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageDto {
    pub id: i64,
    pub user: String,
    pub text: String,
    /// RFC 3339, UTC
    pub timestamp: String,
}

impl From<&Message> for MessageDto {
    fn from(message: &Message) -> Self {
        Self {
            id: message.id.value(),
            user: message.author.as_str().to_string(),
            text: message.text.as_str().to_string(),
            timestamp: message.timestamp.to_rfc3339(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryPayload {
    pub messages: Vec<MessageDto>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub message: String,
}

/// Server-originated envelopes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum ServerEnvelope {
    History(HistoryPayload),
    NewMessage(MessageDto),
    Error(ErrorPayload),
}

impl ServerEnvelope {
    pub fn history(messages: &[Message]) -> Self {
        Self::History(HistoryPayload {
            messages: messages.iter().map(MessageDto::from).collect(),
        })
    }

    pub fn new_message(message: &Message) -> Self {
        Self::NewMessage(MessageDto::from(message))
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Error(ErrorPayload {
            message: message.into(),
        })
    }

    /// Id of the carried message, for `newMessage`.
    pub fn message_id(&self) -> Option<MessageId> {
        match self {
            Self::NewMessage(dto) => Some(MessageId::new(dto.id)),
            Self::History(_) | Self::Error(_) => None,
        }
    }

    /// Serialize to a JSON text frame.
    pub fn to_json(&self) -> String {
        // Only strings and integers inside; serialization cannot fail.
        serde_json::to_string(self).unwrap_or_else(|e| {
            tracing::error!("failed to serialize envelope: {e}");
            String::from(r#"{"type":"error","payload":{"message":"internal error"}}"#)
        })
    }
}

/// Payload of a `sendMessage` request
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SendMessagePayload {
    pub text: String,
}

/// Client-originated envelopes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEnvelope {
    SendMessage(SendMessagePayload),
}

/// Why an inbound frame could not be turned into a [`ClientEnvelope`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("malformed envelope: {0}")]
    Malformed(String),

    #[error("unknown message type: {0}")]
    UnknownType(String),

    #[error("invalid payload for {kind}: {reason}")]
    InvalidPayload { kind: String, reason: String },

    #[error("binary frames are not supported")]
    BinaryFrame,
}

#[derive(Deserialize)]
struct RawEnvelope {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    payload: serde_json::Value,
}

impl ClientEnvelope {
    /// Decode one text frame.
    pub fn parse(frame: &str) -> Result<Self, ProtocolError> {
        let RawEnvelope { kind, payload } =
            serde_json::from_str(frame).map_err(|e| ProtocolError::Malformed(e.to_string()))?;

        match kind.as_str() {
            "sendMessage" => serde_json::from_value(payload)
                .map(Self::SendMessage)
                .map_err(|e| ProtocolError::InvalidPayload {
                    kind: kind.clone(),
                    reason: e.to_string(),
                }),
            other => Err(ProtocolError::UnknownType(other.to_string())),
        }
    }
}
