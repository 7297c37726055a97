//! Core domain models for the chat application.

use super::value_object::{Identity, MessageId, MessageText, Timestamp};

/// A chat message as submitted by a participant, before the store has
/// assigned it an id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMessage {
    /// Sender's identity
    pub author: Identity,
    /// Message body
    pub text: MessageText,
    /// Explicit timestamp; the store assigns the current time when `None`
    pub timestamp: Option<Timestamp>,
}

impl NewMessage {
    /// Create a message that the store will timestamp on save.
    pub fn new(author: Identity, text: MessageText) -> Self {
        Self {
            author,
            text,
            timestamp: None,
        }
    }

    /// Create a message carrying its own timestamp (backdated fixtures,
    /// imports).
    pub fn with_timestamp(author: Identity, text: MessageText, timestamp: Timestamp) -> Self {
        Self {
            author,
            text,
            timestamp: Some(timestamp),
        }
    }
}

/// A persisted chat message. Immutable once stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Store-assigned identifier
    pub id: MessageId,
    /// Sender's identity
    pub author: Identity,
    /// Message body
    pub text: MessageText,
    /// Time the message was sent (UTC)
    pub timestamp: Timestamp,
}

impl Message {
    /// Materialise a stored message from a submission and the values the
    /// store assigned.
    pub fn stored(new: NewMessage, id: MessageId, timestamp: Timestamp) -> Self {
        Self {
            id,
            author: new.author,
            text: new.text,
            timestamp,
        }
    }
}
