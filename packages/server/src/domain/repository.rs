//! Repository trait definitions.
//!
//! The domain layer owns the contracts; `infrastructure::repository`
//! provides the implementations (dependency inversion).

use async_trait::async_trait;

use super::{
    entity::{Message, NewMessage},
    error::StoreError,
};

/// Persistent message store.
///
/// Implementations must keep ids unique and strictly increasing in
/// assignment order, and return messages oldest-first by timestamp with
/// ties broken by id.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessageRepository: Send + Sync {
    /// Persist a message and return the stored copy.
    ///
    /// A missing timestamp is filled in with the current UTC time.
    async fn save(&self, message: NewMessage) -> Result<Message, StoreError>;

    /// The `limit` most recent messages, oldest-first.
    ///
    /// A `limit` of zero or less yields an empty vector.
    async fn recent(&self, limit: i64) -> Result<Vec<Message>, StoreError>;

    /// Every stored message, oldest-first.
    async fn all(&self) -> Result<Vec<Message>, StoreError>;
}
