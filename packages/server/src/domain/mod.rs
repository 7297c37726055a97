//! Domain layer for the chat application.
//!
//! This module contains business logic that is independent of
//! data transfer objects (DTOs) and infrastructure concerns.

pub mod entity;
pub mod error;
pub mod factory;
pub mod gateway;
pub mod repository;
pub mod session;
pub mod value_object;

pub use entity::{Message, NewMessage};
pub use error::{AuthError, StoreError, ValueObjectError};
pub use factory::SessionIdFactory;
pub use gateway::AuthGateway;
pub use repository::MessageRepository;
pub use session::{SessionLifecycle, SessionState};
pub use value_object::{Identity, MessageId, MessageText, SessionId, Timestamp};

#[cfg(test)]
pub use repository::MockMessageRepository;
