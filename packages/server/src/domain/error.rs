//! Domain layer error definitions.

use thiserror::Error;

/// Errors related to Value Objects validation
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValueObjectError {
    #[error("identity cannot be empty")]
    IdentityEmpty,

    #[error("message text cannot be empty")]
    MessageTextEmpty,
}

/// Errors raised by a message store.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Unrecoverable backend failure (I/O, SQL, connection pool).
    #[error("storage failure: {0}")]
    Storage(String),

    /// A persisted row could not be turned back into a domain message.
    #[error("corrupt message row {id}: {reason}")]
    CorruptRow { id: i64, reason: String },

    /// The timestamp falls outside the range every store can hold
    /// (see [`Timestamp::unix_nanos`](super::Timestamp::unix_nanos)).
    #[error("timestamp out of range: {0}")]
    TimestampOutOfRange(String),
}

/// Reasons an [`AuthGateway`](super::AuthGateway) refuses a credential.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("missing credential")]
    MissingCredential,

    #[error("invalid or expired credential")]
    InvalidCredential,

    /// Anything else: the identity backend is unreachable, misbehaving, ...
    #[error("authentication backend failure: {0}")]
    Gateway(String),
}
