//! UseCase 層のエラー定義

use thiserror::Error;

use crate::domain::{StoreError, ValueObjectError};

/// メッセージ送信のエラー
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SendMessageError {
    /// Empty or oversized text
    #[error("{0}")]
    InvalidText(#[from] ValueObjectError),

    /// The store rejected the message; nothing was broadcast
    #[error("failed to save message")]
    Storage(#[from] StoreError),
}
