//! InMemory Message Repository 実装
//!
//! ドメイン層が定義する MessageRepository trait の具体的な実装。
//! タイムスタンプ順に整列した Vec をインメモリ DB として使用します。
//!
//! 挿入位置は二分探索で決めるため、過去の日時を持つメッセージ（fixture など）
//! を後から保存しても並び順は保たれます。同じタイムスタンプ同士は保存順です。

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::{
    Message, MessageId, MessageRepository, NewMessage, StoreError, Timestamp,
};

struct Inner {
    /// Ordered by (timestamp, id)
    messages: Vec<Message>,
    next_id: i64,
}

/// インメモリ Message Repository 実装
///
/// 読み取りは並行、書き込みは排他（RwLock）。
pub struct InMemoryMessageRepository {
    inner: RwLock<Inner>,
}

impl InMemoryMessageRepository {
    /// 新しい InMemoryMessageRepository を作成
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner {
                messages: Vec::new(),
                next_id: 1,
            }),
        }
    }
}

impl Default for InMemoryMessageRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MessageRepository for InMemoryMessageRepository {
    async fn save(&self, message: NewMessage) -> Result<Message, StoreError> {
        let timestamp = message.timestamp.unwrap_or_else(Timestamp::now);
        // Same range as the SQLite store
        if timestamp.unix_nanos().is_none() {
            return Err(StoreError::TimestampOutOfRange(timestamp.to_rfc3339()));
        }

        let mut inner = self.inner.write().await;

        let id = MessageId::new(inner.next_id);
        inner.next_id += 1;

        let stored = Message::stored(message, id, timestamp);

        let position = inner
            .messages
            .partition_point(|m| m.timestamp <= stored.timestamp);
        inner.messages.insert(position, stored.clone());

        Ok(stored)
    }

    async fn recent(&self, limit: i64) -> Result<Vec<Message>, StoreError> {
        if limit <= 0 {
            return Ok(Vec::new());
        }
        let inner = self.inner.read().await;
        let limit = usize::try_from(limit).unwrap_or(usize::MAX);
        let start = inner.messages.len().saturating_sub(limit);
        Ok(inner.messages[start..].to_vec())
    }

    async fn all(&self) -> Result<Vec<Message>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.messages.clone())
    }
}
