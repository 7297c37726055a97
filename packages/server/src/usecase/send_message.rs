//! UseCase: メッセージ送信処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - SendMessageUseCase::execute() メソッド
//! - 本文の検証、永続化、全参加者（送信者を含む）へのブロードキャスト
//!
//! ### なぜこのテストが必要か
//! - 永続化がブロードキャストより先に完了することを保証する
//! - 保存に失敗したメッセージが配信されないことを保証する
//!
//! ### どのような状況を想定しているか
//! - 正常系：保存されたメッセージが送信者を含む全員に届く
//! - 異常系：空の本文、ストア障害
//! - エッジケース：送信者のみが接続している場合

use std::sync::Arc;

use crate::{
    domain::{Identity, Message, MessageRepository, MessageText, NewMessage},
    infrastructure::dto::websocket::ServerEnvelope,
};

use super::{broadcast::Broadcaster, error::SendMessageError};

/// メッセージ送信のユースケース
pub struct SendMessageUseCase {
    /// Repository（データアクセス層の抽象化）
    repository: Arc<dyn MessageRepository>,
    broadcaster: Arc<Broadcaster>,
}

impl SendMessageUseCase {
    /// 新しい SendMessageUseCase を作成
    pub fn new(repository: Arc<dyn MessageRepository>, broadcaster: Arc<Broadcaster>) -> Self {
        Self {
            repository,
            broadcaster,
        }
    }

    /// メッセージ送信を実行
    ///
    /// # Arguments
    ///
    /// * `author` - 送信者（セッションに紐づく Identity）
    /// * `text` - クライアントから受け取った本文
    ///
    /// # Returns
    ///
    /// * `Ok(Message)` - 保存・配信されたメッセージ
    /// * `Err(SendMessageError)` - 検証または保存に失敗（配信されない）
    pub async fn execute(&self, author: Identity, text: String) -> Result<Message, SendMessageError> {
        // 1. 本文の検証
        let text = MessageText::new(text)?;

        // 2. 永続化（id とタイムスタンプはストアが割り当てる）
        let message = self
            .repository
            .save(NewMessage::new(author, text))
            .await
            .inspect_err(|e| tracing::error!("failed to save message: {}", e))?;

        // 3. 送信者を含む全員へブロードキャスト
        self.broadcaster
            .broadcast(&ServerEnvelope::new_message(&message))
            .await;

        Ok(message)
    }
}
