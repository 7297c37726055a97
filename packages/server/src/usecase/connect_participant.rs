//! UseCase: 参加者接続処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - ConnectParticipantUseCase::execute() メソッド
//! - 認証済み参加者の登録と、直近履歴の取得
//!
//! ### なぜこのテストが必要か
//! - 新規参加者は最初に history を受け取る必要がある
//! - 履歴取得の失敗で接続自体が失敗してはならない（best-effort）
//!
//! ### どのような状況を想定しているか
//! - 正常系：登録され、直近履歴が古い順で返される
//! - 異常系：ストアが失敗しても登録は完了し、履歴は None
//! - エッジケース：同じ Identity による複数接続

use std::sync::Arc;

use crate::{
    domain::{Identity, Message, MessageId, MessageRepository, SessionIdFactory},
    infrastructure::registry::{ConnectionRegistry, OutboundSender, SessionHandle},
};

/// Default number of messages replayed to a new session
pub const DEFAULT_HISTORY_LIMIT: i64 = 50;

/// 接続結果
#[derive(Debug)]
pub struct ConnectedSession {
    pub handle: SessionHandle,
    /// `None` when the store could not be read; the session still proceeds.
    pub history: Option<Vec<Message>>,
}

impl ConnectedSession {
    /// Highest message id included in `history`.
    ///
    /// The session is registered before history is read, so a message saved
    /// in between arrives both in `history` and as a queued `newMessage`.
    /// Queued frames at or below this id are duplicates.
    pub fn history_high_water(&self) -> Option<MessageId> {
        self.history
            .as_ref()
            .and_then(|messages| messages.iter().map(|m| m.id).max())
    }
}

/// 参加者接続のユースケース
pub struct ConnectParticipantUseCase {
    registry: Arc<ConnectionRegistry>,
    /// Repository（データアクセス層の抽象化）
    repository: Arc<dyn MessageRepository>,
    history_limit: i64,
}

impl ConnectParticipantUseCase {
    /// 新しい ConnectParticipantUseCase を作成
    pub fn new(
        registry: Arc<ConnectionRegistry>,
        repository: Arc<dyn MessageRepository>,
        history_limit: i64,
    ) -> Self {
        Self {
            registry,
            repository,
            history_limit,
        }
    }

    /// 参加者接続を実行
    ///
    /// # Arguments
    ///
    /// * `identity` - 認証済みの Identity
    /// * `sender` - このセッション宛てのフレーム送信チャンネル
    pub async fn execute(&self, identity: Identity, sender: OutboundSender) -> ConnectedSession {
        // 1. Registry に登録
        let handle = SessionHandle::new(SessionIdFactory::generate(), sender);
        self.registry.register(handle.clone(), identity.clone()).await;
        tracing::info!("session {} registered for '{}'", handle.id, identity);

        // 2. 直近の履歴を取得（失敗してもセッションは続行）
        let history = match self.repository.recent(self.history_limit).await {
            Ok(messages) => Some(messages),
            Err(e) => {
                tracing::warn!("failed to load history for '{}': {}", identity, e);
                None
            }
        };

        ConnectedSession { handle, history }
    }
}
