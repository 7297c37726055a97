//! UseCase: 参加者切断処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - DisconnectParticipantUseCase::execute() メソッド
//!
//! ### どのような状況を想定しているか
//! - 正常系：参加者の登録解除
//! - エッジケース：ブロードキャストで既に追い出されたセッションの切断（冪等）

use std::sync::Arc;

use crate::{domain::SessionId, infrastructure::registry::ConnectionRegistry};

/// 参加者切断のユースケース
pub struct DisconnectParticipantUseCase {
    registry: Arc<ConnectionRegistry>,
}

impl DisconnectParticipantUseCase {
    /// 新しい DisconnectParticipantUseCase を作成
    pub fn new(registry: Arc<ConnectionRegistry>) -> Self {
        Self { registry }
    }

    /// 参加者切断を実行
    ///
    /// # Returns
    ///
    /// セッションがまだ登録されていたかどうか
    pub async fn execute(&self, session_id: &SessionId) -> bool {
        let removed = self.registry.unregister(session_id).await;
        tracing::info!(
            "session {} closed ({} remaining)",
            session_id,
            self.registry.len().await
        );
        removed
    }
}
