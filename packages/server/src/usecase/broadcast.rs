//! Broadcaster: fan-out of one envelope to every live session
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - Broadcaster::broadcast() メソッド
//! - 全セッションへの配信と、配信に失敗したセッションの登録解除
//!
//! ### どのような状況を想定しているか
//! - 正常系：送信者を含む全員に同じフレームが届く
//! - 異常系：切断済み・読み出し停止中のセッションは登録解除され、close が通知される
//! - エッジケース：接続者がいない場合

use std::sync::Arc;

use crate::{
    domain::SessionId,
    infrastructure::{
        dto::websocket::ServerEnvelope,
        registry::{ConnectionRegistry, OutboundFrame},
    },
};

/// Outcome of one fan-out
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    pub delivered: usize,
    pub evicted: Vec<SessionId>,
}

pub struct Broadcaster {
    registry: Arc<ConnectionRegistry>,
}

impl Broadcaster {
    pub fn new(registry: Arc<ConnectionRegistry>) -> Self {
        Self { registry }
    }

    /// Deliver `envelope` to every session registered right now.
    ///
    /// Sessions whose writer has gone away, or whose queue is full because
    /// the peer stopped reading, are unregistered and told to close. Returns
    /// once every session in the snapshot has been tried.
    pub async fn broadcast(&self, envelope: &ServerEnvelope) -> BroadcastReport {
        let frame = OutboundFrame::new(envelope.to_json(), envelope.message_id());
        let mut report = BroadcastReport::default();

        for client in self.registry.snapshot().await {
            match client.handle.send(frame.clone()) {
                Ok(()) => report.delivered += 1,
                Err(e) => {
                    tracing::warn!("evicting '{}': {}", client.identity, e);
                    self.registry.unregister(&client.handle.id).await;
                    client.handle.close();
                    report.evicted.push(client.handle.id);
                }
            }
        }

        tracing::debug!(
            "broadcast delivered to {} session(s), evicted {}",
            report.delivered,
            report.evicted.len()
        );
        report
    }
}
