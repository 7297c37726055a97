//! UseCase 層
//!
//! ビジネスロジックを実装するレイヤー。
//! UI 層から呼び出され、Domain 層を操作します。

pub mod broadcast;
pub mod connect_participant;
pub mod disconnect_participant;
pub mod error;
pub mod send_message;

pub use broadcast::{BroadcastReport, Broadcaster};
pub use connect_participant::{ConnectParticipantUseCase, ConnectedSession, DEFAULT_HISTORY_LIMIT};
pub use disconnect_participant::DisconnectParticipantUseCase;
pub use error::SendMessageError;
pub use send_message::SendMessageUseCase;
