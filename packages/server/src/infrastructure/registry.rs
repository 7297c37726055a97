//! Live connection registry.
//!
//! The only structure every session mutates. The map is never handed out;
//! callers go through register / unregister / snapshot.

use std::{collections::HashMap, sync::Arc};

use thiserror::Error;
use tokio::sync::{Notify, RwLock, mpsc};

use crate::domain::{Identity, MessageId, SessionId};

/// Frames a session may have queued before it is treated as stalled.
pub const OUTBOUND_QUEUE_CAPACITY: usize = 256;

/// One serialized envelope queued for a session's writer task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundFrame {
    pub text: String,
    /// Id of the carried message, for `newMessage` frames
    pub message_id: Option<MessageId>,
}

impl OutboundFrame {
    pub fn new(text: String, message_id: Option<MessageId>) -> Self {
        Self { text, message_id }
    }
}

pub type OutboundSender = mpsc::Sender<OutboundFrame>;
pub type OutboundReceiver = mpsc::Receiver<OutboundFrame>;

/// Bounded outbound queue for one session.
pub fn outbound_channel() -> (OutboundSender, OutboundReceiver) {
    mpsc::channel(OUTBOUND_QUEUE_CAPACITY)
}

/// A frame could not be queued for a session.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DeliveryError {
    #[error("session {0} is closed")]
    Closed(SessionId),

    #[error("session {0} is not reading; outbound queue is full")]
    QueueFull(SessionId),
}

/// Non-owning handle used to write to a live session.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    pub id: SessionId,
    sender: OutboundSender,
    shutdown: Arc<Notify>,
}

impl SessionHandle {
    pub fn new(id: SessionId, sender: OutboundSender) -> Self {
        Self {
            id,
            sender,
            shutdown: Arc::new(Notify::new()),
        }
    }

    /// Queue one frame without waiting. Fails once the writer side has
    /// stopped or the queue is full.
    pub fn send(&self, frame: OutboundFrame) -> Result<(), DeliveryError> {
        self.sender.try_send(frame).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => DeliveryError::QueueFull(self.id.clone()),
            mpsc::error::TrySendError::Closed(_) => DeliveryError::Closed(self.id.clone()),
        })
    }

    /// Ask the connection task to close this session's transport.
    pub fn close(&self) {
        self.shutdown.notify_one();
    }

    /// Resolves once [`close`](Self::close) has been called on any clone.
    pub async fn closed(&self) {
        self.shutdown.notified().await;
    }
}

/// Client connection information
#[derive(Debug, Clone)]
pub struct ClientInfo {
    pub handle: SessionHandle,
    pub identity: Identity,
}

#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    sessions: RwLock<HashMap<SessionId, ClientInfo>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a session. The same identity may be registered any number of
    /// times under different session ids.
    pub async fn register(&self, handle: SessionHandle, identity: Identity) {
        let info = ClientInfo { handle, identity };
        let mut sessions = self.sessions.write().await;
        sessions.insert(info.handle.id.clone(), info);
    }

    /// Remove a session. Returns whether it was present.
    pub async fn unregister(&self, session_id: &SessionId) -> bool {
        let mut sessions = self.sessions.write().await;
        sessions.remove(session_id).is_some()
    }

    /// Point-in-time copy of every live session. The lock is released before
    /// this returns, so callers may do slow I/O over the result.
    pub async fn snapshot(&self) -> Vec<ClientInfo> {
        let sessions = self.sessions.read().await;
        sessions.values().cloned().collect()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}
