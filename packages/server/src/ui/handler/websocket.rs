//! WebSocket connection handlers.

use std::{ops::ControlFlow, sync::Arc};

use axum::{
    Json,
    extract::{
        Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
};
use futures_util::{
    sink::SinkExt,
    stream::{Stream, StreamExt},
};
use tokio::sync::Notify;

use crate::{
    domain::{AuthError, Identity, MessageId, SessionLifecycle, SessionState},
    infrastructure::{
        dto::{
            http::ErrorResponseDto,
            websocket::{ClientEnvelope, ProtocolError, ServerEnvelope},
        },
        registry::{OutboundFrame, SessionHandle, outbound_channel},
    },
    ui::state::{AppState, ConnectQuery},
    usecase::{
        ConnectParticipantUseCase, ConnectedSession, DisconnectParticipantUseCase,
        SendMessageUseCase,
    },
};

/// Cookie consulted when the `token` query parameter is absent or empty
pub const SESSION_COOKIE: &str = "keeper_session";

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Query(query): Query<ConnectQuery>,
    headers: HeaderMap,
) -> Response {
    let mut lifecycle = SessionLifecycle::new();
    lifecycle.advance(SessionState::Authenticating);

    let credential = credential(query, &headers);
    match state.gateway.resolve(credential.as_deref()).await {
        Ok(identity) => {
            lifecycle.advance(SessionState::Authenticated);
            tracing::info!("'{}' authenticated, upgrading connection", identity);
            ws.on_upgrade(move |socket| handle_socket(socket, state, identity, lifecycle))
        }
        Err(e) => {
            tracing::warn!("rejecting websocket connection: {}", e);
            lifecycle.advance(SessionState::Closed);
            auth_rejection(&e).into_response()
        }
    }
}

/// Status and body returned when the upgrade is refused.
fn auth_rejection(err: &AuthError) -> (StatusCode, Json<ErrorResponseDto>) {
    let (status, reason) = match err {
        AuthError::MissingCredential => (
            StatusCode::UNAUTHORIZED,
            "authentication required: missing credential",
        ),
        AuthError::InvalidCredential => (StatusCode::UNAUTHORIZED, "invalid or expired credential"),
        AuthError::Gateway(_) => (StatusCode::SERVICE_UNAVAILABLE, "authentication failed"),
    };
    (
        status,
        Json(ErrorResponseDto {
            error: reason.to_string(),
        }),
    )
}

/// `?token=` when non-empty, otherwise the session cookie.
fn credential(query: ConnectQuery, headers: &HeaderMap) -> Option<String> {
    query
        .token
        .filter(|token| !token.is_empty())
        .or_else(|| session_cookie(headers))
}

fn session_cookie(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == SESSION_COOKIE && !value.is_empty())
        .map(|(_, value)| value.to_string())
}

async fn handle_socket(
    socket: WebSocket,
    state: Arc<AppState>,
    identity: Identity,
    mut lifecycle: SessionLifecycle,
) {
    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = outbound_channel();

    lifecycle.advance(SessionState::Streaming);
    let connect_usecase = ConnectParticipantUseCase::new(
        state.registry.clone(),
        state.repository.clone(),
        state.history_limit,
    );
    let connected = connect_usecase.execute(identity.clone(), tx).await;
    let high_water = connected.history_high_water();
    let ConnectedSession { handle, history } = connected;

    // Written before the writer task starts, so history is always the first frame
    if let Some(history) = history {
        let frame = ServerEnvelope::history(&history).to_json();
        match sender.send(Message::Text(frame.into())).await {
            Ok(()) => tracing::info!("sent {} history message(s) to '{}'", history.len(), identity),
            Err(e) => tracing::warn!("failed to send history to '{}': {}", identity, e),
        }
    }

    // Drain this session's outbound queue into the socket
    let mut send_task = tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            if replayed_in_history(&frame, high_water) {
                continue;
            }
            if sender.send(Message::Text(frame.text.into())).await.is_err() {
                break;
            }
        }
        let _ = sender.close().await;
    });

    let session = SessionContext {
        handle: handle.clone(),
        identity: identity.clone(),
        send_message: SendMessageUseCase::new(state.repository.clone(), state.broadcaster.clone()),
    };

    let stop_reading = Arc::new(Notify::new());
    let mut recv_task = tokio::spawn(read_frames(receiver, session, stop_reading.clone()));

    tokio::select! {
        _ = &mut recv_task => send_task.abort(),
        _ = &mut send_task => {
            stop_reading.notify_one();
            let _ = recv_task.await;
        }
        _ = handle.closed() => {
            tracing::warn!("session {} of '{}' evicted, closing", handle.id, identity);
            stop_reading.notify_one();
            let _ = recv_task.await;
            send_task.abort();
        }
    };

    let disconnect_usecase = DisconnectParticipantUseCase::new(state.registry.clone());
    disconnect_usecase.execute(&handle.id).await;
    lifecycle.advance(SessionState::Closed);
}

/// Read loop: frames are handled one at a time, in arrival order.
///
/// `stop` only interrupts the wait for the next frame; a frame already being
/// handled is saved and broadcast in full.
async fn read_frames<S>(mut receiver: S, session: SessionContext, stop: Arc<Notify>)
where
    S: Stream<Item = Result<Message, axum::Error>> + Unpin,
{
    loop {
        let frame = tokio::select! {
            frame = receiver.next() => frame,
            _ = stop.notified() => break,
        };
        let frame = match frame {
            Some(Ok(frame)) => frame,
            Some(Err(e)) => {
                tracing::warn!("websocket error for '{}': {}", session.identity, e);
                break;
            }
            None => break,
        };
        if session.handle_frame(frame).await.is_break() {
            break;
        }
    }
}

/// A queued `newMessage` already delivered in the history frame.
fn replayed_in_history(frame: &OutboundFrame, high_water: Option<MessageId>) -> bool {
    matches!((frame.message_id, high_water), (Some(id), Some(max)) if id <= max)
}

/// Per-session view used by the read loop.
struct SessionContext {
    handle: SessionHandle,
    identity: Identity,
    send_message: SendMessageUseCase,
}

impl SessionContext {
    async fn handle_frame(&self, frame: Message) -> ControlFlow<()> {
        match frame {
            Message::Text(text) => {
                self.handle_text(text.as_str()).await;
                ControlFlow::Continue(())
            }
            Message::Binary(_) => {
                self.reply_error(ProtocolError::BinaryFrame.to_string());
                ControlFlow::Continue(())
            }
            // Ping/pong is handled automatically by the WebSocket protocol
            Message::Ping(_) | Message::Pong(_) => ControlFlow::Continue(()),
            Message::Close(_) => {
                tracing::info!("'{}' requested close", self.identity);
                ControlFlow::Break(())
            }
        }
    }

    async fn handle_text(&self, text: &str) {
        match ClientEnvelope::parse(text) {
            Ok(ClientEnvelope::SendMessage(payload)) => {
                if let Err(e) = self
                    .send_message
                    .execute(self.identity.clone(), payload.text)
                    .await
                {
                    tracing::warn!("message from '{}' rejected: {}", self.identity, e);
                    self.reply_error(e.to_string());
                }
            }
            Err(e) => {
                tracing::warn!("bad envelope from '{}': {}", self.identity, e);
                self.reply_error(e.to_string());
            }
        }
    }

    /// Error envelopes go to this session only.
    fn reply_error(&self, message: String) {
        let frame = OutboundFrame::new(ServerEnvelope::error(message).to_json(), None);
        if let Err(e) = self.handle.send(frame) {
            tracing::debug!("could not deliver error envelope: {}", e);
        }
    }
}
