//! Session lifecycle.

use std::fmt;

/// Lifecycle of one connection.
///
/// `Connecting → Authenticating → Authenticated → Streaming → Closed`.
/// Any state may jump straight to `Closed`; `Closed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    Connecting,
    Authenticating,
    Authenticated,
    Streaming,
    Closed,
}

impl SessionState {
    pub fn can_transition_to(self, next: SessionState) -> bool {
        use SessionState::*;
        matches!(
            (self, next),
            (Connecting, Authenticating)
                | (Authenticating, Authenticated)
                | (Authenticated, Streaming)
                | (Connecting | Authenticating | Authenticated | Streaming, Closed)
        )
    }

    pub fn is_terminal(self) -> bool {
        self == SessionState::Closed
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Connecting => "connecting",
            SessionState::Authenticating => "authenticating",
            SessionState::Authenticated => "authenticated",
            SessionState::Streaming => "streaming",
            SessionState::Closed => "closed",
        };
        f.write_str(name)
    }
}

/// Tracks the state of one session and logs each transition.
#[derive(Debug)]
pub struct SessionLifecycle {
    state: SessionState,
}

impl SessionLifecycle {
    pub fn new() -> Self {
        Self {
            state: SessionState::Connecting,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Move to `next`. Illegal transitions are logged and ignored.
    pub fn advance(&mut self, next: SessionState) {
        if !self.state.can_transition_to(next) {
            tracing::warn!("ignoring session transition {} -> {}", self.state, next);
            return;
        }
        tracing::debug!("session {} -> {}", self.state, next);
        self.state = next;
    }
}

impl Default for SessionLifecycle {
    fn default() -> Self {
        Self::new()
    }
}
