//! Real-time chat server.
//!
//! Authenticated participants connect over WebSocket, receive recent history,
//! and every accepted message is persisted before it is broadcast to all
//! live sessions.

pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod ui;
pub mod usecase;

// Re-export entry points
pub use ui::build_router;
pub use ui::run as run_server;
