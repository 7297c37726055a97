//! HTTP and WebSocket surface of the chat server.

mod handler;
mod runner;
mod signal;
pub mod state;

pub use runner::{build_router, open_repository, run};
