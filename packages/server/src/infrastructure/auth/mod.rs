//! AuthGateway implementations.

pub mod static_token;

pub use static_token::{StaticTokenGateway, TokenGrant};
