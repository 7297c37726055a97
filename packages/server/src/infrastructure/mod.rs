//! Infrastructure layer.
//!
//! Concrete stores, the auth gateway, the live connection registry and the
//! wire DTOs.

pub mod auth;
pub mod dto;
pub mod registry;
pub mod repository;
