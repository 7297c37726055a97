//! Shared utilities for Keeper.
//!
//! Logger initialisation and UTC time helpers used by every binary in the
//! workspace.

pub mod logger;
pub mod time;
