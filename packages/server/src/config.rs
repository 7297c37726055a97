//! Command line and environment configuration.

use std::{path::PathBuf, str::FromStr};

use axum::http::HeaderValue;
use clap::{Parser, ValueEnum};

use crate::{
    domain::Identity,
    infrastructure::auth::StaticTokenGateway,
    usecase::DEFAULT_HISTORY_LIMIT,
};

pub const DEFAULT_CORS_ORIGIN: &str = "http://localhost:8081";

/// Message store backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StoreKind {
    /// Process-local, lost on restart
    Memory,
    /// SQLite file at `--db-path`
    Sqlite,
}

/// One `TOKEN=IDENTITY` pair accepted by the static token gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenSpec {
    pub token: String,
    pub identity: Identity,
}

impl FromStr for TokenSpec {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (token, identity) = s
            .split_once('=')
            .ok_or_else(|| format!("expected TOKEN=IDENTITY, got '{s}'"))?;
        if token.is_empty() {
            return Err("token cannot be empty".to_string());
        }
        let identity = Identity::try_from(identity).map_err(|e| e.to_string())?;
        Ok(Self {
            token: token.to_string(),
            identity,
        })
    }
}

#[derive(Debug, Clone, Parser)]
#[command(name = "keeper-server", version, about = "Real-time chat server")]
pub struct ServerConfig {
    /// Address to bind
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on
    #[arg(long, env = "PORT", default_value_t = 8080)]
    pub port: u16,

    /// Message store backend
    #[arg(long, env = "KEEPER_STORE", value_enum, default_value_t = StoreKind::Sqlite)]
    pub store: StoreKind,

    /// SQLite database file (only with `--store sqlite`)
    #[arg(long, env = "DB_PATH", default_value = "./keeper.db")]
    pub db_path: PathBuf,

    /// Number of messages replayed to a newly connected session
    #[arg(
        long,
        env = "HISTORY_LIMIT",
        default_value_t = DEFAULT_HISTORY_LIMIT,
        value_parser = clap::value_parser!(i64).range(0..)
    )]
    pub history_limit: i64,

    /// Accepted credential as TOKEN=IDENTITY; repeatable
    #[arg(long = "token", env = "KEEPER_TOKENS", value_delimiter = ',')]
    pub tokens: Vec<TokenSpec>,

    /// Browser origin allowed to call the API with cookies
    #[arg(long, env = "CORS_ORIGIN", default_value = DEFAULT_CORS_ORIGIN)]
    pub cors_origin: HeaderValue,

    /// Default log level when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

impl ServerConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Build the token gateway from `--token` entries.
    pub fn gateway(&self) -> StaticTokenGateway {
        self.tokens
            .iter()
            .map(|spec| (spec.token.clone(), spec.identity.clone()))
            .collect()
    }
}
