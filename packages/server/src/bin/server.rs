//! Keeper chat server.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin keeper-server -- --token secret=alice --token hunter2=bob
//! ```

use clap::Parser;
use keeper_server::config::ServerConfig;
use keeper_shared::logger::setup_logger;

#[tokio::main]
async fn main() {
    let config = ServerConfig::parse();

    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), &config.log_level);

    // Run the server
    if let Err(e) = keeper_server::run_server(config).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
