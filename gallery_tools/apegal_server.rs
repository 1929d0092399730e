// gallery_tools/apegal_server.rs
use std::process::ExitCode;

use tracing::error;
use tracing_subscriber::EnvFilter;

use apegal::config::load_config;
use apegal::server::{serve, ServerConfig};

#[tokio::main]
async fn main() -> ExitCode {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init();

    let cfg = ServerConfig::from_app_config(&load_config());
    match serve(cfg).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("server failed: {e}");
            ExitCode::FAILURE
        }
    }
}
