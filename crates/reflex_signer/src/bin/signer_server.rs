//! # Signer Server
//!
//! Serves `POST /api/generate-mint-signature`.
//!
//! ## Usage
//!
//! ```bash
//! SIGNER_PRIVATE_KEY=0x... NFT_CONTRACT_ADDRESS=0x... signer_server
//! ```
//!
//! Reads `.env` if present, then `REFLEX_SIGNER_CONFIG` (TOML), then the
//! environment. `SIGNER_BIND` sets the listen address.

use std::sync::Arc;

use anyhow::{Context, Result};
use reflex_shared::SystemClock;
use reflex_signer::{http, ServerSettings, SignatureService, SignerConfig};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (silently ignore if not found)
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = SignerConfig::from_env().context("loading signer configuration")?;
    let settings = ServerSettings::from_env().context("loading server settings")?;
    tracing::info!("Signer configuration: {:?}", config);

    let service = Arc::new(SignatureService::new(&config, Arc::new(SystemClock)));
    let listener = TcpListener::bind(settings.bind)
        .await
        .with_context(|| format!("binding {}", settings.bind))?;

    http::serve(listener, service).await.context("serving HTTP")?;
    Ok(())
}
