// SPDX-License-Identifier: PMPL-1.0-or-later
//! AssetCheck API server binary
//!
//! Starts the HTTP API server. Configuration comes from `ASSETCHECK_*`
//! environment variables; log filtering from `RUST_LOG`.

use assetcheck_api::ApiConfig;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = ApiConfig::from_env();

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if config.log_json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    tracing::info!(
        "Starting AssetCheck API server on {}:{}",
        config.host,
        config.port
    );

    assetcheck_api::serve(config).await?;

    Ok(())
}
