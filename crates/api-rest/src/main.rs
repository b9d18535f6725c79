//! Standalone REST API server binary.
//!
//! ## Purpose
//! Runs the referral REST API server on its own.
//!
//! ## Intended use
//! Useful for development and debugging when you only want the REST server
//! (with OpenAPI/Swagger UI). Deployments normally run the workspace's main
//! `referral-run` binary, which is this plus dotenv loading.

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_rest::{AppState, ServiceConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("api_rest=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServiceConfig::from_env()?;
    tracing::info!("-- Starting referral REST API on {}", config.rest_addr);

    let sink = Arc::new(config.sink());
    let state = AppState::new(sink, config.mailer, config.rules);
    api_rest::serve(&config.rest_addr, state).await
}
