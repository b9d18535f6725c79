//! Main entry point for the referral service.
//!
//! Loads `.env`, initialises tracing, resolves the service configuration
//! from the environment and runs the REST API server.
//!
//! # Environment Variables
//! - `REFERRAL_REST_ADDR`: REST server address (default: "0.0.0.0:3000")
//! - `RESEND_API_KEY`: delivery API key (required)
//! - `RESEND_BASE_URL`: delivery API base URL override
//! - `REFERRAL_FROM`: sender identity
//! - `REFERRAL_RECIPIENT`: default recipient inbox (required)
//! - `REFERRAL_RECIPIENT_PRAGUE` / `REFERRAL_RECIPIENT_BRNO`: per-destination
//!   recipient overrides
//! - `REFERRAL_REQUIRE_IMAGING_DATES`: strict imaging-date validation

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_rest::{AppState, ServiceConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("referral=info".parse()?)
                .add_directive("api_rest=info".parse()?)
                .add_directive("mailer=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServiceConfig::from_env()?;
    tracing::info!("-- Starting referral service on {}", config.rest_addr);

    let sink = Arc::new(config.sink());
    let state = AppState::new(sink, config.mailer, config.rules);
    api_rest::serve(&config.rest_addr, state).await
}
