//! Environment-driven service configuration.
//!
//! Everything is resolved once at startup; handlers never read the
//! environment. Per-destination recipient overrides let a deployment route
//! Prague and Brno referrals to different inboxes while keeping a single
//! default.

use anyhow::Context;

use mailer::{MailerConfig, ResendClient};
use referral_core::ValidationRules;
use referral_types::Destination;

/// Default sender identity when `REFERRAL_FROM` is unset.
pub const DEFAULT_FROM: &str = "Sarcoma Referral <onboarding@resend.dev>";

/// Fully resolved configuration for the REST service.
pub struct ServiceConfig {
    /// Bind address for the HTTP server.
    pub rest_addr: String,
    /// API key for the delivery provider.
    pub resend_api_key: String,
    /// Delivery API base URL override, for local stubs.
    pub resend_base_url: Option<String>,
    pub mailer: MailerConfig,
    pub rules: ValidationRules,
}

impl ServiceConfig {
    /// Resolve the configuration from the environment.
    ///
    /// # Environment Variables
    /// - `REFERRAL_REST_ADDR`: bind address (default `0.0.0.0:3000`)
    /// - `RESEND_API_KEY`: delivery API key (required)
    /// - `RESEND_BASE_URL`: delivery API base URL (default: public Resend)
    /// - `REFERRAL_FROM`: sender identity (default [`DEFAULT_FROM`])
    /// - `REFERRAL_RECIPIENT`: default recipient inbox (required)
    /// - `REFERRAL_RECIPIENT_PRAGUE` / `REFERRAL_RECIPIENT_BRNO`:
    ///   per-destination overrides
    /// - `REFERRAL_REQUIRE_IMAGING_DATES`: set to `true`/`1` for the strict
    ///   imaging-date rule
    ///
    /// # Errors
    /// Returns an error when a required variable is missing or a recipient
    /// value is blank.
    pub fn from_env() -> anyhow::Result<Self> {
        let rest_addr =
            std::env::var("REFERRAL_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());

        let resend_api_key =
            std::env::var("RESEND_API_KEY").context("RESEND_API_KEY must be set")?;
        let resend_base_url = std::env::var("RESEND_BASE_URL").ok();

        let sender = std::env::var("REFERRAL_FROM").unwrap_or_else(|_| DEFAULT_FROM.into());
        let recipient =
            std::env::var("REFERRAL_RECIPIENT").context("REFERRAL_RECIPIENT must be set")?;

        let mut mailer = MailerConfig::new(&sender, &recipient)
            .context("invalid REFERRAL_FROM / REFERRAL_RECIPIENT")?;
        for (variable, destination) in [
            ("REFERRAL_RECIPIENT_PRAGUE", Destination::Prague),
            ("REFERRAL_RECIPIENT_BRNO", Destination::Brno),
        ] {
            if let Ok(value) = std::env::var(variable) {
                mailer = mailer
                    .with_destination_recipient(destination, &value)
                    .with_context(|| format!("{variable} must not be blank"))?;
            }
        }

        let require_imaging_dates = std::env::var("REFERRAL_REQUIRE_IMAGING_DATES")
            .map(|v| matches!(v.as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        Ok(Self {
            rest_addr,
            resend_api_key,
            resend_base_url,
            mailer,
            rules: ValidationRules {
                require_imaging_dates,
            },
        })
    }

    /// Build the delivery client this configuration describes.
    pub fn sink(&self) -> ResendClient {
        match &self.resend_base_url {
            Some(base_url) => ResendClient::with_base_url(base_url, &self.resend_api_key),
            None => ResendClient::new(&self.resend_api_key),
        }
    }
}
