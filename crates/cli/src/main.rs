//! Command-line companion to the referral service.
//!
//! Works on referral record JSON files: check them against the submission
//! gate, render the email document, emit the FHIR bundle, or send the
//! referral through the delivery provider without running the server.

use std::path::PathBuf;

use anyhow::Context;
use chrono::Utc;
use clap::{Parser, Subcommand};

use fhir::ReferralBundle;
use mailer::{build_message, MailerConfig, NotificationSink, ResendClient};
use referral_core::{validate_record, ReferralRecord, ValidationRules};
use referral_types::Destination;

#[derive(Parser)]
#[command(name = "referral")]
#[command(about = "Sarcoma referral service CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check a record against the submission gate
    Validate {
        /// Path to a referral record JSON file
        file: PathBuf,
        /// Require a date for every selected imaging examination
        #[arg(long)]
        require_imaging_dates: bool,
    },
    /// Render the referral email document as HTML
    Render {
        /// Path to a referral record JSON file
        file: PathBuf,
    },
    /// Emit the FHIR bundle for a record
    Fhir {
        /// Path to a referral record JSON file
        file: PathBuf,
    },
    /// Send the referral email (reads delivery settings from the environment)
    Send {
        /// Path to a referral record JSON file
        file: PathBuf,
    },
}

fn load_record(file: &PathBuf) -> anyhow::Result<ReferralRecord> {
    let content = std::fs::read_to_string(file)
        .with_context(|| format!("cannot read {}", file.display()))?;
    let record: ReferralRecord =
        serde_json::from_str(&content).with_context(|| format!("cannot parse {}", file.display()))?;
    record.verify_attachments()?;
    Ok(record)
}

/// Delivery settings from `RESEND_API_KEY`, `REFERRAL_FROM`,
/// `REFERRAL_RECIPIENT` and the optional per-destination overrides.
fn mailer_from_env() -> anyhow::Result<(MailerConfig, ResendClient)> {
    let api_key = std::env::var("RESEND_API_KEY").context("RESEND_API_KEY must be set")?;
    let sender = std::env::var("REFERRAL_FROM")
        .unwrap_or_else(|_| "Sarcoma Referral <onboarding@resend.dev>".into());
    let recipient =
        std::env::var("REFERRAL_RECIPIENT").context("REFERRAL_RECIPIENT must be set")?;

    let mut config = MailerConfig::new(&sender, &recipient)
        .context("invalid REFERRAL_FROM / REFERRAL_RECIPIENT")?;
    for (variable, destination) in [
        ("REFERRAL_RECIPIENT_PRAGUE", Destination::Prague),
        ("REFERRAL_RECIPIENT_BRNO", Destination::Brno),
    ] {
        if let Ok(value) = std::env::var(variable) {
            config = config
                .with_destination_recipient(destination, &value)
                .with_context(|| format!("{variable} must not be blank"))?;
        }
    }

    let client = match std::env::var("RESEND_BASE_URL") {
        Ok(base_url) => ResendClient::with_base_url(base_url, api_key),
        Err(_) => ResendClient::new(api_key),
    };
    Ok((config, client))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Validate {
            file,
            require_imaging_dates,
        } => {
            let record = load_record(&file)?;
            let rules = ValidationRules {
                require_imaging_dates,
            };
            let errors = validate_record(&record, rules);
            if errors.is_empty() {
                println!("Record is complete and submittable.");
            } else {
                for (field, message) in &errors {
                    eprintln!("{field}: {message}");
                }
                anyhow::bail!("{} field(s) failed validation", errors.len());
            }
        }
        Commands::Render { file } => {
            let record = load_record(&file)?;
            println!("{}", mailer::template::render_html(&record));
        }
        Commands::Fhir { file } => {
            let record = load_record(&file)?;
            let bundle = ReferralBundle::build(&record, Utc::now());
            println!("{}", bundle.to_json()?);
        }
        Commands::Send { file } => {
            let record = load_record(&file)?;
            let errors = validate_record(&record, ValidationRules::default());
            if !errors.is_empty() {
                anyhow::bail!("record is incomplete; run `referral validate` for details");
            }
            let (config, client) = mailer_from_env()?;
            let message = build_message(&record, &config, Utc::now());
            let receipt = client.deliver(&message).await?;
            println!("Delivered, receipt id: {}", receipt.id);
        }
    }

    Ok(())
}
