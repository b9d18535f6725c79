//! Mailer configuration, resolved once at startup.
//!
//! Environment reading stays in the binaries; this module only validates
//! and carries the resolved values, so request handling never consults
//! process-wide state.

use referral_types::{Destination, NonEmptyText};

use crate::{MailerError, MailerResult};

/// Sender and recipient configuration for outgoing referral emails.
#[derive(Clone, Debug)]
pub struct MailerConfig {
    sender: NonEmptyText,
    default_recipient: NonEmptyText,
    prague_recipient: Option<NonEmptyText>,
    brno_recipient: Option<NonEmptyText>,
}

impl MailerConfig {
    /// Create a config with a sender and a catch-all recipient.
    ///
    /// # Errors
    ///
    /// Returns [`MailerError::Config`] when either address is blank.
    pub fn new(sender: &str, default_recipient: &str) -> MailerResult<Self> {
        Ok(Self {
            sender: non_empty("sender address", sender)?,
            default_recipient: non_empty("default recipient", default_recipient)?,
            prague_recipient: None,
            brno_recipient: None,
        })
    }

    /// Override the recipient for one destination.
    ///
    /// # Errors
    ///
    /// Returns [`MailerError::Config`] when the address is blank.
    pub fn with_destination_recipient(
        mut self,
        destination: Destination,
        recipient: &str,
    ) -> MailerResult<Self> {
        let recipient = non_empty("destination recipient", recipient)?;
        match destination {
            Destination::Prague => self.prague_recipient = Some(recipient),
            Destination::Brno => self.brno_recipient = Some(recipient),
        }
        Ok(self)
    }

    pub fn sender(&self) -> &str {
        self.sender.as_str()
    }

    /// The receiving care-team address for a referral. Falls back to the
    /// default recipient when no destination-specific address is set (or
    /// when the record has no destination, which the submission gate
    /// prevents anyway).
    pub fn recipient_for(&self, destination: Option<Destination>) -> &str {
        let specific = match destination {
            Some(Destination::Prague) => self.prague_recipient.as_ref(),
            Some(Destination::Brno) => self.brno_recipient.as_ref(),
            None => None,
        };
        specific.unwrap_or(&self.default_recipient).as_str()
    }
}

fn non_empty(what: &str, value: &str) -> MailerResult<NonEmptyText> {
    NonEmptyText::new(value).map_err(|_| MailerError::Config(format!("{what} cannot be empty")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_blank_addresses() {
        assert!(matches!(
            MailerConfig::new("  ", "team@example.org"),
            Err(MailerError::Config(_))
        ));
        assert!(matches!(
            MailerConfig::new("Referral <noreply@example.org>", ""),
            Err(MailerError::Config(_))
        ));
    }

    #[test]
    fn recipient_falls_back_to_default() {
        let config = MailerConfig::new("noreply@example.org", "team@example.org").unwrap();
        assert_eq!(config.recipient_for(Some(Destination::Prague)), "team@example.org");
        assert_eq!(config.recipient_for(None), "team@example.org");
    }

    #[test]
    fn destination_override_wins() {
        let config = MailerConfig::new("noreply@example.org", "team@example.org")
            .unwrap()
            .with_destination_recipient(Destination::Brno, "brno@example.org")
            .unwrap();
        assert_eq!(config.recipient_for(Some(Destination::Brno)), "brno@example.org");
        assert_eq!(config.recipient_for(Some(Destination::Prague)), "team@example.org");
    }
}
