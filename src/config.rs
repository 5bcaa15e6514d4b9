//! Responder configuration.

use std::time::Duration;

use crate::error::ConfigError;

/// Conversation count at which a correspondent counts as first contact.
///
/// The upstream thread search reports the just-fetched conversation too,
/// so a first-time sender shows exactly one thread. A count of zero is
/// treated as ineligible; the threshold is configurable for services
/// that report zero before the current thread is indexed.
pub const FIRST_CONTACT_THREAD_COUNT: u64 = 1;

/// Default polling period between cycles.
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 50;

/// Responder configuration, built from environment variables.
#[derive(Debug, Clone)]
pub struct ResponderConfig {
    /// How far back the unread fetch looks.
    pub lookback: Duration,
    /// Sender identity on outbound replies.
    pub from_address: String,
    /// Subject of the canned reply.
    pub subject_template: String,
    /// Plaintext body of the canned reply.
    pub body_template: String,
    /// Label id applied to processed messages (the "Vacation Mailer" label).
    pub processed_label: String,
    /// Period between cycles.
    pub poll_interval: Duration,
    /// Thread count a correspondent must report to be eligible.
    pub first_contact_threshold: u64,
}

impl Default for ResponderConfig {
    fn default() -> Self {
        Self {
            lookback: Duration::from_secs(24 * 3600),
            from_address: String::new(),
            subject_template: "On Leave".to_string(),
            body_template: "Hi There,\nI am currently on Leave Today.\nWill get Back to you Soon !!!".to_string(),
            processed_label: "Label_1".to_string(),
            poll_interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            first_contact_threshold: FIRST_CONTACT_THREAD_COUNT,
        }
    }
}

impl ResponderConfig {
    /// Build config from environment variables.
    ///
    /// `VACATION_FROM_ADDRESS` is required; everything else falls back
    /// to the defaults above.
    pub fn from_env() -> Result<Self, ConfigError> {
        let from_address = std::env::var("VACATION_FROM_ADDRESS")
            .map_err(|_| ConfigError::MissingEnvVar("VACATION_FROM_ADDRESS".into()))?;

        let mut config = Self {
            from_address,
            ..Self::default()
        };

        if let Ok(raw) = std::env::var("VACATION_LOOKBACK_HOURS") {
            let hours: u64 = raw.parse().map_err(|_| ConfigError::InvalidValue {
                key: "VACATION_LOOKBACK_HOURS".into(),
                message: format!("not a number: {raw}"),
            })?;
            config.lookback = Duration::from_secs(hours * 3600);
        }
        if let Ok(raw) = std::env::var("VACATION_POLL_INTERVAL_SECS") {
            let secs: u64 = raw.parse().map_err(|_| ConfigError::InvalidValue {
                key: "VACATION_POLL_INTERVAL_SECS".into(),
                message: format!("not a number: {raw}"),
            })?;
            config.poll_interval = Duration::from_secs(secs);
        }
        if let Ok(raw) = std::env::var("VACATION_FIRST_CONTACT_THRESHOLD") {
            config.first_contact_threshold =
                raw.parse().map_err(|_| ConfigError::InvalidValue {
                    key: "VACATION_FIRST_CONTACT_THRESHOLD".into(),
                    message: format!("not a number: {raw}"),
                })?;
        }
        if let Ok(subject) = std::env::var("VACATION_SUBJECT") {
            config.subject_template = subject;
        }
        if let Ok(body) = std::env::var("VACATION_BODY") {
            config.body_template = body;
        }
        if let Ok(label) = std::env::var("VACATION_PROCESSED_LABEL") {
            config.processed_label = label;
        }

        Ok(config)
    }
}
