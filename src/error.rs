//! Error types for vacation-mailer.

/// Top-level error type for the responder.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    #[error("Mail service error: {0}")]
    Mail(#[from] MailError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Credential and session errors.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Failed to read token file {path}: {reason}")]
    TokenFile { path: String, reason: String },

    #[error("Failed to parse token file: {0}")]
    TokenParse(#[from] serde_json::Error),

    #[error("Token refresh failed: {reason}")]
    RefreshFailed { reason: String },
}

/// Transport errors from the mail service.
///
/// Any of these aborts the current cycle at the Fetch/Resolve/Filter
/// stages; at the Act stage they are isolated per correspondent.
#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Mail API returned {status}: {body}")]
    Api { status: u16, body: String },
}

/// Result type alias for the responder.
pub type Result<T> = std::result::Result<T, Error>;
