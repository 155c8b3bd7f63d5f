//! Error types for the relay pipeline.
//!
//! Every failure is terminal for the invocation that hit it: nothing here is
//! a retry signal back to the inbound-event source. Errors are logged at the
//! point they stop processing and never touch other items' state.

/// Top-level error type for the relay.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Lookup error: {0}")]
    Lookup(#[from] LookupError),

    #[error("State store error: {0}")]
    State(#[from] StateError),

    #[error("Delivery error: {0}")]
    Delivery(#[from] DeliveryError),

    #[error("Ingest error: {0}")]
    Ingest(#[from] IngestError),
}

/// Configuration-related errors.
///
/// Raised when the settings collaborator hands back something unusable.
/// Aborts processing of the current event only.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required setting: {key}. {hint}")]
    MissingRequired { key: String, hint: String },

    #[error("Invalid value for setting {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("Settings store unavailable: {0}")]
    Unavailable(String),
}

/// Moderator-list / flair-template / item-status lookup errors.
///
/// The filter treats these as "rule does not match" rather than fatal, so a
/// flaky lookup service cannot block relaying entirely.
#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    #[error("Lookup request failed: {0}")]
    RequestFailed(String),

    #[error("Unexpected response from lookup service: {0}")]
    InvalidResponse(String),
}

/// Item State Store errors. Per-id scope only.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("State read failed for item {id}: {reason}")]
    ReadFailed { id: String, reason: String },

    #[error("State write failed for item {id}: {reason}")]
    WriteFailed { id: String, reason: String },
}

/// Webhook delivery errors. One attempt per schedule firing, no retry loop.
#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error("Webhook request failed: {0}")]
    RequestFailed(String),

    #[error("Webhook returned {status}: {body}")]
    Rejected { status: u16, body: String },
}

/// Inbound-event surface errors.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("Malformed event payload: {0}")]
    MalformedEvent(String),

    #[error("Deferred job could not be registered: {0}")]
    ScheduleFailed(String),
}

/// Result type alias for the relay.
pub type Result<T> = std::result::Result<T, Error>;
