//! # Error Types
//!
//! Error taxonomy for the reminder core. Record-level and fire-level errors
//! are always recovered locally; nothing here is allowed to take the process
//! down.
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0
//! - **Toggleable**: false

use thiserror::Error;

/// Why a record body was rejected. Rejection never propagates past the
/// per-record handler.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RecordError {
    /// First line is missing the delimiter framing (must start and end with
    /// the delimiter character and be at least two characters long).
    #[error("first line is not wrapped in {0} delimiters")]
    Format(char),

    /// Delimiters were present but the inner expression is not valid cron.
    #[error("invalid cron expression: {0}")]
    CronSyntax(String),
}

/// A notification sink failed to deliver a payload. Logged per fire; the
/// reminder stays registered and fires again at its next matching minute.
#[derive(Debug, Error)]
#[error("delivery failed: {message}")]
pub struct DeliveryError {
    message: String,
}

impl DeliveryError {
    pub fn new(message: impl Into<String>) -> Self {
        DeliveryError {
            message: message.into(),
        }
    }
}

/// The record source could not be reached. Fatal to the operation that
/// needed it (replay), not to the process.
#[derive(Debug, Error)]
#[error("record source unavailable: {message}")]
pub struct SourceError {
    message: String,
}

impl SourceError {
    pub fn new(message: impl Into<String>) -> Self {
        SourceError {
            message: message.into(),
        }
    }
}
