//! Record body parsing
//!
//! A record body is a chat message: the first line carries a
//! backtick-wrapped cron expression, everything after the first newline is
//! the payload, verbatim. Parsing either fully succeeds or rejects the
//! record; there is no partial acceptance.

// `::cron` is the crates.io parser; plain `cron` would hit our wrapper module
use ::cron::Schedule;

use crate::core::error::RecordError;
use crate::features::reminders::cron;

/// Delimiter wrapping the cron expression on a record's first line.
pub const CRON_DELIMITER: char = '`';

/// A successfully parsed record body.
#[derive(Debug, Clone)]
pub struct ParsedRecord {
    /// The cron expression as written, delimiters stripped
    pub expression: String,
    /// Compiled schedule for the expression
    pub schedule: Schedule,
    /// Everything after the first line, newlines preserved
    pub payload: String,
}

/// Parse a raw record body into its cron expression and payload.
///
/// Stage one splits off the first line; stage two strips the delimiter
/// framing and validates the candidate expression. The payload is carried
/// through byte-for-byte.
pub fn parse_record(body: &str) -> Result<ParsedRecord, RecordError> {
    let (first_line, payload) = match body.split_once('\n') {
        Some((line, rest)) => (line, rest),
        None => (body, ""),
    };

    let candidate = first_line
        .strip_prefix(CRON_DELIMITER)
        .and_then(|s| s.strip_suffix(CRON_DELIMITER))
        .ok_or(RecordError::Format(CRON_DELIMITER))?;

    let schedule = cron::parse(candidate)?;

    Ok(ParsedRecord {
        expression: candidate.to_string(),
        schedule,
        payload: payload.to_string(),
    })
}
