//! # Configuration
//!
//! Environment-based configuration, loaded once at startup.
//!
//! - **Version**: 1.1.0
//! - **Since**: 1.0.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 1.1.0: Add REPLAY_LIMIT override
//! - 1.0.0: Initial creation

use anyhow::{Context, Result};

/// Default number of existing messages fetched from the cron channel at
/// startup (Discord caps a single fetch at 100).
pub const DEFAULT_REPLAY_LIMIT: u64 = 100;

#[derive(Debug, Clone)]
pub struct Config {
    /// Discord bot token
    pub discord_token: String,
    /// Channel watched for reminder definition messages
    pub cron_channel_id: u64,
    /// Channel reminder payloads are delivered to
    pub reminder_channel_id: u64,
    /// How many existing messages to replay at startup
    pub replay_limit: u64,
    /// Log level filter (default: info)
    pub log_level: String,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Required: DISCORD_TOKEN, CRON_CHANNEL_ID, REMINDER_CHANNEL_ID.
    /// Optional: REPLAY_LIMIT, LOG_LEVEL.
    pub fn from_env() -> Result<Self> {
        let discord_token =
            std::env::var("DISCORD_TOKEN").context("DISCORD_TOKEN environment variable not set")?;

        let cron_channel_id = std::env::var("CRON_CHANNEL_ID")
            .context("CRON_CHANNEL_ID environment variable not set")?
            .parse::<u64>()
            .context("CRON_CHANNEL_ID is not a valid channel id")?;

        let reminder_channel_id = std::env::var("REMINDER_CHANNEL_ID")
            .context("REMINDER_CHANNEL_ID environment variable not set")?
            .parse::<u64>()
            .context("REMINDER_CHANNEL_ID is not a valid channel id")?;

        let replay_limit = match std::env::var("REPLAY_LIMIT") {
            Ok(raw) => raw.parse::<u64>().context("REPLAY_LIMIT is not a number")?,
            Err(_) => DEFAULT_REPLAY_LIMIT,
        };

        let log_level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Config {
            discord_token,
            cron_channel_id,
            reminder_channel_id,
            replay_limit,
            log_level,
        })
    }
}
