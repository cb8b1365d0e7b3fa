//! Discord-backed implementations of the reminder interfaces
//!
//! Thin glue over the serenity HTTP client. Record ids are Discord message
//! ids rendered as strings; acknowledgements are reactions on the
//! originating message.

use async_trait::async_trait;
use log::warn;
use serenity::http::Http;
use serenity::model::channel::ReactionType;
use serenity::model::id::ChannelId;
use std::sync::Arc;

use crate::core::error::{DeliveryError, SourceError};
use crate::features::reminders::registry::RecordId;
use crate::features::reminders::service::{Ack, AckSink, NotificationSink, RecordSource};

/// Delivers fired payloads into the reminder channel.
pub struct DiscordNotificationSink {
    http: Arc<Http>,
    channel: ChannelId,
}

impl DiscordNotificationSink {
    pub fn new(http: Arc<Http>, channel: ChannelId) -> Self {
        DiscordNotificationSink { http, channel }
    }
}

#[async_trait]
impl NotificationSink for DiscordNotificationSink {
    async fn deliver(&self, payload: &str) -> Result<(), DeliveryError> {
        self.channel
            .say(&self.http, payload)
            .await
            .map(|_| ())
            .map_err(|err| DeliveryError::new(err.to_string()))
    }
}

/// Reports record outcomes as reactions on the record message.
pub struct DiscordAckSink {
    http: Arc<Http>,
    channel: ChannelId,
}

impl DiscordAckSink {
    pub fn new(http: Arc<Http>, channel: ChannelId) -> Self {
        DiscordAckSink { http, channel }
    }

    fn message_id(id: &RecordId) -> Option<u64> {
        match id.as_str().parse::<u64>() {
            Ok(message_id) => Some(message_id),
            Err(_) => {
                warn!("Record id {id} is not a Discord message id");
                None
            }
        }
    }
}

#[async_trait]
impl AckSink for DiscordAckSink {
    async fn clear(&self, id: &RecordId) {
        let Some(message_id) = Self::message_id(id) else {
            return;
        };
        if let Err(err) = self
            .http
            .delete_message_reactions(self.channel.0, message_id)
            .await
        {
            warn!("Failed to clear reactions on message {id}: {err}");
        }
    }

    async fn report(&self, id: &RecordId, ack: Ack) {
        let emoji = match ack {
            Ack::Accepted => "✅",
            Ack::Rejected => "❌",
        };
        let Some(message_id) = Self::message_id(id) else {
            return;
        };
        if let Err(err) = self
            .http
            .create_reaction(
                self.channel.0,
                message_id,
                &ReactionType::Unicode(emoji.to_string()),
            )
            .await
        {
            warn!("Failed to react to message {id}: {err}");
        }
    }
}

/// Fetches the most recent page of records from the cron channel.
pub struct DiscordRecordSource {
    http: Arc<Http>,
    channel: ChannelId,
    limit: u64,
}

impl DiscordRecordSource {
    pub fn new(http: Arc<Http>, channel: ChannelId, limit: u64) -> Self {
        DiscordRecordSource {
            http,
            channel,
            limit,
        }
    }
}

#[async_trait]
impl RecordSource for DiscordRecordSource {
    async fn list_existing(&self) -> Result<Vec<(RecordId, String)>, SourceError> {
        // Discord caps a single fetch at 100; anything older is a known
        // limitation of the replay page
        let messages = self
            .channel
            .messages(&self.http, |retriever| retriever.limit(self.limit))
            .await
            .map_err(|err| SourceError::new(err.to_string()))?;

        Ok(messages
            .into_iter()
            .filter(|message| !message.author.bot)
            .map(|message| (RecordId::new(message.id.0.to_string()), message.content))
            .collect())
    }
}
