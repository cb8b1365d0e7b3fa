use anyhow::Result;
use dotenvy::dotenv;
use log::{error, info, warn};
use serenity::async_trait;
use serenity::model::channel::Message;
use serenity::model::event::MessageUpdateEvent;
use serenity::model::gateway::Ready;
use serenity::model::id::{ChannelId, GuildId, MessageId};
use serenity::prelude::*;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use chime::core::Config;
use chime::features::reminders::discord::{
    DiscordAckSink, DiscordNotificationSink, DiscordRecordSource,
};
use chime::features::reminders::{
    RecordEvent, RecordId, ReminderRegistry, ReminderService, Scheduler,
};

struct Handler {
    cron_channel: ChannelId,
    replay_limit: u64,
    service: Arc<OnceLock<Arc<ReminderService>>>,
    replayed: AtomicBool,
}

impl Handler {
    fn new(config: &Config, service: Arc<OnceLock<Arc<ReminderService>>>) -> Self {
        Handler {
            cron_channel: ChannelId(config.cron_channel_id),
            replay_limit: config.replay_limit,
            service,
            replayed: AtomicBool::new(false),
        }
    }

    fn service(&self) -> Option<Arc<ReminderService>> {
        let service = self.service.get();
        if service.is_none() {
            // Gateway events raced service wiring in main; drop the event
            warn!("Reminder service not wired up yet, ignoring event");
        }
        service.cloned()
    }
}

fn record_id(id: MessageId) -> RecordId {
    RecordId::new(id.0.to_string())
}

#[async_trait]
impl EventHandler for Handler {
    async fn ready(&self, ctx: Context, ready: Ready) {
        info!("Logged in as {}!", ready.user.name);

        let Some(service) = self.service() else {
            return;
        };

        // Reconnects reuse the live registry; only the first ready replays
        if self.replayed.swap(true, Ordering::SeqCst) {
            return;
        }

        let source =
            DiscordRecordSource::new(ctx.http.clone(), self.cron_channel, self.replay_limit);
        if let Err(err) = service.replay(&source).await {
            error!("Startup replay failed: {err}");
        }
    }

    async fn message(&self, _ctx: Context, msg: Message) {
        if msg.channel_id != self.cron_channel || msg.author.bot {
            return;
        }
        let Some(service) = self.service() else {
            return;
        };

        service
            .apply(RecordEvent::Created {
                id: record_id(msg.id),
                body: msg.content,
            })
            .await;
    }

    async fn message_update(
        &self,
        ctx: Context,
        _old_if_available: Option<Message>,
        new: Option<Message>,
        event: MessageUpdateEvent,
    ) {
        if event.channel_id != self.cron_channel {
            return;
        }
        let Some(service) = self.service() else {
            return;
        };

        // Update events can be partial; fall back to fetching the full body
        let message = match new {
            Some(message) => message,
            None => match ctx.http.get_message(event.channel_id.0, event.id.0).await {
                Ok(message) => message,
                Err(err) => {
                    warn!("Failed to fetch updated message {}: {err}", event.id);
                    return;
                }
            },
        };

        if message.author.bot {
            return;
        }

        service
            .apply(RecordEvent::Updated {
                id: record_id(message.id),
                body: message.content,
            })
            .await;
    }

    async fn message_delete(
        &self,
        _ctx: Context,
        channel_id: ChannelId,
        deleted_message_id: MessageId,
        _guild_id: Option<GuildId>,
    ) {
        if channel_id != self.cron_channel {
            return;
        }
        let Some(service) = self.service() else {
            return;
        };

        service
            .apply(RecordEvent::Deleted {
                id: record_id(deleted_message_id),
            })
            .await;
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv().ok();

    let config = Config::from_env()?;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&config.log_level))
        .init();

    info!("Starting chime reminder bot...");

    let service_cell: Arc<OnceLock<Arc<ReminderService>>> = Arc::new(OnceLock::new());
    let handler = Handler::new(&config, service_cell.clone());

    let intents =
        GatewayIntents::GUILDS | GatewayIntents::GUILD_MESSAGES | GatewayIntents::MESSAGE_CONTENT;

    let mut client = Client::builder(&config.discord_token, intents)
        .event_handler(handler)
        .await
        .map_err(|e| {
            error!("Failed to create Discord client: {e}");
            anyhow::anyhow!("Client creation failed: {}", e)
        })?;

    // Wire the reminder core to Discord now that the HTTP client exists
    let http = client.cache_and_http.http.clone();
    let sink = Arc::new(DiscordNotificationSink::new(
        http.clone(),
        ChannelId(config.reminder_channel_id),
    ));
    let acks = Arc::new(DiscordAckSink::new(
        http.clone(),
        ChannelId(config.cron_channel_id),
    ));
    let registry = ReminderRegistry::new(Scheduler::new(), sink);
    let service = Arc::new(ReminderService::new(registry, acks));
    let _ = service_cell.set(service.clone());

    // Stop all timers and close the gateway on ctrl-c
    let shard_manager = client.shard_manager.clone();
    let shutdown_service = service.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Shutting down, stopping all reminder timers...");
            shutdown_service.registry().clear();
            shard_manager.lock().await.shutdown_all().await;
        }
    });

    info!("Bot configured successfully. Connecting to Discord gateway...");

    if let Err(why) = client.start().await {
        error!("Gateway connection failed: {why:?}");
        return Err(anyhow::anyhow!(
            "Failed to establish gateway connection: {}",
            why
        ));
    }

    Ok(())
}
