// src/bot/mod.rs - Service wiring for the moderation pipeline

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use log::info;

use crate::account::account_rules;
use crate::account::botlist::{run_refresh_task, BotListCache, BotListFetcher};
use crate::config::Settings;
use crate::platforms::ApiFactory;
use crate::rules::chat_rules;
use crate::storage::Storage;
use crate::types::{BanLogEntry, ChatLogEntry, ChatMessage};

pub mod audit;
pub mod monitor;
pub mod queue;
pub mod scanner;
pub mod shutdown;

use audit::AuditLog;
use monitor::ChatMonitor;
use queue::{message_queue, MessageQueue, MessageReceiver};
use scanner::Scanner;
use shutdown::ShutdownSignal;

/// Owns the moderation pipeline: the ingestion queue, the chat monitor
/// consumer, the account scanner, and the known-bot list refresher.
///
/// Platform chat clients stay outside this crate; they deliver events through
/// [`ingest`](Self::ingest) (or a cloned [`MessageQueue`]) and report
/// externally-issued bans through [`record_outside_ban`](Self::record_outside_ban).
pub struct BotService {
    settings: Settings,
    store: Arc<dyn Storage>,
    api_factory: Arc<dyn ApiFactory>,
    botlists: Arc<BotListCache>,
    audit: Arc<AuditLog>,
    queue: MessageQueue,
    receiver: Option<MessageReceiver>,
    shutdown: ShutdownSignal,
}

impl BotService {
    pub fn new(
        settings: Settings,
        store: Arc<dyn Storage>,
        api_factory: Arc<dyn ApiFactory>,
    ) -> Self {
        let (queue, receiver) = message_queue();
        Self {
            settings,
            store,
            api_factory,
            botlists: Arc::new(BotListCache::new()),
            audit: Arc::new(AuditLog::new()),
            queue,
            receiver: Some(receiver),
            shutdown: ShutdownSignal::new(),
        }
    }

    /// Producer handle for platform callbacks that only deliver messages.
    pub fn message_queue(&self) -> MessageQueue {
        self.queue.clone()
    }

    pub fn shutdown_signal(&self) -> ShutdownSignal {
        self.shutdown.clone()
    }

    /// Deliver one chat event: audit it, then hand it to the rule pipeline.
    pub async fn ingest(&self, message: ChatMessage) {
        self.audit
            .record_message(ChatLogEntry {
                channel: message.channel.clone(),
                user_id: message.user_id.clone(),
                username: message.username.clone(),
                text: message.text.clone(),
                timestamp: Utc::now(),
            })
            .await;
        self.queue.enqueue(message);
    }

    /// Record a ban observed in a monitored channel that the bot did not
    /// issue itself, for later cross-referencing with the chat log.
    pub async fn record_outside_ban(&self, entry: BanLogEntry) {
        self.audit.record_ban(entry).await;
    }

    /// Spawn the background loops. Call once; subsequent calls fail.
    pub fn start(&mut self) -> Result<()> {
        let receiver = self
            .receiver
            .take()
            .context("bot service already started")?;

        tokio::spawn(run_refresh_task(
            self.botlists.clone(),
            BotListFetcher::new(),
            self.settings.botlist_refresh_interval,
            self.shutdown.clone(),
        ));

        let monitor = ChatMonitor::new(
            chat_rules(),
            self.store.clone(),
            self.api_factory.clone(),
            self.shutdown.clone(),
            self.settings.queue_poll_timeout,
        );
        tokio::spawn(monitor.run(receiver));

        let scanner = Scanner::new(
            account_rules(self.botlists.clone()),
            self.store.clone(),
            self.api_factory.clone(),
            self.audit.clone(),
            self.shutdown.clone(),
            self.settings.scan_interval,
            self.settings.min_time_between_scans,
            self.settings.scan_workers,
        );
        tokio::spawn(scanner.run());

        info!("bot service started");
        Ok(())
    }

    /// Signal every loop to stop. In-flight work finishes cooperatively.
    pub fn stop(&self) {
        self.shutdown.trigger();
    }
}
