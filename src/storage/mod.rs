// src/storage/mod.rs - Persistence interface the pipeline writes through

use std::collections::HashSet;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::types::{BanLogEntry, BanTarget, BotAccount, ChannelUser, ChatLogEntry, TokenPair};

pub mod memory;

/// Everything the pipeline needs from the persistence layer. The real schema
/// lives behind this trait; the core only reads configs and appends outcomes.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Look up a channel owner by channel name (case-insensitive).
    async fn channel_by_name(&self, channel: &str) -> Result<Option<ChannelUser>>;

    /// All owners with the bot enabled and not banned, ordered least recently
    /// scanned first so scan cycles stay fair.
    async fn users_with_bot_enabled(&self) -> Result<Vec<ChannelUser>>;

    /// The bot's own account row, including token state.
    async fn bot_account(&self) -> Result<Option<BotAccount>>;

    /// Persist a refreshed token pair for the bot account.
    async fn update_bot_tokens(&self, tokens: &TokenPair) -> Result<()>;

    /// Append ban records for users banned in a channel.
    async fn save_bans(&self, channel_id: &str, users: &[BanTarget], reason: &str) -> Result<()>;

    /// Of `candidates`, the user ids already recorded as banned in `channel_id`.
    async fn banned_user_ids(
        &self,
        channel_id: &str,
        candidates: &[String],
    ) -> Result<HashSet<String>>;

    /// Record that a channel scan ran to completion.
    async fn record_scan(&self, twitch_id: &str, at: DateTime<Utc>) -> Result<()>;

    /// Append a batch of observed chat messages to the audit log.
    async fn append_chat_logs(&self, entries: Vec<ChatLogEntry>) -> Result<()>;

    /// Append a batch of observed bans to the audit log.
    async fn append_ban_logs(&self, entries: Vec<BanLogEntry>) -> Result<()>;
}
