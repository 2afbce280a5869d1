// src/types/mod.rs - Core data model shared by every part of the bot

use chrono::{DateTime, Utc};

/// One inbound chat message. Created per event, evaluated once by the rule
/// pipeline, then discarded.
#[derive(Debug, Clone)]
pub struct ChatMessage {
    /// True if this is the first time the sender has ever written in this channel.
    pub is_first_message: bool,
    pub text: String,
    pub user_id: String,
    pub username: String,
    pub channel: String,
}

/// Per-channel-owner settings gating whether any rule may run. Owned by the
/// persistence layer; read-only to the rule pipeline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UserConfig {
    pub enabled: bool,
    pub ban_known_bots: bool,
}

/// A channel owner as storage returns it.
#[derive(Debug, Clone)]
pub struct ChannelUser {
    pub twitch_id: String,
    pub username: String,
    pub is_banned: bool,
    pub config: UserConfig,
    pub last_scanned: Option<DateTime<Utc>>,
}

/// OAuth token state for an account.
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
}

/// The bot's own platform account.
#[derive(Debug, Clone)]
pub struct BotAccount {
    pub twitch_id: String,
    pub username: String,
    pub tokens: TokenPair,
}

/// A user submitted to the platform ban endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BanTarget {
    pub id: String,
    pub username: String,
}

/// A ban the platform acknowledged.
#[derive(Debug, Clone)]
pub struct ConfirmedBan {
    pub user_id: String,
}

/// One user currently present in a channel's chat.
#[derive(Debug, Clone)]
pub struct Chatter {
    pub user_id: String,
    pub user_login: String,
}

/// A channel the bot account moderates.
#[derive(Debug, Clone)]
pub struct ModeratedChannel {
    pub broadcaster_id: String,
    pub broadcaster_login: String,
}

/// Write-once record of a ban the bot issued. Append-only; the ban-once path
/// deduplicates on (channel, user).
#[derive(Debug, Clone)]
pub struct BanRecord {
    pub channel_id: String,
    pub banned_user_id: String,
    pub reason: String,
    pub timestamp: DateTime<Utc>,
}

/// Audit row for a chat message observed in a monitored channel.
#[derive(Debug, Clone)]
pub struct ChatLogEntry {
    pub channel: String,
    pub user_id: String,
    pub username: String,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

/// Audit row for a ban observed in a monitored channel, including bans issued
/// by other moderators.
#[derive(Debug, Clone)]
pub struct BanLogEntry {
    pub channel: String,
    pub user_id: String,
    pub username: String,
    pub reason: String,
    pub timestamp: DateTime<Utc>,
}
