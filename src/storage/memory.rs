// src/storage/memory.rs - In-memory storage backend

use std::collections::{HashMap, HashSet};

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::storage::Storage;
use crate::types::{
    BanLogEntry, BanRecord, BanTarget, BotAccount, ChannelUser, ChatLogEntry, TokenPair,
};

/// Storage backend holding everything in process memory. Used by the binary
/// until a database backend is wired in, and by tests as a fake with real
/// semantics.
#[derive(Default)]
pub struct MemoryStorage {
    /// Keyed by lowercased channel name.
    channels: RwLock<HashMap<String, ChannelUser>>,
    bot: RwLock<Option<BotAccount>>,
    bans: RwLock<Vec<BanRecord>>,
    chat_logs: RwLock<Vec<ChatLogEntry>>,
    ban_logs: RwLock<Vec<BanLogEntry>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_channel(&self, user: ChannelUser) {
        self.channels
            .write()
            .await
            .insert(user.username.to_lowercase(), user);
    }

    pub async fn set_bot_account(&self, account: BotAccount) {
        *self.bot.write().await = Some(account);
    }

    pub async fn ban_records(&self) -> Vec<BanRecord> {
        self.bans.read().await.clone()
    }

    pub async fn chat_log_len(&self) -> usize {
        self.chat_logs.read().await.len()
    }

    pub async fn ban_log_len(&self) -> usize {
        self.ban_logs.read().await.len()
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn channel_by_name(&self, channel: &str) -> Result<Option<ChannelUser>> {
        Ok(self
            .channels
            .read()
            .await
            .get(&channel.to_lowercase())
            .cloned())
    }

    async fn users_with_bot_enabled(&self) -> Result<Vec<ChannelUser>> {
        let mut users: Vec<ChannelUser> = self
            .channels
            .read()
            .await
            .values()
            .filter(|u| !u.is_banned && u.config.enabled)
            .cloned()
            .collect();

        // Never-scanned channels sort first; None < Some for Option ordering.
        users.sort_by_key(|u| u.last_scanned);
        Ok(users)
    }

    async fn bot_account(&self) -> Result<Option<BotAccount>> {
        Ok(self.bot.read().await.clone())
    }

    async fn update_bot_tokens(&self, tokens: &TokenPair) -> Result<()> {
        if let Some(account) = self.bot.write().await.as_mut() {
            account.tokens = tokens.clone();
        }
        Ok(())
    }

    async fn save_bans(&self, channel_id: &str, users: &[BanTarget], reason: &str) -> Result<()> {
        let now = Utc::now();
        let mut bans = self.bans.write().await;
        bans.extend(users.iter().map(|user| BanRecord {
            channel_id: channel_id.to_string(),
            banned_user_id: user.id.clone(),
            reason: reason.to_string(),
            timestamp: now,
        }));
        Ok(())
    }

    async fn banned_user_ids(
        &self,
        channel_id: &str,
        candidates: &[String],
    ) -> Result<HashSet<String>> {
        let bans = self.bans.read().await;
        Ok(bans
            .iter()
            .filter(|ban| ban.channel_id == channel_id)
            .filter(|ban| candidates.contains(&ban.banned_user_id))
            .map(|ban| ban.banned_user_id.clone())
            .collect())
    }

    async fn record_scan(&self, twitch_id: &str, at: DateTime<Utc>) -> Result<()> {
        let mut channels = self.channels.write().await;
        if let Some(user) = channels.values_mut().find(|u| u.twitch_id == twitch_id) {
            user.last_scanned = Some(at);
        }
        Ok(())
    }

    async fn append_chat_logs(&self, entries: Vec<ChatLogEntry>) -> Result<()> {
        self.chat_logs.write().await.extend(entries);
        Ok(())
    }

    async fn append_ban_logs(&self, entries: Vec<BanLogEntry>) -> Result<()> {
        self.ban_logs.write().await.extend(entries);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::UserConfig;

    fn channel(name: &str, id: &str, last_scanned: Option<DateTime<Utc>>) -> ChannelUser {
        ChannelUser {
            twitch_id: id.to_string(),
            username: name.to_string(),
            is_banned: false,
            config: UserConfig {
                enabled: true,
                ban_known_bots: true,
            },
            last_scanned,
        }
    }

    #[tokio::test]
    async fn channel_lookup_is_case_insensitive() {
        let store = MemoryStorage::new();
        store.insert_channel(channel("StreamerOne", "1", None)).await;

        let found = store.channel_by_name("streamerone").await.unwrap();
        assert_eq!(found.unwrap().twitch_id, "1");
    }

    #[tokio::test]
    async fn enabled_users_come_back_least_recently_scanned_first() {
        let store = MemoryStorage::new();
        let now = Utc::now();
        store
            .insert_channel(channel("fresh", "1", Some(now)))
            .await;
        store
            .insert_channel(channel("stale", "2", Some(now - chrono::Duration::hours(2))))
            .await;
        store.insert_channel(channel("never", "3", None)).await;

        let users = store.users_with_bot_enabled().await.unwrap();
        let ids: Vec<&str> = users.iter().map(|u| u.twitch_id.as_str()).collect();
        assert_eq!(ids, vec!["3", "2", "1"]);
    }

    #[tokio::test]
    async fn banned_and_disabled_owners_are_filtered_out() {
        let store = MemoryStorage::new();
        let mut banned = channel("banned", "1", None);
        banned.is_banned = true;
        let mut disabled = channel("disabled", "2", None);
        disabled.config.enabled = false;
        store.insert_channel(banned).await;
        store.insert_channel(disabled).await;
        store.insert_channel(channel("active", "3", None)).await;

        let users = store.users_with_bot_enabled().await.unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].twitch_id, "3");
    }

    #[tokio::test]
    async fn saved_bans_show_up_in_dedup_lookup() {
        let store = MemoryStorage::new();
        let target = BanTarget {
            id: "55".into(),
            username: "spambot".into(),
        };
        store.save_bans("chan", &[target], "[Bot] Spam").await.unwrap();

        let already = store
            .banned_user_ids("chan", &["55".into(), "77".into()])
            .await
            .unwrap();
        assert!(already.contains("55"));
        assert!(!already.contains("77"));

        // Other channels are unaffected.
        let other = store.banned_user_ids("other", &["55".into()]).await.unwrap();
        assert!(other.is_empty());
    }

    #[tokio::test]
    async fn record_scan_updates_the_owner_row() {
        let store = MemoryStorage::new();
        store.insert_channel(channel("streamer", "9", None)).await;
        let at = Utc::now();
        store.record_scan("9", at).await.unwrap();

        let user = store.channel_by_name("streamer").await.unwrap().unwrap();
        assert_eq!(user.last_scanned, Some(at));
    }
}
