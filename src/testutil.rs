// src/testutil.rs - Spy collaborators shared by the unit tests

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use crate::bot::shutdown::ShutdownSignal;
use crate::config::Settings;
use crate::platforms::{ApiError, ApiFactory, TwitchApi};
use crate::rules::{ChatRule, RuleContext};
use crate::storage::memory::MemoryStorage;
use crate::types::{
    BanTarget, ChatMessage, Chatter, ConfirmedBan, ModeratedChannel, TokenPair, UserConfig,
};

/// One recorded call to the ban endpoint.
#[derive(Debug, Clone)]
pub struct BanCall {
    pub channel_id: String,
    pub targets: Vec<BanTarget>,
    pub reason: String,
}

/// Platform API double that records every ban and serves canned lookups.
#[derive(Default)]
pub struct SpyApi {
    bans: Mutex<Vec<BanCall>>,
    chatters: Mutex<Vec<Chatter>>,
    moderated: Mutex<Vec<ModeratedChannel>>,
    rejected_ids: Mutex<Vec<String>>,
}

impl SpyApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ban_calls(&self) -> Vec<BanCall> {
        self.bans.lock().unwrap().clone()
    }

    pub fn set_chatters(&self, chatters: Vec<Chatter>) {
        *self.chatters.lock().unwrap() = chatters;
    }

    pub fn set_moderated_channels(&self, channels: Vec<ModeratedChannel>) {
        *self.moderated.lock().unwrap() = channels;
    }

    /// Make the platform silently drop bans of this user id, as it does for
    /// already-banned or deleted accounts.
    pub fn reject_bans_for(&self, user_id: &str) {
        self.rejected_ids.lock().unwrap().push(user_id.to_string());
    }
}

#[async_trait]
impl TwitchApi for SpyApi {
    async fn ban_users(
        &self,
        channel_id: &str,
        users: &[BanTarget],
        reason: &str,
    ) -> Result<Vec<ConfirmedBan>, ApiError> {
        self.bans.lock().unwrap().push(BanCall {
            channel_id: channel_id.to_string(),
            targets: users.to_vec(),
            reason: reason.to_string(),
        });

        let rejected = self.rejected_ids.lock().unwrap();
        Ok(users
            .iter()
            .filter(|u| !rejected.contains(&u.id))
            .map(|u| ConfirmedBan {
                user_id: u.id.clone(),
            })
            .collect())
    }

    async fn get_chatters(&self, _channel_id: &str) -> Result<Vec<Chatter>, ApiError> {
        Ok(self.chatters.lock().unwrap().clone())
    }

    async fn get_moderated_channels(&self) -> Result<Vec<ModeratedChannel>, ApiError> {
        Ok(self.moderated.lock().unwrap().clone())
    }

    async fn refresh_token(&self) -> Result<Option<TokenPair>, ApiError> {
        Ok(None)
    }

    async fn validate_token(&self) -> Result<bool, ApiError> {
        Ok(true)
    }
}

/// Factory handing out the one shared [`SpyApi`].
pub struct SpyFactory {
    api: Arc<SpyApi>,
}

impl SpyFactory {
    pub fn new(api: Arc<SpyApi>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl ApiFactory for SpyFactory {
    async fn bot_api(&self) -> Result<Arc<dyn TwitchApi>> {
        Ok(self.api.clone())
    }
}

/// Everything a rule-level test needs, wired to spies.
pub struct RuleFixture {
    pub api: Arc<SpyApi>,
    pub store: Arc<MemoryStorage>,
    pub shutdown: ShutdownSignal,
}

impl RuleFixture {
    pub fn new() -> Self {
        Self {
            api: Arc::new(SpyApi::new()),
            store: Arc::new(MemoryStorage::new()),
            shutdown: ShutdownSignal::new(),
        }
    }

    pub fn ctx<'a>(&'a self, channel_id: &'a str) -> RuleContext<'a> {
        RuleContext {
            channel_id,
            api: self.api.as_ref(),
            store: self.store.as_ref(),
            shutdown: &self.shutdown,
        }
    }

    pub fn message(is_first_message: bool, text: &str) -> ChatMessage {
        ChatMessage {
            is_first_message,
            text: text.to_string(),
            user_id: "123".to_string(),
            username: "spammer".to_string(),
            channel: "somechannel".to_string(),
        }
    }
}

impl Default for RuleFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// Chat rule that counts its `handle` invocations and returns a fixed verdict.
pub struct CountingRule {
    pub calls: Arc<AtomicUsize>,
    verdict: Option<bool>,
}

impl CountingRule {
    /// `verdict` is what `handle` returns: true = clean, false = banned.
    pub fn new(verdict: bool) -> Self {
        Self {
            calls: Arc::new(AtomicUsize::new(0)),
            verdict: Some(verdict),
        }
    }

    /// A rule whose `handle` always errors.
    pub fn failing() -> Self {
        Self {
            calls: Arc::new(AtomicUsize::new(0)),
            verdict: None,
        }
    }
}

#[async_trait]
impl ChatRule for CountingRule {
    fn name(&self) -> &'static str {
        "Counting Rule"
    }

    fn should_run(&self, config: &UserConfig) -> bool {
        config.enabled && config.ban_known_bots
    }

    async fn handle(&self, _ctx: &RuleContext<'_>, _message: &ChatMessage) -> Result<bool> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.verdict {
            Some(verdict) => Ok(verdict),
            None => Err(anyhow!("rule blew up")),
        }
    }
}

/// Settings with placeholder credentials and short intervals for tests.
pub fn test_settings() -> Settings {
    Settings {
        bot_username: "warden".into(),
        bot_id: "640082552".into(),
        client_id: "client-id".into(),
        client_secret: "client-secret".into(),
        access_token: "access".into(),
        refresh_token: "refresh".into(),
        queue_poll_timeout: Duration::from_millis(50),
        scan_interval: Duration::from_millis(50),
        min_time_between_scans: chrono::Duration::seconds(30),
        scan_workers: 2,
        botlist_refresh_interval: Duration::from_secs(600),
        token_validity_window: chrono::Duration::hours(1),
    }
}
