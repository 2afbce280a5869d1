// src/account/botlist.rs - Known-bot lists sourced from external feeds

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use log::{info, warn};
use serde::Deserialize;
use tokio::sync::RwLock;

use crate::bot::shutdown::ShutdownSignal;

const USERNAME_FEED_URL: &str = "https://api.twitchinsights.net/v1/bots/all";
const ID_FEED_URL: &str =
    "https://twitch-tools.rootonline.de/blocklist_manager.php?preset=known_bot_users";

/// Cache of known-bot usernames and user ids.
///
/// Each list is an immutable snapshot swapped in wholesale on refresh, so
/// concurrent readers never observe a partially-updated set. `None` until the
/// first successful fetch.
#[derive(Default)]
pub struct BotListCache {
    usernames: RwLock<Option<Arc<HashSet<String>>>>,
    ids: RwLock<Option<Arc<HashSet<String>>>>,
}

impl BotListCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current username snapshot, if one has ever been fetched.
    pub async fn usernames(&self) -> Option<Arc<HashSet<String>>> {
        self.usernames.read().await.clone()
    }

    /// Current user-id snapshot, if one has ever been fetched.
    pub async fn ids(&self) -> Option<Arc<HashSet<String>>> {
        self.ids.read().await.clone()
    }

    pub async fn replace_usernames(&self, set: HashSet<String>) {
        *self.usernames.write().await = Some(Arc::new(set));
    }

    pub async fn replace_ids(&self, set: HashSet<String>) {
        *self.ids.write().await = Some(Arc::new(set));
    }
}

/// The username feed wraps each entry in a tuple-like array:
/// position 0 is the username, the rest are counters we ignore.
#[derive(Deserialize)]
struct LiveBotsResponse {
    bots: Vec<Vec<serde_json::Value>>,
}

/// Fetches the two independent bot-list feeds.
pub struct BotListFetcher {
    http: reqwest::Client,
    username_feed_url: String,
    id_feed_url: String,
}

impl Default for BotListFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl BotListFetcher {
    pub fn new() -> Self {
        Self {
            http: reqwest::Client::new(),
            username_feed_url: USERNAME_FEED_URL.to_string(),
            id_feed_url: ID_FEED_URL.to_string(),
        }
    }

    /// Fetch the username list. `None` on any failure so the caller keeps the
    /// previous snapshot.
    pub async fn fetch_usernames(&self) -> Option<HashSet<String>> {
        match self.try_fetch_usernames().await {
            Ok(set) => Some(set),
            Err(e) => {
                warn!("known-bot username feed fetch failed: {}", e);
                None
            }
        }
    }

    /// Fetch the user-id list. `None` on any failure.
    pub async fn fetch_ids(&self) -> Option<HashSet<String>> {
        match self.try_fetch_ids().await {
            Ok(set) => Some(set),
            Err(e) => {
                warn!("known-bot id feed fetch failed: {}", e);
                None
            }
        }
    }

    async fn try_fetch_usernames(&self) -> Result<HashSet<String>> {
        let body: LiveBotsResponse = self
            .http
            .get(&self.username_feed_url)
            .send()
            .await
            .context("username feed request failed")?
            .error_for_status()
            .context("username feed returned an error status")?
            .json()
            .await
            .context("username feed payload was not valid json")?;

        Ok(body
            .bots
            .iter()
            .filter_map(|row| row.first())
            .filter_map(|value| value.as_str())
            .filter(|name| !name.trim().is_empty())
            .map(|name| name.to_lowercase())
            .collect())
    }

    async fn try_fetch_ids(&self) -> Result<HashSet<String>> {
        let body: Vec<String> = self
            .http
            .get(&self.id_feed_url)
            .send()
            .await
            .context("id feed request failed")?
            .error_for_status()
            .context("id feed returned an error status")?
            .json()
            .await
            .context("id feed payload was not valid json")?;

        Ok(body.into_iter().map(|id| id.to_lowercase()).collect())
    }
}

/// Background task keeping the cache fresh. Fetches both feeds concurrently
/// on a fixed interval until shutdown; a failed feed leaves its snapshot
/// untouched.
pub async fn run_refresh_task(
    cache: Arc<BotListCache>,
    fetcher: BotListFetcher,
    interval: Duration,
    shutdown: ShutdownSignal,
) {
    info!("known-bot list refresher started");
    loop {
        let (usernames, ids) = tokio::join!(fetcher.fetch_usernames(), fetcher.fetch_ids());

        if let Some(set) = usernames {
            info!("known-bot username list refreshed ({} entries)", set.len());
            cache.replace_usernames(set).await;
        }
        if let Some(set) = ids {
            info!("known-bot id list refreshed ({} entries)", set.len());
            cache.replace_ids(set).await;
        }

        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            _ = shutdown.wait() => break,
        }
    }
    info!("known-bot list refresher stopped");
}
