// src/platforms/auth.rs - Bot-account credential management

use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use log::info;
use tokio::sync::Mutex;

use crate::platforms::helix::{HelixAuth, HelixClient};
use crate::platforms::{ApiError, ApiFactory, TwitchApi};
use crate::storage::Storage;
use crate::types::{BotAccount, TokenPair};

/// The token-refresh half of the platform API, separated out so the
/// single-flight logic can be exercised without a network.
#[async_trait]
pub trait TokenRefresher: Send + Sync {
    async fn refresh(&self, tokens: &TokenPair) -> Result<Option<TokenPair>, ApiError>;
}

#[async_trait]
impl TokenRefresher for HelixAuth {
    async fn refresh(&self, tokens: &TokenPair) -> Result<Option<TokenPair>, ApiError> {
        HelixAuth::refresh(self, tokens).await
    }
}

/// Hands out fresh API handles authenticated as the bot account, refreshing
/// the stored token on demand.
///
/// Refreshes are single-flight: concurrent callers that find a stale token
/// serialize on one mutex, and losers re-read the already-refreshed credential
/// instead of refreshing again.
pub struct TokenManager {
    http: reqwest::Client,
    store: Arc<dyn Storage>,
    refresher: Arc<dyn TokenRefresher>,
    client_id: String,
    client_secret: String,
    validity_window: chrono::Duration,
    refresh_lock: Mutex<()>,
}

impl TokenManager {
    pub fn new(
        store: Arc<dyn Storage>,
        client_id: String,
        client_secret: String,
        validity_window: chrono::Duration,
    ) -> Self {
        let http = reqwest::Client::new();
        let refresher = Arc::new(HelixAuth::new(
            http.clone(),
            client_id.clone(),
            client_secret.clone(),
        ));
        Self::with_refresher(store, refresher, client_id, client_secret, validity_window)
    }

    pub fn with_refresher(
        store: Arc<dyn Storage>,
        refresher: Arc<dyn TokenRefresher>,
        client_id: String,
        client_secret: String,
        validity_window: chrono::Duration,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            store,
            refresher,
            client_id,
            client_secret,
            validity_window,
            refresh_lock: Mutex::new(()),
        }
    }

    fn is_stale(&self, tokens: &TokenPair) -> bool {
        Utc::now() + self.validity_window > tokens.expires_at
    }

    async fn bot_account(&self) -> Result<BotAccount> {
        self.store
            .bot_account()
            .await?
            .context("bot account missing from storage")
    }

    /// Current token pair, refreshed if it expires within the validity window.
    pub async fn fresh_tokens(&self) -> Result<TokenPair> {
        let account = self.bot_account().await?;
        if !self.is_stale(&account.tokens) {
            return Ok(account.tokens);
        }

        let _guard = self.refresh_lock.lock().await;

        // Whoever held the lock before us may have refreshed already.
        let account = self.bot_account().await?;
        if !self.is_stale(&account.tokens) {
            return Ok(account.tokens);
        }

        let refreshed = self
            .refresher
            .refresh(&account.tokens)
            .await?
            .ok_or_else(|| ApiError::Auth("token refresh grant rejected".into()))?;
        self.store.update_bot_tokens(&refreshed).await?;
        info!(
            "refreshed bot token, now valid until {}",
            refreshed.expires_at
        );

        Ok(refreshed)
    }
}

#[async_trait]
impl ApiFactory for TokenManager {
    async fn bot_api(&self) -> Result<Arc<dyn TwitchApi>> {
        let account = self.bot_account().await?;
        let tokens = if self.is_stale(&account.tokens) {
            self.fresh_tokens().await?
        } else {
            account.tokens
        };

        let auth = HelixAuth::new(
            self.http.clone(),
            self.client_id.clone(),
            self.client_secret.clone(),
        );
        Ok(Arc::new(HelixClient::new(
            self.http.clone(),
            auth,
            account.twitch_id,
            tokens,
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::memory::MemoryStorage;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingRefresher {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl TokenRefresher for CountingRefresher {
        async fn refresh(&self, _tokens: &TokenPair) -> Result<Option<TokenPair>, ApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Some(TokenPair {
                access_token: "new-access".into(),
                refresh_token: "new-refresh".into(),
                expires_at: Utc::now() + chrono::Duration::hours(4),
            }))
        }
    }

    fn stale_account() -> BotAccount {
        BotAccount {
            twitch_id: "640082552".into(),
            username: "warden".into(),
            tokens: TokenPair {
                access_token: "old-access".into(),
                refresh_token: "old-refresh".into(),
                expires_at: Utc::now() + chrono::Duration::minutes(5),
            },
        }
    }

    fn manager(store: Arc<MemoryStorage>, refresher: Arc<CountingRefresher>) -> Arc<TokenManager> {
        Arc::new(TokenManager::with_refresher(
            store,
            refresher,
            "client-id".into(),
            "client-secret".into(),
            chrono::Duration::hours(1),
        ))
    }

    #[tokio::test]
    async fn refreshes_stale_token_and_persists_it() {
        let store = Arc::new(MemoryStorage::new());
        store.set_bot_account(stale_account()).await;
        let refresher = Arc::new(CountingRefresher {
            calls: AtomicUsize::new(0),
        });
        let manager = manager(store.clone(), refresher.clone());

        let tokens = manager.fresh_tokens().await.unwrap();
        assert_eq!(tokens.access_token, "new-access");
        assert_eq!(refresher.calls.load(Ordering::SeqCst), 1);

        let stored = store.bot_account().await.unwrap().unwrap();
        assert_eq!(stored.tokens.access_token, "new-access");
    }

    #[tokio::test]
    async fn concurrent_refreshes_collapse_into_one() {
        let store = Arc::new(MemoryStorage::new());
        store.set_bot_account(stale_account()).await;
        let refresher = Arc::new(CountingRefresher {
            calls: AtomicUsize::new(0),
        });
        let manager = manager(store.clone(), refresher.clone());

        let a = tokio::spawn({
            let manager = manager.clone();
            async move { manager.fresh_tokens().await.unwrap() }
        });
        let b = tokio::spawn({
            let manager = manager.clone();
            async move { manager.fresh_tokens().await.unwrap() }
        });

        let (a, b) = (a.await.unwrap(), b.await.unwrap());
        assert_eq!(a.access_token, "new-access");
        assert_eq!(b.access_token, "new-access");
        assert_eq!(refresher.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn valid_token_is_left_alone() {
        let mut account = stale_account();
        account.tokens.expires_at = Utc::now() + chrono::Duration::hours(8);
        let store = Arc::new(MemoryStorage::new());
        store.set_bot_account(account).await;
        let refresher = Arc::new(CountingRefresher {
            calls: AtomicUsize::new(0),
        });
        let manager = manager(store, refresher.clone());

        let tokens = manager.fresh_tokens().await.unwrap();
        assert_eq!(tokens.access_token, "old-access");
        assert_eq!(refresher.calls.load(Ordering::SeqCst), 0);
    }
}
