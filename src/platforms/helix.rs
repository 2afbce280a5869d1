// src/platforms/helix.rs - Thin reqwest client for the Helix REST API

use anyhow::{anyhow, Context};
use async_trait::async_trait;
use chrono::Utc;
use log::{debug, warn};
use serde::Deserialize;

use crate::platforms::{ApiError, TwitchApi};
use crate::types::{BanTarget, Chatter, ConfirmedBan, ModeratedChannel, TokenPair};

const HELIX_BASE: &str = "https://api.twitch.tv/helix";
const OAUTH_BASE: &str = "https://id.twitch.tv/oauth2";

/// OAuth application credentials plus the endpoints for token upkeep.
#[derive(Debug, Clone)]
pub struct HelixAuth {
    http: reqwest::Client,
    client_id: String,
    client_secret: String,
}

impl HelixAuth {
    pub fn new(http: reqwest::Client, client_id: String, client_secret: String) -> Self {
        Self {
            http,
            client_id,
            client_secret,
        }
    }

    /// Exchange a refresh token for a new token pair. Returns `None` when the
    /// grant was rejected (revoked or expired), which callers treat as a
    /// credential failure rather than a transient one.
    pub async fn refresh(&self, tokens: &TokenPair) -> Result<Option<TokenPair>, ApiError> {
        #[derive(Deserialize)]
        struct RefreshResponse {
            access_token: String,
            refresh_token: String,
            expires_in: i64,
        }

        let response = self
            .http
            .post(format!("{}/token", OAUTH_BASE))
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", tokens.refresh_token.as_str()),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
            ])
            .send()
            .await
            .context("token refresh request failed")?;

        if response.status() == reqwest::StatusCode::BAD_REQUEST
            || response.status() == reqwest::StatusCode::UNAUTHORIZED
        {
            warn!("token refresh rejected with {}", response.status());
            return Ok(None);
        }

        let body: RefreshResponse = response
            .error_for_status()
            .context("token refresh returned an error status")?
            .json()
            .await
            .context("token refresh response was not valid json")?;

        Ok(Some(TokenPair {
            access_token: body.access_token,
            refresh_token: body.refresh_token,
            expires_at: Utc::now() + chrono::Duration::seconds(body.expires_in),
        }))
    }

    /// Check the access token against the validation endpoint.
    pub async fn validate(&self, tokens: &TokenPair) -> Result<bool, ApiError> {
        let response = self
            .http
            .get(format!("{}/validate", OAUTH_BASE))
            .header("Authorization", format!("OAuth {}", tokens.access_token))
            .send()
            .await
            .context("token validation request failed")?;

        Ok(response.status().is_success())
    }
}

/// One authenticated handle to the Helix API. Constructed per use with the
/// bot's current credentials; holds no shared mutable state.
pub struct HelixClient {
    http: reqwest::Client,
    auth: HelixAuth,
    bot_id: String,
    tokens: TokenPair,
}

impl HelixClient {
    pub fn new(http: reqwest::Client, auth: HelixAuth, bot_id: String, tokens: TokenPair) -> Self {
        Self {
            http,
            auth,
            bot_id,
            tokens,
        }
    }

    fn request(&self, method: reqwest::Method, url: String) -> reqwest::RequestBuilder {
        self.http
            .request(method, url)
            .header("Client-Id", self.auth.client_id.clone())
            .bearer_auth(&self.tokens.access_token)
    }

    /// Map an HTTP status to our error taxonomy. 401 means the token went bad
    /// mid-flight; everything else non-2xx is transient.
    fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        if response.status() == reqwest::StatusCode::UNAUTHORIZED {
            return Err(ApiError::Auth(format!(
                "platform rejected credentials ({})",
                response.status()
            )));
        }

        response
            .error_for_status()
            .map_err(|e| ApiError::Transient(anyhow!(e)))
    }
}

#[derive(Deserialize)]
struct Page<T> {
    data: Vec<T>,
    #[serde(default)]
    pagination: Pagination,
}

#[derive(Deserialize, Default)]
struct Pagination {
    cursor: Option<String>,
}

#[derive(Deserialize)]
struct BannedUserRow {
    user_id: String,
}

#[derive(Deserialize)]
struct ChatterRow {
    user_id: String,
    user_login: String,
}

#[derive(Deserialize)]
struct ModeratedChannelRow {
    broadcaster_id: String,
    broadcaster_login: String,
}

#[async_trait]
impl TwitchApi for HelixClient {
    async fn ban_users(
        &self,
        channel_id: &str,
        users: &[BanTarget],
        reason: &str,
    ) -> Result<Vec<ConfirmedBan>, ApiError> {
        // The ban endpoint takes one user per request.
        let mut confirmed = Vec::with_capacity(users.len());
        for user in users {
            let body = serde_json::json!({
                "data": { "user_id": user.id, "reason": reason }
            });

            let response = self
                .request(
                    reqwest::Method::POST,
                    format!(
                        "{}/moderation/bans?broadcaster_id={}&moderator_id={}",
                        HELIX_BASE, channel_id, self.bot_id
                    ),
                )
                .json(&body)
                .send()
                .await
                .context("ban request failed")?;

            // Already banned comes back as a 400; treat it as settled rather
            // than failing the rest of the batch.
            if response.status() == reqwest::StatusCode::BAD_REQUEST {
                debug!("ban of {} in {} rejected as duplicate", user.id, channel_id);
                continue;
            }

            let page: Page<BannedUserRow> = Self::check_status(response)?
                .json()
                .await
                .context("ban response was not valid json")?;
            confirmed.extend(page.data.into_iter().map(|row| ConfirmedBan {
                user_id: row.user_id,
            }));
        }

        Ok(confirmed)
    }

    async fn get_chatters(&self, channel_id: &str) -> Result<Vec<Chatter>, ApiError> {
        let mut chatters = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let mut url = format!(
                "{}/chat/chatters?broadcaster_id={}&moderator_id={}&first=1000",
                HELIX_BASE, channel_id, self.bot_id
            );
            if let Some(ref c) = cursor {
                url.push_str(&format!("&after={}", c));
            }

            let response = self
                .request(reqwest::Method::GET, url)
                .send()
                .await
                .context("chatters request failed")?;
            let page: Page<ChatterRow> = Self::check_status(response)?
                .json()
                .await
                .context("chatters response was not valid json")?;

            chatters.extend(page.data.into_iter().map(|row| Chatter {
                user_id: row.user_id,
                user_login: row.user_login,
            }));

            match page.pagination.cursor {
                Some(c) if !c.is_empty() => cursor = Some(c),
                _ => break,
            }
        }

        Ok(chatters)
    }

    async fn get_moderated_channels(&self) -> Result<Vec<ModeratedChannel>, ApiError> {
        let mut channels = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let mut url = format!(
                "{}/moderation/channels?user_id={}&first=100",
                HELIX_BASE, self.bot_id
            );
            if let Some(ref c) = cursor {
                url.push_str(&format!("&after={}", c));
            }

            let response = self
                .request(reqwest::Method::GET, url)
                .send()
                .await
                .context("moderated channels request failed")?;
            let page: Page<ModeratedChannelRow> = Self::check_status(response)?
                .json()
                .await
                .context("moderated channels response was not valid json")?;

            channels.extend(page.data.into_iter().map(|row| ModeratedChannel {
                broadcaster_id: row.broadcaster_id,
                broadcaster_login: row.broadcaster_login,
            }));

            match page.pagination.cursor {
                Some(c) if !c.is_empty() => cursor = Some(c),
                _ => break,
            }
        }

        Ok(channels)
    }

    async fn refresh_token(&self) -> Result<Option<TokenPair>, ApiError> {
        self.auth.refresh(&self.tokens).await
    }

    async fn validate_token(&self) -> Result<bool, ApiError> {
        self.auth.validate(&self.tokens).await
    }
}
