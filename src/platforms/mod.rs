// src/platforms/mod.rs - Platform API surface the rule pipeline calls into

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::types::{BanTarget, Chatter, ConfirmedBan, ModeratedChannel, TokenPair};

pub mod auth;
pub mod helix;

/// Errors from the platform API, split so callers can treat credential
/// problems differently from transient I/O (a credential problem is worth a
/// refresh attempt; a transient failure is just skipped).
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("authentication failed: {0}")]
    Auth(String),
    #[error(transparent)]
    Transient(#[from] anyhow::Error),
}

/// The platform API, authenticated as one account.
///
/// Implementations hold their own credentials; handles are constructed fresh
/// per use (see [`ApiFactory`]) so concurrent workers never share mutable
/// token state.
#[async_trait]
pub trait TwitchApi: Send + Sync {
    /// Ban the given users in a channel, acting as the bot account.
    /// Returns the bans the platform acknowledged.
    async fn ban_users(
        &self,
        channel_id: &str,
        users: &[BanTarget],
        reason: &str,
    ) -> Result<Vec<ConfirmedBan>, ApiError>;

    /// List the users currently connected to a channel's chat.
    async fn get_chatters(&self, channel_id: &str) -> Result<Vec<Chatter>, ApiError>;

    /// List the channels the authenticated account moderates.
    async fn get_moderated_channels(&self) -> Result<Vec<ModeratedChannel>, ApiError>;

    /// Exchange the refresh token for a new token pair. `None` means the
    /// grant was rejected and a re-authorization is needed.
    async fn refresh_token(&self) -> Result<Option<TokenPair>, ApiError>;

    /// Check whether the current access token is still accepted.
    async fn validate_token(&self) -> Result<bool, ApiError>;
}

/// Produces fresh, token-valid API handles authenticated as the bot account.
///
/// The factory is the seam between the pipeline and credential management:
/// the consumer resolves a handle per message, scan workers resolve one per
/// channel, and the factory refreshes the stored token on demand.
#[async_trait]
pub trait ApiFactory: Send + Sync {
    async fn bot_api(&self) -> anyhow::Result<Arc<dyn TwitchApi>>;
}
