// src/rules/mod.rs - Chat rules: one detection heuristic per spam campaign

use anyhow::Result;
use async_trait::async_trait;
use log::info;

use crate::bot::shutdown::ShutdownSignal;
use crate::platforms::TwitchApi;
use crate::storage::Storage;
use crate::types::{BanTarget, ChatMessage, UserConfig};

pub mod best_cheap_viewers;
pub mod discord;
pub mod dogehype;
pub mod hosthub;
pub mod if_you_want_viewers;
pub mod naked;
pub mod nezhna;
pub mod stream_rise;
pub mod stream_viewers;
pub mod streamboo;

/// Everything a rule needs to act on a violation. Built per message by the
/// consumer; all collaborators are injected explicitly.
pub struct RuleContext<'a> {
    /// Platform id of the channel the message was posted in.
    pub channel_id: &'a str,
    pub api: &'a dyn TwitchApi,
    pub store: &'a dyn Storage,
    pub shutdown: &'a ShutdownSignal,
}

/// A rule for determining if a chat message comes from a spam bot.
///
/// Implementations are stateless (or hold only static pattern constants), so
/// one instance is safely shared across messages and tasks.
#[async_trait]
pub trait ChatRule: Send + Sync {
    /// Short human-readable name, used in logs.
    fn name(&self) -> &'static str;

    /// Whether the rule is enabled for this channel's configuration. Pure and
    /// side-effect-free; `handle` must only be called when this returns true.
    fn should_run(&self, config: &UserConfig) -> bool;

    /// Evaluate one message. `Ok(true)` means the message is clean and later
    /// rules should see it; `Ok(false)` means this rule identified spam and
    /// already banned and logged, so the caller stops evaluating.
    async fn handle(&self, ctx: &RuleContext<'_>, message: &ChatMessage) -> Result<bool>;
}

/// Ban users and persist the outcome, exactly once per detected violation.
pub async fn ban_and_log(ctx: &RuleContext<'_>, users: &[BanTarget], reason: &str) -> Result<()> {
    ctx.api.ban_users(ctx.channel_id, users, reason).await?;
    ctx.store.save_bans(ctx.channel_id, users, reason).await?;
    for user in users {
        info!(
            "banned {}({}) in channel {}: {}",
            user.username, user.id, ctx.channel_id, reason
        );
    }
    Ok(())
}

/// The active rule set. Registration is static and happens once at startup;
/// the consumer evaluates rules in this order and stops at the first ban.
pub fn chat_rules() -> Vec<Box<dyn ChatRule>> {
    vec![
        Box::new(best_cheap_viewers::BestCheapViewers),
        Box::new(dogehype::Dogehype),
        Box::new(streamboo::Streamboo),
        Box::new(hosthub::HostHub),
        Box::new(stream_rise::StreamRise),
        Box::new(nezhna::Nezhna),
        Box::new(naked::Naked),
        Box::new(if_you_want_viewers::IfYouWantViewers),
        Box::new(discord::Discord),
        Box::new(stream_viewers::StreamViewers),
    ]
}
