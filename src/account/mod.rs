// src/account/mod.rs - Account-level rules run by the periodic scanner

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use log::info;

use crate::rules::RuleContext;
use crate::types::{BanTarget, ChannelUser, ConfirmedBan};

pub mod ban_known_bots;
pub mod botlist;

use ban_known_bots::BanKnownBots;
use botlist::BotListCache;

/// A rule evaluated against a whole channel during a scan, as opposed to a
/// single chat message.
#[async_trait]
pub trait AccountRule: Send + Sync {
    /// Short human-readable name, used in logs.
    fn name(&self) -> &'static str;

    /// Whether the rule is enabled for this channel. Pure and side-effect-free.
    fn should_run(&self, user: &ChannelUser) -> bool;

    /// Run the rule against the channel. Errors are logged by the scanner and
    /// never abort sibling rules.
    async fn handle(&self, ctx: &RuleContext<'_>, user: &ChannelUser) -> Result<()>;
}

/// Ban users at most once ever per channel.
///
/// Users already recorded as banned in this channel are skipped entirely, so
/// repeat scans issue no redundant platform calls and write no duplicate
/// records. Only bans the platform acknowledges are persisted.
pub async fn ban_once(
    ctx: &RuleContext<'_>,
    candidates: &[BanTarget],
    reason: &str,
) -> Result<Vec<ConfirmedBan>> {
    let ids: Vec<String> = candidates.iter().map(|c| c.id.clone()).collect();
    let already_banned = ctx.store.banned_user_ids(ctx.channel_id, &ids).await?;

    let bans_to_try: Vec<BanTarget> = candidates
        .iter()
        .filter(|c| !already_banned.contains(&c.id))
        .cloned()
        .collect();
    if bans_to_try.is_empty() {
        return Ok(Vec::new());
    }

    let confirmed = ctx.api.ban_users(ctx.channel_id, &bans_to_try, reason).await?;

    let confirmed_targets: Vec<BanTarget> = bans_to_try
        .iter()
        .filter(|t| confirmed.iter().any(|c| c.user_id == t.id))
        .cloned()
        .collect();
    if !confirmed_targets.is_empty() {
        ctx.store
            .save_bans(ctx.channel_id, &confirmed_targets, reason)
            .await?;
        info!(
            "banned {} user(s) in channel {}: {}",
            confirmed_targets.len(),
            ctx.channel_id,
            reason
        );
    }

    Ok(confirmed)
}

/// The active account-rule set, registered once at startup.
pub fn account_rules(botlists: Arc<BotListCache>) -> Vec<Box<dyn AccountRule>> {
    vec![Box::new(BanKnownBots::new(botlists))]
}
