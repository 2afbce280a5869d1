// src/rules/discord.rs

use anyhow::Result;
use async_trait::async_trait;

use crate::matching::collapse_whitespace;
use crate::rules::{ban_and_log, ChatRule, RuleContext};
use crate::types::{BanTarget, ChatMessage, UserConfig};

/// Solicitation phrasings the scammers pair with the platform name. Merely
/// mentioning discord is not enough to ban on.
const KNOWN_PHRASES: &[&str] = &[
    "add me on discord",
    "my username is",
    "my discord username is",
];

/// Handles the "add me on discord" bots.
pub struct Discord;

#[async_trait]
impl ChatRule for Discord {
    fn name(&self) -> &'static str {
        "Discord Scammers"
    }

    fn should_run(&self, config: &UserConfig) -> bool {
        config.enabled && config.ban_known_bots
    }

    async fn handle(&self, ctx: &RuleContext<'_>, message: &ChatMessage) -> Result<bool> {
        if !message.is_first_message {
            return Ok(true);
        }

        let normalized = collapse_whitespace(&message.text);
        if !normalized.contains("discord") {
            return Ok(true);
        }

        if !KNOWN_PHRASES
            .iter()
            .any(|phrase| normalized.contains(phrase))
        {
            return Ok(true);
        }

        ban_and_log(
            ctx,
            &[BanTarget {
                id: message.user_id.clone(),
                username: message.username.clone(),
            }],
            "[Bot] Spam (Discord Scammers)",
        )
        .await?;
        Ok(false)
    }
}
