// src/rules/naked.rs

use anyhow::Result;
use async_trait::async_trait;

use crate::matching::collapse_whitespace;
use crate::rules::{ban_and_log, ChatRule, RuleContext};
use crate::types::{BanTarget, ChatMessage, UserConfig};

const OPENER: &str = "want to see her naked?";

/// Handles the "want to see her naked" porn bots.
pub struct Naked;

#[async_trait]
impl ChatRule for Naked {
    fn name(&self) -> &'static str {
        "Naked"
    }

    fn should_run(&self, config: &UserConfig) -> bool {
        config.enabled && config.ban_known_bots
    }

    async fn handle(&self, ctx: &RuleContext<'_>, message: &ChatMessage) -> Result<bool> {
        if !message.is_first_message || !collapse_whitespace(&message.text).starts_with(OPENER) {
            return Ok(true);
        }

        ban_and_log(
            ctx,
            &[BanTarget {
                id: message.user_id.clone(),
                username: message.username.clone(),
            }],
            "[Bot] Spam (Naked)",
        )
        .await?;
        Ok(false)
    }
}
