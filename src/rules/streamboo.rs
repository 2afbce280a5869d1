// src/rules/streamboo.rs

use anyhow::Result;
use async_trait::async_trait;

use crate::matching::strip_whitespace;
use crate::rules::{ban_and_log, ChatRule, RuleContext};
use crate::types::{BanTarget, ChatMessage, UserConfig};

/// Handles "Streamboo" spam.
pub struct Streamboo;

#[async_trait]
impl ChatRule for Streamboo {
    fn name(&self) -> &'static str {
        "Streamboo"
    }

    fn should_run(&self, config: &UserConfig) -> bool {
        config.enabled && config.ban_known_bots
    }

    async fn handle(&self, ctx: &RuleContext<'_>, message: &ChatMessage) -> Result<bool> {
        if !message.is_first_message || !strip_whitespace(&message.text).contains("streamboo") {
            return Ok(true);
        }

        ban_and_log(
            ctx,
            &[BanTarget {
                id: message.user_id.clone(),
                username: message.username.clone(),
            }],
            "[Bot] Spam (Streamboo)",
        )
        .await?;
        Ok(false)
    }
}
