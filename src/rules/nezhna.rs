// src/rules/nezhna.rs

use anyhow::Result;
use async_trait::async_trait;

use crate::matching::collapse_whitespace;
use crate::rules::{ban_and_log, ChatRule, RuleContext};
use crate::types::{BanTarget, ChatMessage, UserConfig};

// The doubled "com" is how the campaign actually types it.
const PITCH: &str = "visit nezhna dot com com to boost your viewers and climb the twitch \
rankings. join thousands of successful streamers now!";

/// Handles the "nezhna dot com" bots.
pub struct Nezhna;

#[async_trait]
impl ChatRule for Nezhna {
    fn name(&self) -> &'static str {
        "Nezhna"
    }

    fn should_run(&self, config: &UserConfig) -> bool {
        config.enabled && config.ban_known_bots
    }

    async fn handle(&self, ctx: &RuleContext<'_>, message: &ChatMessage) -> Result<bool> {
        if !message.is_first_message {
            return Ok(true);
        }

        if !collapse_whitespace(&message.text).starts_with(PITCH) {
            return Ok(true);
        }

        ban_and_log(
            ctx,
            &[BanTarget {
                id: message.user_id.clone(),
                username: message.username.clone(),
            }],
            "[Bot] Spam (Nezhna)",
        )
        .await?;
        Ok(false)
    }
}
