// src/rules/dogehype.rs

use anyhow::Result;
use async_trait::async_trait;

use crate::matching::strip_whitespace;
use crate::rules::{ban_and_log, ChatRule, RuleContext};
use crate::types::{BanTarget, ChatMessage, UserConfig};

/// Handles "dogehype" spam.
pub struct Dogehype;

#[async_trait]
impl ChatRule for Dogehype {
    fn name(&self) -> &'static str {
        "Dogehype"
    }

    fn should_run(&self, config: &UserConfig) -> bool {
        config.enabled && config.ban_known_bots
    }

    async fn handle(&self, ctx: &RuleContext<'_>, message: &ChatMessage) -> Result<bool> {
        // Spacing varies between sightings ("doge hype", "d ogehype"), so
        // strip it entirely before looking for the site name.
        if !strip_whitespace(&message.text).contains("dogehype") {
            return Ok(true);
        }

        ban_and_log(
            ctx,
            &[BanTarget {
                id: message.user_id.clone(),
                username: message.username.clone(),
            }],
            "[Bot] Spam (Dogehype)",
        )
        .await?;
        Ok(false)
    }
}
