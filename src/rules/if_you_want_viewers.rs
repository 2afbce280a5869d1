// src/rules/if_you_want_viewers.rs

use anyhow::Result;
use async_trait::async_trait;

use crate::matching::fuzzy_contains;
use crate::rules::{ban_and_log, ChatRule, RuleContext};
use crate::types::{BanTarget, ChatMessage, UserConfig};

/// The strings we expect to receive if this is a bot.
const EXPECTED: &[&str] = &["if you want more viewers for your stream, go to"];

const TOLERANCE: usize = 3;

/// "if you want viewers, go to [link]" scam.
pub struct IfYouWantViewers;

#[async_trait]
impl ChatRule for IfYouWantViewers {
    fn name(&self) -> &'static str {
        "If You Want Viewers"
    }

    fn should_run(&self, config: &UserConfig) -> bool {
        config.enabled && config.ban_known_bots
    }

    async fn handle(&self, ctx: &RuleContext<'_>, message: &ChatMessage) -> Result<bool> {
        if !message.is_first_message {
            return Ok(true);
        }

        if !EXPECTED
            .iter()
            .any(|expected| fuzzy_contains(&message.text, expected, TOLERANCE))
        {
            return Ok(true);
        }

        ban_and_log(
            ctx,
            &[BanTarget {
                id: message.user_id.clone(),
                username: message.username.clone(),
            }],
            "[Bot] Spam (If You Want Viewers)",
        )
        .await?;
        Ok(false)
    }
}
