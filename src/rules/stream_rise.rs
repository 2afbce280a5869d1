// src/rules/stream_rise.rs

use anyhow::Result;
use async_trait::async_trait;

use crate::rules::{ban_and_log, ChatRule, RuleContext};
use crate::types::{BanTarget, ChatMessage, UserConfig};

/// The pitch, verbatim. The campaign pastes it unchanged, so the rule demands
/// full-message equality and stays safe without a first-message gate.
const PITCH: &str = "Hello, sorry for bothering you. I want to offer promotion of your channel, \
viewers, followers, views, chat bots, etc...The price is lower than any competitor, \
the quality is guaranteed to be the best.   Flexible and convenient order management \
panel, chat panel, everything is in your hands, a huge number of custom settings. Go \
to streamrise";

/// Handles "streamrise" spam.
pub struct StreamRise;

#[async_trait]
impl ChatRule for StreamRise {
    fn name(&self) -> &'static str {
        "StreamRise"
    }

    fn should_run(&self, config: &UserConfig) -> bool {
        config.enabled && config.ban_known_bots
    }

    async fn handle(&self, ctx: &RuleContext<'_>, message: &ChatMessage) -> Result<bool> {
        if !message.text.eq_ignore_ascii_case(PITCH) {
            return Ok(true);
        }

        ban_and_log(
            ctx,
            &[BanTarget {
                id: message.user_id.clone(),
                username: message.username.clone(),
            }],
            "[Bot] Spam (StreamRise)",
        )
        .await?;
        Ok(false)
    }
}
