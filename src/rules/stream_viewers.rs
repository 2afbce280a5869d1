// src/rules/stream_viewers.rs

use anyhow::Result;
use async_trait::async_trait;

use crate::rules::{ban_and_log, ChatRule, RuleContext};
use crate::types::{BanTarget, ChatMessage, UserConfig};

/// How many positions must match exactly before the message counts as the
/// known payload.
const MIN_THRESHOLD: usize = 70;

/// The payload with the @mention and all whitespace removed. Obfuscated
/// sightings differ from this only by homoglyph substitutions.
const EXPECTED_SPAM_MESSAGE: &str =
    "doyoualreadytriedstreamviewersorg?realviewers,fireworks!theyarenowgivingoutafreepackageforstreamersoo";

/// Handles "streamviewers org" spam.
///
/// The campaign opens with an @mention of the channel owner and pads the rest
/// with homoglyphs, so the rule anchors on exact length before comparing:
/// a message whose stripped remainder differs in length by even one character
/// is never a candidate, no matter how similar it looks.
pub struct StreamViewers;

#[async_trait]
impl ChatRule for StreamViewers {
    fn name(&self) -> &'static str {
        "StreamViewers"
    }

    fn should_run(&self, config: &UserConfig) -> bool {
        config.enabled && config.ban_known_bots
    }

    async fn handle(&self, ctx: &RuleContext<'_>, message: &ChatMessage) -> Result<bool> {
        if !message.is_first_message {
            return Ok(true);
        }

        let parts: Vec<String> = message
            .text
            .split_whitespace()
            .map(|s| s.to_lowercase())
            .collect();

        // It'll start with an @ to the channel owner; the mention is the only
        // part of the message that varies, so drop it.
        let Some(first) = parts.first() else {
            return Ok(true);
        };
        if !first.starts_with('@') {
            return Ok(true);
        }

        let no_spaces: Vec<char> = parts[1..].concat().chars().collect();
        let expected: Vec<char> = EXPECTED_SPAM_MESSAGE.chars().collect();
        if no_spaces.len() != expected.len() {
            return Ok(true);
        }

        let mut matches = 0usize;
        for (i, &c) in no_spaces.iter().enumerate() {
            // A non-ASCII character here means a look-alike swapped in for the
            // real letter. Skip it; it neither matches nor disqualifies.
            if !c.is_ascii() {
                continue;
            }

            // Any actual letter out of place means this is not our payload.
            if c != expected[i] {
                return Ok(true);
            }

            matches += 1;
        }

        if matches < MIN_THRESHOLD {
            return Ok(true);
        }

        ban_and_log(
            ctx,
            &[BanTarget {
                id: message.user_id.clone(),
                username: message.username.clone(),
            }],
            "[Bot] Spam (StreamViewers)",
        )
        .await?;
        Ok(false)
    }
}
