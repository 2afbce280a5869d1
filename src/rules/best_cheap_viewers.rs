// src/rules/best_cheap_viewers.rs

use anyhow::Result;
use async_trait::async_trait;

use crate::matching::fuzzy_starts_with;
use crate::rules::{ban_and_log, ChatRule, RuleContext};
use crate::types::{BanTarget, ChatMessage, UserConfig};

/// Phrasings the campaign opens with.
const OPENERS: &[&str] = &[
    "cheap viewers on",
    "best and cheap viewers on",
    "best viewers on",
];

/// Character discrepancies tolerated per opener, covering the combining-mark
/// and homoglyph obfuscation this campaign uses.
const TOLERANCE: usize = 3;

/// Handles "cheap viewers" spam.
pub struct BestCheapViewers;

#[async_trait]
impl ChatRule for BestCheapViewers {
    fn name(&self) -> &'static str {
        "Best Cheap Viewers"
    }

    fn should_run(&self, config: &UserConfig) -> bool {
        config.enabled && config.ban_known_bots
    }

    async fn handle(&self, ctx: &RuleContext<'_>, message: &ChatMessage) -> Result<bool> {
        if !OPENERS
            .iter()
            .any(|opener| fuzzy_starts_with(&message.text, opener, TOLERANCE))
        {
            return Ok(true);
        }

        ban_and_log(
            ctx,
            &[BanTarget {
                id: message.user_id.clone(),
                username: message.username.clone(),
            }],
            "[Bot] Spam (Best Cheap Viewers)",
        )
        .await?;
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::RuleFixture;

    // Strings typed in real chats, accent marks and all.
    const SIGHTINGS: &[&str] = &[
        "Best viewers on ***",
        "Best  viewers on ***",
        "Best vie\u{032E}wers on ***",
        "Best\u{0301} viewers on ***",
        "Be\u{0329}st Viewers on ***",
        "Be\u{033E}st Viewers on ***",
        "B\u{035F}est Viewers on ***",
        "B\u{031F}est viewers on ***",
        "Cheap viewers on ***",
        "Che\u{0322}ap vie\u{032E}wers on ***",
        "Ch\u{030D}eap Viewers on ***",
        "Ch\u{035F}eap viewers on ***",
        "C\u{0300}heap Viewers on ***",
        "Chea\u{0367}p v\u{032B}iewers on ***",
        "Chea\u{0367}p v\u{032B}iewers on *** ",
    ];

    #[tokio::test]
    async fn bans_known_sightings() {
        for sighting in SIGHTINGS {
            let fixture = RuleFixture::new();
            let ctx = fixture.ctx("123");
            let message = RuleFixture::message(true, sighting);

            let clean = BestCheapViewers.handle(&ctx, &message).await.unwrap();
            assert!(!clean, "missed sighting: {:?}", sighting);

            let bans = fixture.api.ban_calls();
            assert_eq!(bans.len(), 1);
            assert!(bans[0].reason.contains("Best Cheap Viewers"));
        }
    }

    #[tokio::test]
    async fn passes_messages_that_merely_mention_viewers() {
        let fixture = RuleFixture::new();
        let ctx = fixture.ctx("123");
        let message = RuleFixture::message(true, "wow so many viewers on stream today");

        assert!(BestCheapViewers.handle(&ctx, &message).await.unwrap());
        assert!(fixture.api.ban_calls().is_empty());
    }
}
