// src/rules/hosthub.rs

use anyhow::Result;
use async_trait::async_trait;

use crate::matching::strip_whitespace;
use crate::rules::{ban_and_log, ChatRule, RuleContext};
use crate::types::{BanTarget, ChatMessage, UserConfig};

/// Handles "hosthub.vip" spam. The campaign rotates domains, so only the site
/// name plus the dot is matched.
pub struct HostHub;

#[async_trait]
impl ChatRule for HostHub {
    fn name(&self) -> &'static str {
        "HostHub"
    }

    fn should_run(&self, config: &UserConfig) -> bool {
        config.enabled && config.ban_known_bots
    }

    async fn handle(&self, ctx: &RuleContext<'_>, message: &ChatMessage) -> Result<bool> {
        if !message.is_first_message || !strip_whitespace(&message.text).contains("hosthub.") {
            return Ok(true);
        }

        ban_and_log(
            ctx,
            &[BanTarget {
                id: message.user_id.clone(),
                username: message.username.clone(),
            }],
            "[Bot] Spam (HostHub)",
        )
        .await?;
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::RuleFixture;

    #[tokio::test]
    async fn bans_any_rotating_domain() {
        for text in ["check HostHub.vip", "host hub. org has cheap views"] {
            let fixture = RuleFixture::new();
            let ctx = fixture.ctx("123");
            let message = RuleFixture::message(true, text);

            assert!(!HostHub.handle(&ctx, &message).await.unwrap());
        }
    }

    #[tokio::test]
    async fn requires_the_dot() {
        let fixture = RuleFixture::new();
        let ctx = fixture.ctx("123");
        let message = RuleFixture::message(true, "who is the host hub tonight");

        assert!(HostHub.handle(&ctx, &message).await.unwrap());
        assert!(fixture.api.ban_calls().is_empty());
    }
}
