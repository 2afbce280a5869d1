// src/account/ban_known_bots.rs

use std::collections::HashSet;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

use crate::account::botlist::BotListCache;
use crate::account::{ban_once, AccountRule};
use crate::config::WHITELISTED_BOTS;
use crate::rules::RuleContext;
use crate::types::{BanTarget, ChannelUser, Chatter};

/// Searches for and bans known bots when they enter the chat.
pub struct BanKnownBots {
    lists: Arc<BotListCache>,
}

impl BanKnownBots {
    pub fn new(lists: Arc<BotListCache>) -> Self {
        Self { lists }
    }

    fn to_targets(chatters: &[Chatter]) -> Vec<BanTarget> {
        chatters
            .iter()
            .map(|c| BanTarget {
                id: c.user_id.clone(),
                username: c.user_login.clone(),
            })
            .collect()
    }
}

#[async_trait]
impl AccountRule for BanKnownBots {
    fn name(&self) -> &'static str {
        "Ban Known Bots"
    }

    fn should_run(&self, user: &ChannelUser) -> bool {
        user.config.enabled && user.config.ban_known_bots
    }

    async fn handle(&self, ctx: &RuleContext<'_>, user: &ChannelUser) -> Result<()> {
        let chatters = ctx.api.get_chatters(&user.twitch_id).await?;
        if chatters.is_empty() {
            return Ok(());
        }

        // Snapshots are cheap clones of the current immutable sets; the
        // comparison runs against them even if a refresh lands mid-scan.
        let known_usernames = self.lists.usernames().await;
        let known_ids = self.lists.ids().await;

        let mut flagged: Vec<Chatter> = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();

        if let Some(usernames) = known_usernames {
            for chatter in chatters
                .iter()
                .filter(|c| usernames.contains(&c.user_login.to_lowercase()))
            {
                if seen.insert(chatter.user_id.clone()) {
                    flagged.push(chatter.clone());
                }
            }
        }

        if let Some(ids) = known_ids {
            for chatter in chatters
                .iter()
                .filter(|c| ids.contains(&c.user_id.to_lowercase()))
            {
                if seen.insert(chatter.user_id.clone()) {
                    flagged.push(chatter.clone());
                }
            }
        }

        // Remove the whitelisted bots.
        flagged.retain(|c| !WHITELISTED_BOTS.contains(&c.user_login.to_lowercase().as_str()));
        if flagged.is_empty() {
            return Ok(());
        }

        ban_once(
            ctx,
            &Self::to_targets(&flagged),
            "[Bot] Username on Known Bot List",
        )
        .await?;
        Ok(())
    }
}
