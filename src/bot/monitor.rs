// src/bot/monitor.rs - Consumer loop evaluating chat messages against the rules

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use log::{error, info};

use crate::bot::queue::MessageReceiver;
use crate::bot::shutdown::ShutdownSignal;
use crate::platforms::{ApiError, ApiFactory};
use crate::rules::{ChatRule, RuleContext};
use crate::storage::Storage;
use crate::types::ChatMessage;

/// Pause after a credential failure before touching the next message.
const AUTH_BACKOFF: Duration = Duration::from_secs(5);

/// Drains the ingestion queue and runs every message through the chat rules.
///
/// The monitor is the outer retry boundary: per-rule errors are logged and
/// evaluation moves to the next rule; per-message errors are logged and the
/// loop moves to the next message. Only the shutdown signal ends the loop.
pub struct ChatMonitor {
    rules: Vec<Box<dyn ChatRule>>,
    store: Arc<dyn Storage>,
    api_factory: Arc<dyn ApiFactory>,
    shutdown: ShutdownSignal,
    poll_timeout: Duration,
}

impl ChatMonitor {
    pub fn new(
        rules: Vec<Box<dyn ChatRule>>,
        store: Arc<dyn Storage>,
        api_factory: Arc<dyn ApiFactory>,
        shutdown: ShutdownSignal,
        poll_timeout: Duration,
    ) -> Self {
        Self {
            rules,
            store,
            api_factory,
            shutdown,
            poll_timeout,
        }
    }

    pub async fn run(self, mut queue: MessageReceiver) {
        info!("chat monitor started with {} rules", self.rules.len());

        while !self.shutdown.is_triggered() {
            let Some(message) = queue.recv_timeout(self.poll_timeout).await else {
                continue;
            };

            if let Err(e) = self.process(&message).await {
                // Credential trouble is logged distinctly; the next message
                // gets a fresh handle and with it a refresh attempt.
                if let Some(ApiError::Auth(_)) = e.downcast_ref::<ApiError>() {
                    error!("{}: bad credentials: {}", message.channel, e);
                    // Hammering the refresh grant won't fix it; give it a moment.
                    tokio::select! {
                        _ = tokio::time::sleep(AUTH_BACKOFF) => {}
                        _ = self.shutdown.wait() => {}
                    }
                } else {
                    error!("{}: unhandled error outside of rule: {}", message.channel, e);
                }
            }
        }

        info!("chat monitor stopped");
    }

    async fn process(&self, message: &ChatMessage) -> Result<()> {
        // Sanity check.
        if message.channel.trim().is_empty() || message.text.trim().is_empty() {
            return Ok(());
        }

        // We need the owner's configuration to check which rules to run.
        let Some(owner) = self.store.channel_by_name(&message.channel).await? else {
            return Ok(());
        };
        if owner.is_banned || !owner.config.enabled {
            return Ok(());
        }

        let api = self.api_factory.bot_api().await?;
        let ctx = RuleContext {
            channel_id: &owner.twitch_id,
            api: api.as_ref(),
            store: self.store.as_ref(),
            shutdown: &self.shutdown,
        };

        for rule in &self.rules {
            if !rule.should_run(&owner.config) {
                continue;
            }

            match rule.handle(&ctx, message).await {
                Ok(true) => {}
                // This rule banned; later rules never see the message.
                Ok(false) => break,
                Err(e) => {
                    error!(
                        "{}: rule {} failed on {}({}): {}: {}",
                        message.channel, rule.name(), message.username, message.user_id,
                        message.text, e
                    );
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::chat_rules;
    use crate::testutil::{CountingRule, RuleFixture, SpyFactory};
    use crate::types::{ChannelUser, UserConfig};
    use std::sync::atomic::Ordering;

    fn owner(channel: &str, config: UserConfig) -> ChannelUser {
        ChannelUser {
            twitch_id: "chan-id".into(),
            username: channel.into(),
            is_banned: false,
            config,
            last_scanned: None,
        }
    }

    fn enabled() -> UserConfig {
        UserConfig {
            enabled: true,
            ban_known_bots: true,
        }
    }

    fn message(channel: &str, text: &str) -> ChatMessage {
        ChatMessage {
            is_first_message: true,
            text: text.into(),
            user_id: "123".into(),
            username: "spammer".into(),
            channel: channel.into(),
        }
    }

    fn monitor(fixture: &RuleFixture, rules: Vec<Box<dyn ChatRule>>) -> ChatMonitor {
        ChatMonitor::new(
            rules,
            fixture.store.clone(),
            Arc::new(SpyFactory::new(fixture.api.clone())),
            fixture.shutdown.clone(),
            Duration::from_millis(50),
        )
    }

    #[tokio::test]
    async fn handle_is_never_called_when_should_run_is_false() {
        let fixture = RuleFixture::new();
        fixture
            .store
            .insert_channel(owner(
                "somechannel",
                UserConfig {
                    enabled: true,
                    ban_known_bots: false,
                },
            ))
            .await;

        let rule = CountingRule::new(true);
        let calls = rule.calls.clone();
        let monitor = monitor(&fixture, vec![Box::new(rule)]);

        monitor.process(&message("somechannel", "anything at all")).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn enabled_rules_do_see_the_message() {
        let fixture = RuleFixture::new();
        fixture.store.insert_channel(owner("somechannel", enabled())).await;

        let rule = CountingRule::new(true);
        let calls = rule.calls.clone();
        let monitor = monitor(&fixture, vec![Box::new(rule)]);

        monitor.process(&message("somechannel", "hello there")).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn unknown_channels_are_discarded() {
        let fixture = RuleFixture::new();
        let rule = CountingRule::new(true);
        let calls = rule.calls.clone();
        let monitor = monitor(&fixture, vec![Box::new(rule)]);

        monitor.process(&message("nobody", "hello")).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn a_failing_rule_does_not_stop_its_siblings() {
        let fixture = RuleFixture::new();
        fixture.store.insert_channel(owner("somechannel", enabled())).await;

        let failing = CountingRule::failing();
        let after = CountingRule::new(true);
        let after_calls = after.calls.clone();
        let monitor = monitor(&fixture, vec![Box::new(failing), Box::new(after)]);

        monitor.process(&message("somechannel", "hello")).await.unwrap();
        assert_eq!(after_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn a_ban_short_circuits_later_rules() {
        let fixture = RuleFixture::new();
        fixture.store.insert_channel(owner("somechannel", enabled())).await;

        let banning = CountingRule::new(false);
        let after = CountingRule::new(true);
        let after_calls = after.calls.clone();
        let monitor = monitor(&fixture, vec![Box::new(banning), Box::new(after)]);

        monitor.process(&message("somechannel", "hello")).await.unwrap();
        assert_eq!(after_calls.load(Ordering::SeqCst), 0);
    }

    /// Full registry, end to end: the "cheap viewers" message produces exactly
    /// one ban with the right reason, and rules after the match never run.
    #[test_log::test(tokio::test)]
    async fn cheap_viewers_message_is_banned_exactly_once() {
        let fixture = RuleFixture::new();
        fixture.store.insert_channel(owner("somechannel", enabled())).await;

        let mut rules = chat_rules();
        let sentinel = CountingRule::new(true);
        let sentinel_calls = sentinel.calls.clone();
        rules.push(Box::new(sentinel));
        let monitor = monitor(&fixture, rules);

        monitor
            .process(&message("somechannel", "Cheap viewers on faketracker.ru"))
            .await
            .unwrap();

        let bans = fixture.api.ban_calls();
        assert_eq!(bans.len(), 1);
        assert!(bans[0].reason.contains("Best Cheap Viewers"));
        assert_eq!(bans[0].targets.len(), 1);
        assert_eq!(bans[0].targets[0].id, "123");
        assert_eq!(sentinel_calls.load(Ordering::SeqCst), 0);

        // The ban was persisted once as well.
        assert_eq!(fixture.store.ban_records().await.len(), 1);
    }

    #[tokio::test]
    async fn run_exits_on_shutdown() {
        let fixture = RuleFixture::new();
        let monitor = monitor(&fixture, Vec::new());
        let (_queue, receiver) = crate::bot::queue::message_queue();

        let handle = tokio::spawn(monitor.run(receiver));
        fixture.shutdown.trigger();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("monitor should stop after shutdown")
            .unwrap();
    }
}
