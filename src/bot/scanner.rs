// src/bot/scanner.rs - Periodic sweep applying account rules to every channel

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chrono::Utc;
use futures_util::stream::{self, StreamExt};
use log::{error, info, warn};

use crate::account::AccountRule;
use crate::bot::audit::AuditLog;
use crate::bot::shutdown::ShutdownSignal;
use crate::platforms::ApiFactory;
use crate::rules::RuleContext;
use crate::storage::Storage;
use crate::types::ChannelUser;

/// Sweeps all channels with the bot enabled on a fixed interval, running the
/// account rules against each with a bounded number of parallel workers.
pub struct Scanner {
    rules: Vec<Box<dyn AccountRule>>,
    store: Arc<dyn Storage>,
    api_factory: Arc<dyn ApiFactory>,
    audit: Arc<AuditLog>,
    shutdown: ShutdownSignal,
    scan_interval: Duration,
    min_time_between_scans: chrono::Duration,
    workers: usize,
}

impl Scanner {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        rules: Vec<Box<dyn AccountRule>>,
        store: Arc<dyn Storage>,
        api_factory: Arc<dyn ApiFactory>,
        audit: Arc<AuditLog>,
        shutdown: ShutdownSignal,
        scan_interval: Duration,
        min_time_between_scans: chrono::Duration,
        workers: usize,
    ) -> Self {
        Self {
            rules,
            store,
            api_factory,
            audit,
            shutdown,
            scan_interval,
            min_time_between_scans,
            workers,
        }
    }

    pub async fn run(self) {
        info!("account scanner started ({} workers)", self.workers);

        while !self.shutdown.is_triggered() {
            if let Err(e) = self.cycle().await {
                error!("scan cycle failed: {}", e);
            }

            tokio::select! {
                _ = tokio::time::sleep(self.scan_interval) => {}
                _ = self.shutdown.wait() => break,
            }
        }

        info!("account scanner stopped");
    }

    /// One sweep: flush the audit buffers, figure out which channels are
    /// eligible, then scan them with bounded parallelism. Storage returns the
    /// users least-recently-scanned first, so a slow fleet still gets visited
    /// fairly.
    async fn cycle(&self) -> Result<()> {
        if let Err(e) = self.audit.flush(self.store.as_ref()).await {
            warn!("audit flush failed: {}", e);
        }

        let users = self.store.users_with_bot_enabled().await?;
        if users.is_empty() {
            return Ok(());
        }

        // Trim to channels the bot actually moderates; banning anywhere else
        // would only produce API errors.
        let api = self.api_factory.bot_api().await?;
        let moderated: HashSet<String> = api
            .get_moderated_channels()
            .await?
            .into_iter()
            .map(|channel| channel.broadcaster_id)
            .collect();
        let eligible = users
            .into_iter()
            .filter(|user| moderated.contains(&user.twitch_id));

        stream::iter(eligible)
            .for_each_concurrent(self.workers, |user| async move {
                if self.shutdown.is_triggered() {
                    return;
                }
                if let Err(e) = self.scan_user(&user).await {
                    error!("scan failed for {}: {}", user.username, e);
                }
            })
            .await;

        Ok(())
    }

    async fn scan_user(&self, user: &ChannelUser) -> Result<()> {
        // Determine if it's too early for a scan.
        if let Some(last) = user.last_scanned {
            if Utc::now() < last + self.min_time_between_scans {
                return Ok(());
            }
        }

        // Each worker resolves its own API handle so nothing is shared
        // across concurrent scans.
        let api = self.api_factory.bot_api().await?;
        let ctx = RuleContext {
            channel_id: &user.twitch_id,
            api: api.as_ref(),
            store: self.store.as_ref(),
            shutdown: &self.shutdown,
        };

        for rule in &self.rules {
            if !rule.should_run(user) {
                continue;
            }
            if let Err(e) = rule.handle(&ctx, user).await {
                error!("{}: rule {} failed: {}", user.username, rule.name(), e);
            }
        }

        // Log that we performed a scan to completion.
        self.store.record_scan(&user.twitch_id, Utc::now()).await?;
        Ok(())
    }
}
