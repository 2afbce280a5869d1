// src/bot/audit.rs - Buffered audit log of observed chat and ban activity

use anyhow::Result;
use tokio::sync::Mutex;

use crate::storage::Storage;
use crate::types::{BanLogEntry, ChatLogEntry};

/// Collects chat messages and bans observed in monitored channels until the
/// next periodic flush. Kept so moderator bans issued outside the bot can be
/// cross-referenced with what was said.
///
/// Appends and drains run under the buffer mutex, so a flush never observes a
/// partially-appended batch.
#[derive(Default)]
pub struct AuditLog {
    messages: Mutex<Vec<ChatLogEntry>>,
    bans: Mutex<Vec<BanLogEntry>>,
}

impl AuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn record_message(&self, entry: ChatLogEntry) {
        self.messages.lock().await.push(entry);
    }

    pub async fn record_ban(&self, entry: BanLogEntry) {
        self.bans.lock().await.push(entry);
    }

    /// Drain both buffers into storage. Entries are taken wholesale; new
    /// records arriving during the write land in the next flush.
    pub async fn flush(&self, store: &dyn Storage) -> Result<()> {
        let messages = std::mem::take(&mut *self.messages.lock().await);
        if !messages.is_empty() {
            store.append_chat_logs(messages).await?;
        }

        let bans = std::mem::take(&mut *self.bans.lock().await);
        if !bans.is_empty() {
            store.append_ban_logs(bans).await?;
        }

        Ok(())
    }
}
