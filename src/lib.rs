//! # chatwarden
//!
//! A chat moderation bot core that watches live chat for spam bots and bans
//! them through the platform API.
//!
//! ## Features
//!
//! - **Rule pipeline**: one small rule per known spam campaign, evaluated in
//!   order with short-circuit on the first ban
//! - **Fuzzy matching**: tolerates the combining-mark and homoglyph
//!   obfuscation spam bots use to slip past exact-string filters
//! - **Decoupled ingestion**: platform callbacks enqueue without blocking; a
//!   single consumer loop does the slow work
//! - **Account scans**: periodic sweeps cross-reference chatters against
//!   externally-sourced known-bot lists, banning each bot at most once ever
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use chatwarden::prelude::*;
//! use chatwarden::platforms::auth::TokenManager;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::from_env()?;
//!     let store: Arc<MemoryStorage> = Arc::new(MemoryStorage::new());
//!
//!     let factory = Arc::new(TokenManager::new(
//!         store.clone(),
//!         settings.client_id.clone(),
//!         settings.client_secret.clone(),
//!         settings.token_validity_window,
//!     ));
//!
//!     let mut service = BotService::new(settings, store, factory);
//!     service.start()?;
//!
//!     // The platform chat client delivers events through the queue:
//!     let queue = service.message_queue();
//!     queue.enqueue(ChatMessage {
//!         is_first_message: true,
//!         text: "Cheap viewers on spam.example".into(),
//!         user_id: "123".into(),
//!         username: "spammer".into(),
//!         channel: "somechannel".into(),
//!     });
//!
//!     tokio::signal::ctrl_c().await?;
//!     service.stop();
//!     Ok(())
//! }
//! ```

pub mod account;
pub mod bot;
pub mod config;
pub mod matching;
pub mod platforms;
pub mod rules;
pub mod storage;
pub mod types;

#[cfg(test)]
pub(crate) mod testutil;

// Re-export commonly used items
pub mod prelude {
    pub use crate::bot::shutdown::ShutdownSignal;
    pub use crate::bot::BotService;
    pub use crate::config::Settings;
    pub use crate::platforms::{ApiFactory, TwitchApi};
    pub use crate::rules::{chat_rules, ChatRule};
    pub use crate::storage::memory::MemoryStorage;
    pub use crate::storage::Storage;
    pub use crate::types::{ChatMessage, UserConfig};
    pub use anyhow::Result;
}

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
