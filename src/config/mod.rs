// src/config/mod.rs - Runtime settings and operational constants

use std::env;
use std::time::Duration;

use anyhow::{Context, Result};
use log::info;

/// Bots that are never banned even when a known-bot list flags them.
pub const WHITELISTED_BOTS: &[&str] = &[
    "soundalerts",
    "nightbot",
    "streamlabs",
    "pokemoncommunitygame",
    "streamelements",
    "moobot",
    "wizebot",
    "bad_elbereth",
    "dixperbro",
    "pretzelrocks",
    "playwithviewersbot",
    "blerp",
    "sery_bot",
    "buttsbot",
    "songlistbot",
    "frostytoolsdotcom",
    "kofistreambot",
    "lumiastream",
    "botrixoficial",
    "fossabot",
    "wzbot",
    "rainmaker",
    "streamstickers",
    "tangiabot",
    "dixperbot",
    "trackerggbot",
    "creatisbot",
    "day_walker78",
];

/// Runtime configuration, loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Username of the platform account the bot acts as.
    pub bot_username: String,
    /// Platform id of the bot account.
    pub bot_id: String,
    /// OAuth application credentials used for token refresh.
    pub client_id: String,
    pub client_secret: String,
    /// Initial token state seeded into storage at startup.
    pub access_token: String,
    pub refresh_token: String,
    /// How long the consumer waits on an empty queue before re-checking the
    /// shutdown flag.
    pub queue_poll_timeout: Duration,
    /// Delay between account scan cycles.
    pub scan_interval: Duration,
    /// The minimum time that must elapse between scans of the same channel.
    pub min_time_between_scans: chrono::Duration,
    /// How many channel scans run in parallel.
    pub scan_workers: usize,
    /// Delay between known-bot-list refreshes.
    pub botlist_refresh_interval: Duration,
    /// Tokens expiring within this window are refreshed before use.
    pub token_validity_window: chrono::Duration,
}

impl Settings {
    /// Load settings from environment variables. Credentials are required;
    /// everything else has a sensible default.
    pub fn from_env() -> Result<Self> {
        let bot_username = env::var("CHATWARDEN_BOT_USERNAME")
            .context("CHATWARDEN_BOT_USERNAME environment variable not set")?;
        let bot_id = env::var("CHATWARDEN_BOT_ID")
            .context("CHATWARDEN_BOT_ID environment variable not set")?;
        let client_id = env::var("CHATWARDEN_CLIENT_ID")
            .context("CHATWARDEN_CLIENT_ID environment variable not set")?;
        let client_secret = env::var("CHATWARDEN_CLIENT_SECRET")
            .context("CHATWARDEN_CLIENT_SECRET environment variable not set")?;
        let access_token = env::var("CHATWARDEN_ACCESS_TOKEN")
            .context("CHATWARDEN_ACCESS_TOKEN environment variable not set")?;
        let refresh_token = env::var("CHATWARDEN_REFRESH_TOKEN")
            .context("CHATWARDEN_REFRESH_TOKEN environment variable not set")?;

        let scan_workers = env_or("CHATWARDEN_SCAN_WORKERS", 5)?;
        let scan_interval = Duration::from_secs(env_or("CHATWARDEN_SCAN_INTERVAL_SECS", 10)?);
        let min_time_between_scans =
            chrono::Duration::seconds(env_or("CHATWARDEN_MIN_SCAN_GAP_SECS", 30)?);
        let botlist_refresh_interval =
            Duration::from_secs(env_or("CHATWARDEN_BOTLIST_REFRESH_SECS", 600)?);

        info!(
            "Loaded settings for bot account '{}' ({} scan workers)",
            bot_username, scan_workers
        );

        Ok(Self {
            bot_username,
            bot_id,
            client_id,
            client_secret,
            access_token,
            refresh_token,
            queue_poll_timeout: Duration::from_millis(500),
            scan_interval,
            min_time_between_scans,
            scan_workers,
            botlist_refresh_interval,
            token_validity_window: chrono::Duration::hours(1),
        })
    }
}

fn env_or<T>(name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) => raw
            .parse()
            .with_context(|| format!("{} is not a valid value", name)),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whitelist_is_lowercase() {
        // The whitelist is compared against lowercased logins, so it must be
        // stored lowercased itself.
        for name in WHITELISTED_BOTS {
            assert_eq!(*name, name.to_lowercase());
        }
    }

    #[test]
    fn env_or_falls_back_to_default() {
        assert_eq!(env_or("CHATWARDEN_TEST_UNSET_VAR", 42usize).unwrap(), 42);
    }
}
