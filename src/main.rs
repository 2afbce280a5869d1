use std::sync::Arc;

use anyhow::Result;
use chrono::Utc;
use log::info;
use tokio::time::{sleep, Duration};

use chatwarden::platforms::auth::TokenManager;
use chatwarden::prelude::*;
use chatwarden::types::{BotAccount, TokenPair};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables and initialize logging
    dotenv::dotenv().ok();
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    info!("Starting chatwarden v{}", chatwarden::VERSION);

    let settings = Settings::from_env()?;

    // Seed storage with the bot's own account. The access token from the
    // environment is treated as freshly issued; the token manager refreshes
    // it on demand from then on.
    let store = Arc::new(MemoryStorage::new());
    store
        .set_bot_account(BotAccount {
            twitch_id: settings.bot_id.clone(),
            username: settings.bot_username.clone(),
            tokens: TokenPair {
                access_token: settings.access_token.clone(),
                refresh_token: settings.refresh_token.clone(),
                expires_at: Utc::now() + chrono::Duration::hours(4),
            },
        })
        .await;

    let api_factory = Arc::new(TokenManager::new(
        store.clone(),
        settings.client_id.clone(),
        settings.client_secret.clone(),
        settings.token_validity_window,
    ));

    let mut service = BotService::new(settings, store, api_factory);
    service.start()?;

    // The platform chat client plugs in here: it clones this handle and
    // enqueues every PRIVMSG it receives.
    let _queue = service.message_queue();

    info!("chatwarden running; press ctrl-c to stop");
    tokio::signal::ctrl_c().await?;

    info!("shutdown requested");
    service.stop();

    // Give the loops a beat to observe the signal and finish in-flight work.
    sleep(Duration::from_secs(1)).await;
    info!("chatwarden stopped");
    Ok(())
}
