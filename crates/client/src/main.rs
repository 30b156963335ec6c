//! `ustaz-notify` -- headless notification client.
//!
//! Connects to the notification channel with the stored token, loads the
//! first page and unread count over REST, then logs every push event as a
//! toast until Ctrl-C.
//!
//! # Environment variables
//!
//! | Variable                     | Required | Default | Description                          |
//! |------------------------------|----------|---------|--------------------------------------|
//! | `USTAZ_WS_URL`               | yes      | --      | Channel endpoint, e.g. `wss://host/ws/notifications` |
//! | `USTAZ_API_URL`              | yes      | --      | REST base, e.g. `https://host/api`   |
//! | `USTAZ_TOKEN_FILE`           | no       | --      | File holding the bearer token        |
//! | `USTAZ_TOKEN`                | no       | --      | Bearer token when no file is set     |
//! | `USTAZ_LOCALE`               | no       | `ar`    | `ar` or `en`                         |
//! | `USTAZ_RECONNECT_INITIAL_MS` | no       | `1000`  | First reconnect delay                |
//! | `USTAZ_RECONNECT_MAX_MS`     | no       | `5000`  | Reconnect delay cap                  |
//! | `USTAZ_PAGE_LIMIT`           | no       | `20`    | Notifications per REST page          |

use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ustaz_client::{BridgeState, ClientConfig, NotificationBridge, NotificationSync, TracingToaster};
use ustaz_realtime::{ChannelManager, NotificationApi};
use ustaz_store::NotificationStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ustaz_client=info,ustaz_realtime=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ClientConfig::from_env().context("invalid configuration")?;

    tracing::info!(
        ws_url = %config.ws_url,
        api_url = %config.api_url,
        locale = %config.locale,
        "Starting ustaz-notify",
    );

    let manager = ChannelManager::new(config.channel_config());
    let store = NotificationStore::new();
    let tokens = config.token_store();

    let mut bridge = NotificationBridge::new(
        Arc::clone(&manager),
        store.clone(),
        Arc::clone(&tokens),
        Arc::new(TracingToaster),
    )
    .with_locale(config.locale)
    .with_muted_prefixes(config.muted_prefixes.clone());

    bridge.set_authenticated(true).await;
    if bridge.state() == BridgeState::Inactive {
        tracing::warn!("No auth token found, set USTAZ_TOKEN or USTAZ_TOKEN_FILE");
        return Ok(());
    }

    if let Some(token) = tokens.load().await.context("reading auth token")? {
        let sync = NotificationSync::new(
            NotificationApi::new(config.api_url.clone(), token),
            store.clone(),
            config.page_limit,
        );
        match sync.load_first_page().await {
            Ok(()) => tracing::info!(
                loaded = store.len(),
                unread = store.unread_count(),
                "Notifications loaded",
            ),
            Err(e) => tracing::warn!(error = %e, "Initial notification load failed"),
        }
        if let Err(e) = sync.refresh_unread_count().await {
            tracing::warn!(error = %e, "Unread count refresh failed");
        }
    }

    tokio::signal::ctrl_c().await.context("waiting for Ctrl-C")?;

    tracing::info!(unread = store.unread_count(), "Shutting down");
    bridge.set_authenticated(false).await;

    Ok(())
}
