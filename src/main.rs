//! banksim-console - headless monitor for the banksim backend
//!
//! Connects both push channels, keeps the client cache fresh, and tails the
//! backend log stream to stdout until interrupted.

use std::sync::Arc;

use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use banksim_console::{
    ApiClient, Args, CacheSync, ChannelKind, Store, SubscriptionManager,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    let log_level = args.log_level.clone();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("banksim_console={},info", log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(e) = args.validate() {
        error!("Configuration error: {}", e);
        std::process::exit(1);
    }

    info!("======================================");
    info!("  banksim-console");
    info!("======================================");
    info!("Backend: {}", args.http_base());
    info!("Retries: {} x {}ms", args.max_retries, args.retry_delay_ms);
    info!("Log buffer: {} lines", args.log_capacity);
    info!("======================================");

    let store = Arc::new(Store::new(args.log_capacity));
    let api = Arc::new(ApiClient::new(&args));
    let sync = Arc::new(CacheSync::new(api.clone(), store.clone()));
    let subscriptions = Arc::new(SubscriptionManager::new(
        api.clone(),
        store.clone(),
        sync.clone(),
        args.ws_base(),
        args.reconnect_delay(),
    ));

    // A failed channel is not fatal; the cache still serves what the HTTP
    // side can pull, and the operator can trigger a reconnect.
    for kind in [ChannelKind::Accounts, ChannelKind::Logs] {
        if let Err(e) = subscriptions.connect(kind).await {
            warn!("{e}");
        }
    }
    sync.spawn_refresh_all();

    let mut changes = store.subscribe();
    let mut printed_logs: u64 = 0;
    let mut last_account_count = 0usize;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted, shutting down");
                break;
            }

            changed = changes.changed() => {
                if changed.is_err() {
                    break;
                }

                // Tail newly arrived log lines (payloads are pre-colored)
                let total = store.logs_total().await;
                if total > printed_logs {
                    let lines = store.logs().await;
                    let fresh = (total - printed_logs).min(lines.len() as u64) as usize;
                    for line in &lines[lines.len() - fresh..] {
                        println!("{line}");
                    }
                    printed_logs = total;
                }

                let accounts = store.accounts().await;
                if accounts.error.is_empty() && accounts.accounts.len() != last_account_count {
                    last_account_count = accounts.accounts.len();
                    info!("{} accounts cached", last_account_count);
                }
            }
        }
    }

    subscriptions.disconnect(ChannelKind::Accounts);
    subscriptions.disconnect(ChannelKind::Logs);

    Ok(())
}
