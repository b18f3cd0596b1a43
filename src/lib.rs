//! Client SDK for the banksim admin console
//!
//! The data-synchronization layer behind the console: resilient HTTP with a
//! bounded fixed-delay retry loop, two supervised server-push channels, and
//! a normalized client cache that the presentation layer reads reactively.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use banksim_console::{ApiClient, Args, CacheSync, ChannelKind, Store, SubscriptionManager};
//! use clap::Parser;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let args = Args::parse_from(["banksim-console"]);
//! let store = Arc::new(Store::new(args.log_capacity));
//! let api = Arc::new(ApiClient::new(&args));
//! let sync = Arc::new(CacheSync::new(api.clone(), store.clone()));
//! let subscriptions = Arc::new(SubscriptionManager::new(
//!     api.clone(),
//!     store.clone(),
//!     sync.clone(),
//!     args.ws_base(),
//!     args.reconnect_delay(),
//! ));
//!
//! subscriptions.connect(ChannelKind::Accounts).await?;
//! subscriptions.connect(ChannelKind::Logs).await?;
//!
//! let accounts = store.accounts().await;
//! println!("{} accounts cached", accounts.accounts.len());
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod config;
pub mod fetch;
pub mod store;
pub mod subscription;
pub mod sync;

// Re-export main types
pub use api::{ApiClient, BulkOutcome};
pub use config::Args;
pub use fetch::{FetchError, RetryPolicy};
pub use store::{ChannelKind, Store, StoreInfoField};
pub use subscription::{ChannelError, SubscriptionManager};
pub use sync::CacheSync;
