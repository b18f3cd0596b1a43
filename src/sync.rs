//! Fetch-to-cache wiring
//!
//! One refresh method per resource: mark the slice loading, run the retried
//! fetch, then either replace the slice wholesale or record the failure
//! message on it. Independent resources are refreshed as independent tasks
//! and may settle in any order.

use std::sync::Arc;

use tracing::error;

use crate::api::ApiClient;
use crate::store::{Store, StoreInfoField};

/// Keeps the [`Store`] consistent with the backend.
pub struct CacheSync {
    api: Arc<ApiClient>,
    store: Arc<Store>,
}

impl CacheSync {
    pub fn new(api: Arc<ApiClient>, store: Arc<Store>) -> Self {
        Self { api, store }
    }

    pub fn store(&self) -> &Arc<Store> {
        &self.store
    }

    /// Refresh the account list.
    pub async fn refresh_accounts(&self) {
        self.store.accounts_loading().await;
        match self.api.list_accounts().await {
            Ok(accounts) => self.store.set_accounts(accounts).await,
            Err(e) => {
                error!("failed to refresh account list: {e}");
                self.store.accounts_error(e.message()).await;
            }
        }
    }

    pub async fn refresh_store_card(&self) {
        self.refresh_store_field(StoreInfoField::Card).await;
    }

    pub async fn refresh_store_balance(&self) {
        self.refresh_store_field(StoreInfoField::Balance).await;
    }

    pub async fn refresh_emission(&self) {
        self.refresh_store_field(StoreInfoField::Emission).await;
    }

    async fn refresh_store_field(&self, field: StoreInfoField) {
        self.store.store_field_loading(field).await;
        let result = match field {
            StoreInfoField::Card => self.api.store_card().await,
            StoreInfoField::Balance => self.api.store_balance().await,
            StoreInfoField::Emission => self.api.emission().await,
        };
        match result {
            Ok(content) => self.store.set_store_field(field, content).await,
            Err(e) => {
                error!("failed to refresh store counter {field:?}: {e}");
                self.store.store_field_error(field, e.message()).await;
            }
        }
    }

    /// Everything at once: account list plus all three store counters, as
    /// four independent tasks. Used on channel open and at startup.
    pub fn spawn_refresh_all(self: &Arc<Self>) {
        let sync = Arc::clone(self);
        tokio::spawn(async move { sync.refresh_accounts().await });
        let sync = Arc::clone(self);
        tokio::spawn(async move { sync.refresh_store_card().await });
        self.spawn_refresh_volatile();
    }

    /// What an `accounts` channel message invalidates: the list, the store
    /// balance and the emission total. Three independent, unsequenced tasks.
    pub fn spawn_refresh_on_notify(self: &Arc<Self>) {
        let sync = Arc::clone(self);
        tokio::spawn(async move { sync.refresh_accounts().await });
        self.spawn_refresh_volatile();
    }

    fn spawn_refresh_volatile(self: &Arc<Self>) {
        let sync = Arc::clone(self);
        tokio::spawn(async move { sync.refresh_store_balance().await });
        let sync = Arc::clone(self);
        tokio::spawn(async move { sync.refresh_emission().await });
    }
}
