//! Client state cache
//!
//! A set of independently loading slices behind one lock, mutated only by
//! well-defined events: fetch settlements, channel lifecycle events, log
//! arrivals and selection changes. A single lock keeps every event an atomic
//! transition, which is what the cross-slice rules require: replacing the
//! account list prunes the selection in the same step, and closing the
//! accounts channel clears list and selection together.
//!
//! Readers obtain a [`watch`] receiver from [`Store::subscribe`] and re-read
//! after each change notification.

use std::collections::{BTreeSet, VecDeque};
use std::fmt;

use tokio::sync::{watch, RwLock};
use tracing::debug;

use crate::api::types::Account;

/// The two push channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelKind {
    Accounts,
    Logs,
}

impl fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelKind::Accounts => f.write_str("accounts"),
            ChannelKind::Logs => f.write_str("logs"),
        }
    }
}

/// The three independently-loading store counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreInfoField {
    Card,
    Balance,
    Emission,
}

/// One `{content, is_loading, error}` triple.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreField {
    pub content: String,
    pub is_loading: bool,
    pub error: String,
}

impl StoreField {
    fn initial() -> Self {
        Self { content: String::new(), is_loading: true, error: String::new() }
    }
}

/// Store-wide counters; the three fields load and fail independently.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreInfoSlice {
    pub card: StoreField,
    pub balance: StoreField,
    pub emission: StoreField,
}

impl StoreInfoSlice {
    pub fn field(&self, field: StoreInfoField) -> &StoreField {
        match field {
            StoreInfoField::Card => &self.card,
            StoreInfoField::Balance => &self.balance,
            StoreInfoField::Emission => &self.emission,
        }
    }

    fn field_mut(&mut self, field: StoreInfoField) -> &mut StoreField {
        match field {
            StoreInfoField::Card => &mut self.card,
            StoreInfoField::Balance => &mut self.balance,
            StoreInfoField::Emission => &mut self.emission,
        }
    }
}

/// Account list with its own loading/error state.
#[derive(Debug, Clone)]
pub struct AccountsSlice {
    pub accounts: Vec<Account>,
    pub is_loading: bool,
    pub error: String,
}

/// Open/closed flag per push channel, driven solely by lifecycle events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionSlice {
    pub accounts_open: bool,
    pub logs_open: bool,
}

struct StoreState {
    accounts: AccountsSlice,
    store_info: StoreInfoSlice,
    logs: VecDeque<String>,
    logs_total: u64,
    connections: ConnectionSlice,
    selection: BTreeSet<String>,
}

/// The shared client cache. Cheap to clone behind an `Arc`; handed by
/// reference to the network components and read reactively by callers.
pub struct Store {
    state: RwLock<StoreState>,
    changed: watch::Sender<()>,
    log_capacity: usize,
}

impl Store {
    pub fn new(log_capacity: usize) -> Self {
        let (changed, _) = watch::channel(());
        Self {
            state: RwLock::new(StoreState {
                accounts: AccountsSlice {
                    accounts: Vec::new(),
                    is_loading: true,
                    error: String::new(),
                },
                store_info: StoreInfoSlice {
                    card: StoreField::initial(),
                    balance: StoreField::initial(),
                    emission: StoreField::initial(),
                },
                logs: VecDeque::new(),
                logs_total: 0,
                connections: ConnectionSlice { accounts_open: false, logs_open: false },
                selection: BTreeSet::new(),
            }),
            changed,
            log_capacity,
        }
    }

    /// Receiver that is marked changed after every applied event.
    pub fn subscribe(&self) -> watch::Receiver<()> {
        self.changed.subscribe()
    }

    async fn mutate(&self, apply: impl FnOnce(&mut StoreState)) {
        {
            let mut state = self.state.write().await;
            apply(&mut state);
        }
        self.changed.send_replace(());
    }

    // ==================== Accounts slice ====================

    pub async fn accounts_loading(&self) {
        self.mutate(|s| s.accounts.is_loading = true).await;
    }

    /// Fetch success: replace the list wholesale, clear the error, order
    /// non-existent accounts after existent ones and prune the selection to
    /// cards that are still selectable - all in one transition.
    pub async fn set_accounts(&self, mut accounts: Vec<Account>) {
        accounts.sort_by_key(|a| !a.exists);
        self.mutate(|s| {
            s.selection.retain(|card| {
                accounts.iter().any(|a| a.exists && a.card_number == *card)
            });
            s.accounts.accounts = accounts;
            s.accounts.is_loading = false;
            s.accounts.error.clear();
        })
        .await;
    }

    /// Fetch failure: only the error/loading fields change; stale data stays
    /// visible alongside the error.
    pub async fn accounts_error(&self, message: String) {
        self.mutate(|s| {
            s.accounts.is_loading = false;
            s.accounts.error = message;
        })
        .await;
    }

    pub async fn accounts(&self) -> AccountsSlice {
        self.state.read().await.accounts.clone()
    }

    // ==================== Store counters ====================

    pub async fn store_field_loading(&self, field: StoreInfoField) {
        self.mutate(|s| s.store_info.field_mut(field).is_loading = true).await;
    }

    pub async fn set_store_field(&self, field: StoreInfoField, content: String) {
        self.mutate(|s| {
            let f = s.store_info.field_mut(field);
            f.content = content;
            f.is_loading = false;
            f.error.clear();
        })
        .await;
    }

    pub async fn store_field_error(&self, field: StoreInfoField, message: String) {
        self.mutate(|s| {
            let f = s.store_info.field_mut(field);
            f.is_loading = false;
            f.error = message;
        })
        .await;
    }

    pub async fn store_info(&self) -> StoreInfoSlice {
        self.state.read().await.store_info.clone()
    }

    // ==================== Logs ====================

    /// Append one log line verbatim, in arrival order. The buffer is a ring:
    /// at capacity the oldest line is dropped.
    pub async fn push_log(&self, line: String) {
        let capacity = self.log_capacity;
        self.mutate(|s| {
            if s.logs.len() == capacity {
                s.logs.pop_front();
            }
            s.logs.push_back(line);
            s.logs_total += 1;
        })
        .await;
    }

    pub async fn logs(&self) -> Vec<String> {
        self.state.read().await.logs.iter().cloned().collect()
    }

    /// Monotonic count of every line ever appended, eviction included.
    pub async fn logs_total(&self) -> u64 {
        self.state.read().await.logs_total
    }

    // ==================== Connection flags ====================

    pub async fn channel_opened(&self, kind: ChannelKind) {
        self.mutate(|s| match kind {
            ChannelKind::Accounts => s.connections.accounts_open = true,
            ChannelKind::Logs => s.connections.logs_open = true,
        })
        .await;
    }

    /// Channel close. Closing `accounts` is fail-closed: the list must not
    /// be rendered as fresh, so it is emptied together with the selection.
    /// Closing `logs` only stops growth; history stays visible.
    pub async fn channel_closed(&self, kind: ChannelKind) {
        self.mutate(|s| match kind {
            ChannelKind::Accounts => {
                s.connections.accounts_open = false;
                s.accounts.accounts.clear();
                s.selection.clear();
            }
            ChannelKind::Logs => s.connections.logs_open = false,
        })
        .await;
        debug!("{kind} channel marked closed");
    }

    pub async fn connections(&self) -> ConnectionSlice {
        self.state.read().await.connections
    }

    // ==================== Selection ====================

    /// Select a card for a bulk action. Refused (returns `false`) for cards
    /// that are not currently cached as existent.
    pub async fn select(&self, card_number: &str) -> bool {
        let mut selected = false;
        self.mutate(|s| {
            let selectable = s
                .accounts
                .accounts
                .iter()
                .any(|a| a.exists && a.card_number == card_number);
            if selectable {
                s.selection.insert(card_number.to_string());
                selected = true;
            }
        })
        .await;
        selected
    }

    pub async fn unselect(&self, card_number: &str) {
        self.mutate(|s| {
            s.selection.remove(card_number);
        })
        .await;
    }

    /// Explicit reset, e.g. after the operator acknowledges a bulk result.
    pub async fn clear_selection(&self) {
        self.mutate(|s| s.selection.clear()).await;
    }

    pub async fn selection(&self) -> Vec<String> {
        self.state.read().await.selection.iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account(card: &str, exists: bool) -> Account {
        Account {
            card_number: card.to_string(),
            balance: 0,
            transactions: Vec::new(),
            exists,
            tokens: Vec::new(),
            username: format!("user-{card}"),
        }
    }

    #[tokio::test]
    async fn successful_fetch_replaces_wholesale_and_clears_error() {
        let store = Store::new(16);
        store.accounts_error("boom".into()).await;
        store.set_accounts(vec![account("1", true), account("2", true)]).await;

        let slice = store.accounts().await;
        assert_eq!(slice.accounts.len(), 2);
        assert!(!slice.is_loading);
        assert_eq!(slice.error, "");

        // Replace, not merge
        store.set_accounts(vec![account("3", true)]).await;
        let slice = store.accounts().await;
        assert_eq!(slice.accounts.len(), 1);
        assert_eq!(slice.accounts[0].card_number, "3");
    }

    #[tokio::test]
    async fn failed_fetch_keeps_stale_data_visible() {
        let store = Store::new(16);
        store.set_accounts(vec![account("1", true)]).await;
        store.accounts_loading().await;
        store.accounts_error("Internal server error. Please, try again later".into()).await;

        let slice = store.accounts().await;
        assert_eq!(slice.accounts.len(), 1, "stale data must survive a failed fetch");
        assert!(!slice.is_loading);
        assert!(!slice.error.is_empty());
    }

    #[tokio::test]
    async fn non_existent_accounts_sort_last() {
        let store = Store::new(16);
        store
            .set_accounts(vec![
                account("1", false),
                account("2", true),
                account("3", false),
                account("4", true),
            ])
            .await;

        let cards: Vec<(String, bool)> = store
            .accounts()
            .await
            .accounts
            .iter()
            .map(|a| (a.card_number.clone(), a.exists))
            .collect();
        assert_eq!(
            cards,
            vec![
                ("2".to_string(), true),
                ("4".to_string(), true),
                ("1".to_string(), false),
                ("3".to_string(), false),
            ]
        );
    }

    #[tokio::test]
    async fn selection_is_pruned_when_existence_flips() {
        let store = Store::new(16);
        store.set_accounts(vec![account("1", true), account("2", true)]).await;
        assert!(store.select("1").await);
        assert!(store.select("2").await);

        // "2" gets soft-deleted on the server; the next replace must drop it
        // from the selection in the same observable state.
        store.set_accounts(vec![account("1", true), account("2", false)]).await;
        assert_eq!(store.selection().await, vec!["1".to_string()]);
    }

    #[tokio::test]
    async fn non_existent_accounts_cannot_be_selected() {
        let store = Store::new(16);
        store.set_accounts(vec![account("1", false)]).await;
        assert!(!store.select("1").await);
        assert!(!store.select("unknown").await);
        assert!(store.selection().await.is_empty());
    }

    #[tokio::test]
    async fn closing_accounts_channel_fails_closed() {
        let store = Store::new(16);
        store.channel_opened(ChannelKind::Accounts).await;
        store.set_accounts(vec![account("1", true)]).await;
        store.select("1").await;

        store.channel_closed(ChannelKind::Accounts).await;
        assert!(!store.connections().await.accounts_open);
        assert!(store.accounts().await.accounts.is_empty());
        assert!(store.selection().await.is_empty());
    }

    #[tokio::test]
    async fn closing_logs_channel_preserves_history() {
        let store = Store::new(16);
        store.channel_opened(ChannelKind::Logs).await;
        store.push_log("m1".into()).await;
        store.push_log("m2".into()).await;

        store.channel_closed(ChannelKind::Logs).await;
        assert!(!store.connections().await.logs_open);
        assert_eq!(store.logs().await, vec!["m1".to_string(), "m2".to_string()]);
    }

    #[tokio::test]
    async fn logs_keep_arrival_order_and_evict_oldest() {
        let store = Store::new(3);
        for line in ["a", "b", "c", "d"] {
            store.push_log(line.into()).await;
        }
        assert_eq!(
            store.logs().await,
            vec!["b".to_string(), "c".to_string(), "d".to_string()]
        );
        assert_eq!(store.logs_total().await, 4);
    }

    #[tokio::test]
    async fn store_fields_settle_independently() {
        let store = Store::new(16);
        store.set_store_field(StoreInfoField::Card, "01".into()).await;
        store.store_field_error(StoreInfoField::Balance, "Not found, check the request".into()).await;

        let info = store.store_info().await;
        assert_eq!(info.card.content, "01");
        assert!(!info.card.is_loading);
        assert_eq!(info.card.error, "");
        assert!(!info.balance.is_loading);
        assert!(!info.balance.error.is_empty());
        // Emission untouched, still in its initial loading state
        assert!(info.emission.is_loading);
        assert_eq!(info.emission.content, "");
    }

    #[tokio::test]
    async fn watch_signal_fires_on_every_event() {
        let store = Store::new(16);
        let mut rx = store.subscribe();
        store.push_log("m1".into()).await;
        assert!(rx.has_changed().expect("sender alive"));
    }
}
