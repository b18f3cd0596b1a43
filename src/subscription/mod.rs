//! Push channel supervision
//!
//! Owns the two long-lived server-push channels (`accounts`, `logs`). A
//! connect is a two-step handshake: fetch a short-lived token over HTTP,
//! then open the WebSocket with the token embedded in the URL. Channel
//! lifecycle events are the only thing allowed to flip the cache's
//! connection flags.
//!
//! There is no automatic reconnect: a closed channel stays closed until the
//! caller asks for [`SubscriptionManager::reconnect`], which is guarded
//! against concurrent attempts per channel.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use thiserror::Error;
use tokio::net::TcpStream;
use tokio::sync::broadcast;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, error, info, warn};

use crate::api::ApiClient;
use crate::fetch::FetchError;
use crate::store::{ChannelKind, Store};
use crate::sync::CacheSync;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Failure to establish a channel. Token-fetch failures are distinguishable
/// from transport failures so the caller can word them differently.
#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("failed to fetch a subscription token for the {kind} channel: {source}")]
    TokenFetch { kind: ChannelKind, source: FetchError },

    #[error("failed to open the {kind} channel: {source}")]
    Connect {
        kind: ChannelKind,
        source: tokio_tungstenite::tungstenite::Error,
    },
}

fn subscribe_path(kind: ChannelKind) -> &'static str {
    match kind {
        ChannelKind::Accounts => "subscribe_on_accounts",
        ChannelKind::Logs => "subscribe_on_traces",
    }
}

struct ChannelSupervisor {
    shutdown: broadcast::Sender<()>,
    reconnecting: AtomicBool,
}

impl ChannelSupervisor {
    fn new() -> Self {
        let (shutdown, _) = broadcast::channel(1);
        Self { shutdown, reconnecting: AtomicBool::new(false) }
    }
}

/// Supervises one live channel per subscription kind.
pub struct SubscriptionManager {
    api: Arc<ApiClient>,
    store: Arc<Store>,
    sync: Arc<CacheSync>,
    ws_base: String,
    reconnect_delay: Duration,
    accounts: ChannelSupervisor,
    logs: ChannelSupervisor,
}

impl SubscriptionManager {
    pub fn new(
        api: Arc<ApiClient>,
        store: Arc<Store>,
        sync: Arc<CacheSync>,
        ws_base: String,
        reconnect_delay: Duration,
    ) -> Self {
        Self {
            api,
            store,
            sync,
            ws_base,
            reconnect_delay,
            accounts: ChannelSupervisor::new(),
            logs: ChannelSupervisor::new(),
        }
    }

    fn supervisor(&self, kind: ChannelKind) -> &ChannelSupervisor {
        match kind {
            ChannelKind::Accounts => &self.accounts,
            ChannelKind::Logs => &self.logs,
        }
    }

    /// Run the connect handshake and spawn the listen loop.
    ///
    /// On open the channel's connection flag flips true; the `accounts`
    /// channel additionally triggers one full cache pull, because the open
    /// handshake carries no snapshot.
    pub async fn connect(self: &Arc<Self>, kind: ChannelKind) -> Result<(), ChannelError> {
        let token = self
            .api
            .ws_token()
            .await
            .map_err(|source| ChannelError::TokenFetch { kind, source })?;

        let url = format!("{}/system/{}/{}", self.ws_base, subscribe_path(kind), token);
        let (stream, _) = connect_async(&url)
            .await
            .map_err(|source| ChannelError::Connect { kind, source })?;

        info!("{kind} channel open");
        self.store.channel_opened(kind).await;
        if kind == ChannelKind::Accounts {
            self.sync.spawn_refresh_all();
        }

        let manager = Arc::clone(self);
        let shutdown_rx = self.supervisor(kind).shutdown.subscribe();
        tokio::spawn(async move {
            manager.listen(kind, stream, shutdown_rx).await;
        });

        Ok(())
    }

    /// Tear down a channel. The close is unconditional and immediate;
    /// in-flight fetches are left to settle harmlessly.
    pub fn disconnect(&self, kind: ChannelKind) {
        let _ = self.supervisor(kind).shutdown.send(());
    }

    /// Caller-initiated reconnect: wait the fixed pre-reconnect delay, then
    /// run the connect handshake again. Returns `Ok(false)` when another
    /// reconnect for the same channel is already in progress.
    pub async fn reconnect(self: &Arc<Self>, kind: ChannelKind) -> Result<bool, ChannelError> {
        let supervisor = self.supervisor(kind);
        if supervisor
            .reconnecting
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!("{kind} channel reconnect already in progress, suppressing");
            return Ok(false);
        }

        tokio::time::sleep(self.reconnect_delay).await;
        let result = self.connect(kind).await;
        supervisor.reconnecting.store(false, Ordering::SeqCst);
        result.map(|()| true)
    }

    async fn listen(
        &self,
        kind: ChannelKind,
        stream: WsStream,
        mut shutdown_rx: broadcast::Receiver<()>,
    ) {
        let (mut write, mut read) = stream.split();

        loop {
            tokio::select! {
                _ = shutdown_rx.recv() => {
                    info!("{kind} channel shutdown requested, closing");
                    let _ = write.close().await;
                    break;
                }

                msg = read.next() => {
                    match msg {
                        Some(Ok(Message::Text(payload))) => {
                            self.dispatch(kind, payload).await;
                        }
                        Some(Ok(Message::Binary(data))) => {
                            match String::from_utf8(data) {
                                Ok(payload) => self.dispatch(kind, payload).await,
                                Err(_) => warn!("{kind} channel sent non-utf8 payload, ignoring"),
                            }
                        }
                        Some(Ok(Message::Ping(_) | Message::Pong(_) | Message::Frame(_))) => {}
                        Some(Ok(Message::Close(_))) => {
                            info!("{kind} channel closed by server");
                            break;
                        }
                        Some(Err(e)) => {
                            // No clean recovery action here beyond a manual
                            // reconnect, so this is diagnostic only.
                            error!("{kind} channel transport error: {e}");
                            break;
                        }
                        None => {
                            warn!("{kind} channel stream ended");
                            break;
                        }
                    }
                }
            }
        }

        self.store.channel_closed(kind).await;
    }

    /// Kind-specific message handling; the only coupling between channels
    /// and the cache.
    async fn dispatch(&self, kind: ChannelKind, payload: String) {
        match kind {
            // Arrival alone is the signal; content is ignored.
            ChannelKind::Accounts => {
                debug!("accounts channel notification, refreshing");
                self.sync.spawn_refresh_on_notify();
            }
            ChannelKind::Logs => self.store.push_log(payload).await,
        }
    }
}
