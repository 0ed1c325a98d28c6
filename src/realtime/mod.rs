//! Real-time merge layer.
//!
//! A subscription keeps one WebSocket open for a user or a task and routes
//! every update it receives through the store, so the store stays the only
//! writer. Dropped connections are retried with a fixed delay up to a
//! bounded number of attempts; a clean close from either side ends the
//! subscription.

mod events;

pub use events::{PushEvent, Scope, TaskRef};

use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::store::Store;

/// Lifecycle of a subscription's connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Connected,
    /// Waiting before reconnect attempt `attempt`.
    Reconnecting { attempt: u32 },
    Closed(CloseReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    /// The subscription was closed or dropped.
    Client,
    /// The server sent a close frame.
    Server,
    /// Reconnect attempts were exhausted.
    GaveUp,
}

/// How one connection ended.
enum ConnectionEnd {
    Cancelled,
    ServerClosed,
    Dropped,
}

/// Factory for push subscriptions.
#[derive(Clone)]
pub struct PushChannel {
    ws_url: String,
    reconnect_delay: Duration,
    max_reconnect_attempts: u32,
    store: Store,
}

impl PushChannel {
    pub fn new(config: &Config, store: Store) -> Self {
        Self {
            ws_url: config.ws_url.clone(),
            reconnect_delay: config.reconnect_delay,
            max_reconnect_attempts: config.max_reconnect_attempts,
            store,
        }
    }

    /// Open a subscription. Must be called from within a Tokio runtime.
    pub fn subscribe(&self, scope: Scope) -> PushSubscription {
        let (cancel, state, handle) = self.spawn(scope);
        PushSubscription {
            channel: self.clone(),
            scope,
            cancel,
            state,
            handle: Some(handle),
        }
    }

    fn spawn(
        &self,
        scope: Scope,
    ) -> (CancellationToken, watch::Receiver<ConnectionState>, JoinHandle<()>) {
        let cancel = CancellationToken::new();
        let (state_tx, state_rx) = watch::channel(ConnectionState::Connecting);
        let handle = tokio::spawn(listen(self.clone(), scope, cancel.clone(), state_tx));
        (cancel, state_rx, handle)
    }
}

/// A live subscription. Dropping it stops the listener.
pub struct PushSubscription {
    channel: PushChannel,
    scope: Scope,
    cancel: CancellationToken,
    state: watch::Receiver<ConnectionState>,
    handle: Option<JoinHandle<()>>,
}

impl PushSubscription {
    pub fn scope(&self) -> Scope {
        self.scope
    }

    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    /// Receiver for connection state changes.
    pub fn state_changes(&self) -> watch::Receiver<ConnectionState> {
        self.state.clone()
    }

    /// Close the connection and wait for the listener to stop.
    pub async fn close(mut self) {
        self.shutdown().await;
    }

    /// Switch to another scope. The old listener is fully stopped before the
    /// new one starts, so no update for the old scope lands afterwards.
    pub async fn retarget(&mut self, scope: Scope) {
        if scope == self.scope && self.handle.is_some() {
            return;
        }
        self.shutdown().await;

        let (cancel, state, handle) = self.channel.spawn(scope);
        tracing::debug!(?scope, "Push subscription retargeted");
        self.scope = scope;
        self.cancel = cancel;
        self.state = state;
        self.handle = Some(handle);
    }

    async fn shutdown(&mut self) {
        self.cancel.cancel();
        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.await {
                tracing::error!("Push listener panicked: {}", e);
            }
        }
    }
}

impl Drop for PushSubscription {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn listen(
    channel: PushChannel,
    scope: Scope,
    cancel: CancellationToken,
    state: watch::Sender<ConnectionState>,
) {
    let mut attempts = 0u32;

    loop {
        let end = connect_and_listen(&channel, scope, &cancel, &state, &mut attempts).await;

        match end {
            Ok(ConnectionEnd::Cancelled) => {
                state.send_replace(ConnectionState::Closed(CloseReason::Client));
                tracing::debug!(?scope, "Push subscription closed");
                return;
            }
            Ok(ConnectionEnd::ServerClosed) => {
                state.send_replace(ConnectionState::Closed(CloseReason::Server));
                tracing::info!(?scope, "Push channel closed by server");
                return;
            }
            Ok(ConnectionEnd::Dropped) => {
                tracing::warn!(?scope, "Push channel connection dropped");
            }
            Err(e) => {
                tracing::warn!(?scope, "Push channel error: {}", e);
            }
        }

        attempts += 1;
        if attempts > channel.max_reconnect_attempts {
            state.send_replace(ConnectionState::Closed(CloseReason::GaveUp));
            tracing::error!(
                ?scope,
                attempts = channel.max_reconnect_attempts,
                "Giving up on push channel"
            );
            return;
        }

        state.send_replace(ConnectionState::Reconnecting { attempt: attempts });
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                state.send_replace(ConnectionState::Closed(CloseReason::Client));
                return;
            }
            _ = tokio::time::sleep(channel.reconnect_delay) => {}
        }
    }
}

/// One connection: connect, join, then apply updates until it ends.
async fn connect_and_listen(
    channel: &PushChannel,
    scope: Scope,
    cancel: &CancellationToken,
    state: &watch::Sender<ConnectionState>,
    attempts: &mut u32,
) -> Result<ConnectionEnd, tungstenite::Error> {
    let (ws, _) = tokio::select! {
        biased;
        _ = cancel.cancelled() => return Ok(ConnectionEnd::Cancelled),
        result = connect_async(channel.ws_url.as_str()) => result?,
    };
    let (mut ws_tx, mut ws_rx) = ws.split();

    ws_tx.send(Message::text(scope.join_message())).await?;
    *attempts = 0;
    state.send_replace(ConnectionState::Connected);
    tracing::info!(?scope, url = %channel.ws_url, "Push channel connected");

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                // Best effort: the listener stops either way.
                let _ = ws_tx.send(Message::Close(None)).await;
                return Ok(ConnectionEnd::Cancelled);
            }
            msg = ws_rx.next() => {
                let Some(msg) = msg else {
                    return Ok(ConnectionEnd::Dropped);
                };
                match msg? {
                    Message::Text(text) => apply(&channel.store, scope, text.as_str()),
                    Message::Close(_) => return Ok(ConnectionEnd::ServerClosed),
                    _ => {}
                }
            }
        }
    }
}

fn apply(store: &Store, scope: Scope, text: &str) {
    let event: PushEvent = match serde_json::from_str(text) {
        Ok(event) => event,
        Err(e) => {
            tracing::debug!("Ignoring push message: {}", e);
            return;
        }
    };

    if !scope.accepts(&event) {
        tracing::debug!(?scope, task_id = event.task_id(), "Push update outside scope");
        return;
    }

    store.dispatch(event.into_event());
}
