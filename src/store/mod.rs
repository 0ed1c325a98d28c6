//! Process-wide state store.
//!
//! A single writer: every dispatch runs the reducers under the watch
//! channel's write lock, so concurrent actions are serialized. Readers take
//! cheap `Arc<AppState>` snapshots.

pub mod coordination;
mod events;
mod reducers;
mod state;

pub use events::*;
pub use reducers::{reduce, reduce_all};
pub use state::*;

use std::sync::Arc;

use tokio::sync::{broadcast, watch};

/// Capacity of the dispatched-batch feed.
const DISPATCH_FEED_CAPACITY: usize = 256;

/// Handle to the store. Cloning shares the same state tree.
#[derive(Clone)]
pub struct Store {
    state: Arc<watch::Sender<Arc<AppState>>>,
    feed: broadcast::Sender<Arc<[Event]>>,
}

impl Store {
    pub fn new() -> Self {
        Self::with_state(AppState::default())
    }

    /// Start from a given tree (e.g. one rehydrated from disk or a test fixture).
    pub fn with_state(initial: AppState) -> Self {
        let (state, _) = watch::channel(Arc::new(initial));
        let (feed, _) = broadcast::channel(DISPATCH_FEED_CAPACITY);
        Self {
            state: Arc::new(state),
            feed,
        }
    }

    /// Current snapshot.
    pub fn state(&self) -> Arc<AppState> {
        self.state.borrow().clone()
    }

    pub fn dispatch(&self, event: Event) {
        self.dispatch_batch(vec![event]);
    }

    /// Apply several events atomically: observers never see a partial batch.
    pub fn dispatch_batch(&self, events: Vec<Event>) {
        if events.is_empty() {
            return;
        }

        tracing::debug!(
            count = events.len(),
            first = ?events[0].domain(),
            "Dispatching events"
        );

        // Published under the write lock so the feed order is the apply order.
        self.state.send_modify(|state| {
            *state = Arc::new(reduce_all(state, &events));
            // No receivers is fine.
            let _ = self.feed.send(events.into());
        });
    }

    /// Receiver notified after every dispatch.
    pub fn subscribe(&self) -> watch::Receiver<Arc<AppState>> {
        self.state.subscribe()
    }

    /// Feed of dispatched batches, in dispatch order.
    pub fn dispatched(&self) -> broadcast::Receiver<Arc<[Event]>> {
        self.feed.subscribe()
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}
