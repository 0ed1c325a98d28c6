//! TeamTask client
//!
//! Keeps a local, reducer-managed copy of a user's teams, projects, tasks and
//! help requests in sync with the TeamTask backend over REST and a push
//! channel.

pub mod actions;
pub mod config;
pub mod errors;
pub mod gateway;
pub mod models;
pub mod realtime;
pub mod selectors;
pub mod storage;
pub mod store;

use std::sync::Arc;

use actions::Actions;
use config::Config;
use gateway::Gateway;
use realtime::{PushChannel, PushSubscription, Scope};
use selectors::Selectors;
use storage::{init_storage, SessionStorage};
use store::Store;

/// Error returned while wiring the client together.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Everything a front end needs, built once at startup and shared.
#[derive(Clone)]
pub struct Client {
    config: Arc<Config>,
    store: Store,
    storage: Arc<SessionStorage>,
    actions: Actions,
    push: PushChannel,
    selectors: Arc<Selectors>,
}

impl Client {
    /// Open local storage and build the gateway, store and push channel.
    pub async fn connect(config: Config) -> Result<Self, BoxError> {
        let pool = init_storage(&config.storage_path).await?;
        let storage = Arc::new(SessionStorage::new(pool));
        let store = Store::new();

        let gateway = Gateway::new(&config, storage.clone())?.with_store(store.clone());
        let actions = Actions::new(Arc::new(gateway), store.clone(), storage.clone());
        let push = PushChannel::new(&config, store.clone());

        Ok(Self {
            config: Arc::new(config),
            store,
            storage,
            actions,
            push,
            selectors: Arc::new(Selectors::default()),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn storage(&self) -> &SessionStorage {
        &self.storage
    }

    /// Process-wide action handle. Use [`Actions::for_view`] for calls that
    /// should be abandoned with a view.
    pub fn actions(&self) -> &Actions {
        &self.actions
    }

    /// Shared memoized selectors.
    pub fn selectors(&self) -> &Selectors {
        &self.selectors
    }

    pub fn subscribe(&self, scope: Scope) -> PushSubscription {
        self.push.subscribe(scope)
    }
}
