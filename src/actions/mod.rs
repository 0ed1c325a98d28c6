//! Action layer: one async operation per user intent.
//!
//! Every action dispatches exactly one loading-start event, performs its
//! gateway call(s), dispatches exactly one terminal outcome and returns an
//! [`ActionResponse`]. Actions never panic or return `Err` to the caller.

mod auth;
mod help;
mod projects;
mod sequencer;
mod tasks;
mod teams;
mod users;

pub use sequencer::{StatusSequencer, StatusTicket};

use std::future::Future;
use std::sync::Arc;

use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::errors::{ErrorKind, GatewayError};
use crate::gateway::Gateway;
use crate::models::UserId;
use crate::storage::SessionStorage;
use crate::store::{coordination, Domain, Event, Store};

// ==================== Responses ====================

/// Failure details carried by an [`ActionResponse`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionError {
    pub kind: ErrorKind,
    pub message: String,
}

impl From<&GatewayError> for ActionError {
    fn from(err: &GatewayError) -> Self {
        Self {
            kind: err.kind,
            message: err.message.clone(),
        }
    }
}

/// Uniform outcome of an action: `{success, data}` or `{success: false, error}`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ActionError>,
    /// Set when the main operation succeeded but a follow-up step did not.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

impl<T> ActionResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            warning: None,
        }
    }

    pub fn failure(err: &GatewayError) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(err.into()),
            warning: None,
        }
    }

    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warning = Some(warning.into());
        self
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    /// Error kind of a failed response.
    pub fn error_kind(&self) -> Option<ErrorKind> {
        self.error.as_ref().map(|e| e.kind)
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error.as_ref().map(|e| e.message.as_str())
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ActionResponse<U> {
        ActionResponse {
            success: self.success,
            data: self.data.map(f),
            error: self.error,
            warning: self.warning,
        }
    }

    pub fn into_result(self) -> Result<T, ActionError> {
        match (self.data, self.error) {
            (Some(data), None) => Ok(data),
            (_, Some(err)) => Err(err),
            (None, None) => Err(ActionError {
                kind: ErrorKind::Server,
                message: "The action returned no data".to_string(),
            }),
        }
    }
}

// ==================== Actions ====================

/// Entry point for every user intent.
///
/// Clones share the gateway, the store and the cancellation token; use
/// [`Actions::for_view`] to get a handle whose pending calls can be
/// abandoned independently.
#[derive(Clone)]
pub struct Actions {
    gateway: Arc<Gateway>,
    store: Store,
    storage: Arc<SessionStorage>,
    sequencer: Arc<StatusSequencer>,
    cancel: CancellationToken,
}

impl Actions {
    pub fn new(gateway: Arc<Gateway>, store: Store, storage: Arc<SessionStorage>) -> Self {
        Self {
            gateway,
            store,
            storage,
            sequencer: Arc::new(StatusSequencer::default()),
            cancel: CancellationToken::new(),
        }
    }

    /// Handle tied to one view's lifetime. Cancelling it (or this handle)
    /// abandons its in-flight calls without touching other views.
    pub fn for_view(&self) -> Self {
        Self {
            cancel: self.cancel.child_token(),
            ..self.clone()
        }
    }

    /// Tear down the view owning this handle.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    fn current_user_id(&self) -> Option<UserId> {
        self.store.state().auth.user.as_ref().map(|u| u.id)
    }

    /// Run `call` with the standard start/failure events for `domain`.
    async fn run<T, Fut, S>(&self, domain: Domain, call: Fut, on_success: S) -> ActionResponse<T>
    where
        Fut: Future<Output = Result<T, GatewayError>>,
        S: FnOnce(&T) -> Vec<Event>,
    {
        self.execute(
            Event::started(domain),
            domain,
            call,
            on_success,
            |err| vec![Event::failed(domain, err.message.clone())],
            || vec![Event::settled(domain)],
        )
        .await
    }

    /// Dispatch `start`, await `call` unless the view is torn down, then
    /// dispatch exactly one terminal batch.
    ///
    /// A cancelled call dispatches `on_cancel`, which must undo anything
    /// `start` applied. A 401 that survived the refresh attempt clears
    /// persisted tokens and the whole session.
    async fn execute<T, Fut, S, F, C>(
        &self,
        start: Event,
        domain: Domain,
        call: Fut,
        on_success: S,
        on_failure: F,
        on_cancel: C,
    ) -> ActionResponse<T>
    where
        Fut: Future<Output = Result<T, GatewayError>>,
        S: FnOnce(&T) -> Vec<Event>,
        F: FnOnce(&GatewayError) -> Vec<Event>,
        C: FnOnce() -> Vec<Event>,
    {
        self.store.dispatch(start);

        let outcome = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(GatewayError::cancelled()),
            result = call => result,
        };

        // The response may land in the same instant as the teardown.
        let outcome = match outcome {
            Ok(_) if self.cancel.is_cancelled() => Err(GatewayError::cancelled()),
            other => other,
        };

        match outcome {
            Ok(data) => {
                self.store.dispatch_batch(on_success(&data));
                ActionResponse::success(data)
            }
            Err(err) if err.kind == ErrorKind::Cancelled => {
                tracing::debug!(?domain, "Action cancelled");
                self.store.dispatch_batch(on_cancel());
                ActionResponse::failure(&err)
            }
            Err(err) if err.ends_session() => {
                tracing::warn!(?domain, "Session expired: {}", err);
                if let Err(e) = self.storage.clear().await {
                    tracing::error!("Failed to clear stored session: {}", e);
                }
                self.store
                    .dispatch_batch(coordination::session_expired(domain, err.message.clone()));
                ActionResponse::failure(&err)
            }
            Err(err) => {
                tracing::debug!(?domain, "Action failed: {}", err);
                self.store.dispatch_batch(on_failure(&err));
                ActionResponse::failure(&err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::storage::init_storage;
    use tempfile::TempDir;

    /// Actions wired to a backend that refuses every connection.
    pub(crate) async fn offline_actions() -> (Actions, TempDir) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.db");
        let config = Config::for_backend("http://127.0.0.1:9", path.clone());

        let pool = init_storage(&path).await.unwrap();
        let storage = Arc::new(SessionStorage::new(pool));
        let store = Store::new();
        let gateway = Gateway::new(&config, storage.clone())
            .unwrap()
            .with_store(store.clone());

        (Actions::new(Arc::new(gateway), store, storage), dir)
    }

    #[test]
    fn test_failure_response_shape() {
        let err = GatewayError::from_response(409, r#"{"message":"Déjà membre"}"#);
        let response: ActionResponse<()> = ActionResponse::failure(&err);

        assert!(!response.is_success());
        assert_eq!(response.error_kind(), Some(ErrorKind::Conflict));

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["error"]["message"], "Déjà membre");
        assert!(json.get("data").is_none());
    }

    #[test]
    fn test_success_with_warning_keeps_data() {
        let response = ActionResponse::success(7).with_warning("not assigned");
        assert!(response.is_success());
        assert_eq!(response.warning.as_deref(), Some("not assigned"));
        assert_eq!(response.into_result().unwrap(), 7);
    }

    #[tokio::test]
    async fn test_network_failure_dispatches_start_then_failure() {
        let (actions, _dir) = offline_actions().await;
        let mut feed = actions.store().dispatched();

        let response = actions.fetch_project_tasks(3).await;
        assert_eq!(response.error_kind(), Some(ErrorKind::Network));

        let first = feed.recv().await.unwrap();
        assert_eq!(&first[..], &[Event::started(Domain::Task)]);
        let second = feed.recv().await.unwrap();
        assert!(matches!(
            &second[..],
            [Event::Task(crate::store::TaskEvent::Failed { .. })]
        ));

        // Network errors never end the session.
        assert!(actions.storage.tokens().await.unwrap().is_none());
        assert!(!actions.store().state().task.loading);
    }

    #[tokio::test]
    async fn test_cancelled_view_only_settles() {
        let (actions, _dir) = offline_actions().await;
        let view = actions.for_view();
        view.cancel();

        let response = view.fetch_project_tasks(3).await;
        assert_eq!(response.error_kind(), Some(ErrorKind::Cancelled));

        let state = actions.store().state();
        assert!(!state.task.loading);
        assert!(state.task.error.is_none());
        // The parent handle is unaffected.
        assert!(!actions.is_cancelled());
    }

    #[test]
    fn test_map_preserves_failure() {
        let err = GatewayError::network("refused");
        let response: ActionResponse<i64> = ActionResponse::failure(&err);
        let mapped = response.map(|n| n.to_string());
        assert!(!mapped.is_success());
        assert_eq!(mapped.into_result().unwrap_err().kind, ErrorKind::Network);
    }
}
