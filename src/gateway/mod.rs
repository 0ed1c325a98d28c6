//! HTTP gateway shared by every feature area.
//!
//! Attaches the bearer token read from storage right before each send,
//! normalizes error shapes and applies a single refresh-and-retry policy
//! on 401.

use std::sync::Arc;

use reqwest::{Method, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::config::Config;
use crate::errors::{ErrorKind, GatewayError};
use crate::models::{RefreshRequest, RefreshResponse, Tokens};
use crate::storage::SessionStorage;
use crate::store::{AuthEvent, Event, Store};

/// Header carrying a per-request correlation id.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Paths that must never trigger a refresh attempt.
const AUTH_PATHS: &[&str] = &["/auth/login", "/auth/register", "/auth/refresh"];

/// Status and raw body of a completed exchange, plus the token it was sent with.
struct RawResponse {
    status: u16,
    body: String,
    token: Option<String>,
}

/// The single configured HTTP client.
pub struct Gateway {
    client: reqwest::Client,
    base_url: String,
    storage: Arc<SessionStorage>,
    /// Notified when a refresh rotates the tokens.
    store: Option<Store>,
    /// Serializes refresh attempts so concurrent 401s refresh once.
    refresh_lock: Mutex<()>,
}

impl Gateway {
    pub fn new(config: &Config, storage: Arc<SessionStorage>) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .user_agent(concat!("teamtask-client/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            storage,
            store: None,
            refresh_lock: Mutex::new(()),
        })
    }

    /// Keep the store's session tokens in step with refreshes.
    pub fn with_store(mut self, store: Store) -> Self {
        self.store = Some(store);
        self
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, GatewayError> {
        self.request(Method::GET, path, &[], None).await
    }

    pub async fn get_with_query<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, GatewayError> {
        self.request(Method::GET, path, query, None).await
    }

    pub async fn post<T, B>(&self, path: &str, body: &B) -> Result<T, GatewayError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let body = to_body(body)?;
        self.request(Method::POST, path, &[], Some(body)).await
    }

    /// POST without a body.
    pub async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> Result<T, GatewayError> {
        self.request(Method::POST, path, &[], None).await
    }

    pub async fn put<T, B>(&self, path: &str, body: &B) -> Result<T, GatewayError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let body = to_body(body)?;
        self.request(Method::PUT, path, &[], Some(body)).await
    }

    /// PUT without a body.
    pub async fn put_empty<T: DeserializeOwned>(&self, path: &str) -> Result<T, GatewayError> {
        self.request(Method::PUT, path, &[], None).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, GatewayError> {
        self.request(Method::DELETE, path, &[], None).await
    }

    /// Send a request and decode a successful body into `T`.
    ///
    /// A 401 on a non-auth path refreshes the tokens once and retries once.
    pub async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
        body: Option<serde_json::Value>,
    ) -> Result<T, GatewayError> {
        let url = self.url(path, query)?;
        let request_id = Uuid::new_v4();

        let mut response = self
            .send_once(&method, &url, body.as_ref(), request_id)
            .await?;

        if response.status == 401 && !is_auth_path(path) {
            tracing::debug!(%request_id, path, "Received 401, attempting token refresh");

            match self.refresh_after(response.token.as_deref()).await {
                Ok(()) => {
                    response = self
                        .send_once(&method, &url, body.as_ref(), request_id)
                        .await?;
                    if response.status == 401 {
                        let mut err = GatewayError::from_response(401, &response.body);
                        err.session_expired = true;
                        return Err(err);
                    }
                }
                Err(err) if err.kind == ErrorKind::Network => return Err(err),
                Err(err) => {
                    tracing::warn!(%request_id, "Token refresh failed: {}", err);
                    let mut err = GatewayError::from_response(401, &response.body);
                    err.session_expired = true;
                    return Err(err);
                }
            }
        }

        decode(response)
    }

    async fn send_once(
        &self,
        method: &Method,
        url: &Url,
        body: Option<&serde_json::Value>,
        request_id: Uuid,
    ) -> Result<RawResponse, GatewayError> {
        // Read on every call so token rotation applies to the very next request.
        let token = self.storage.access_token().await?;

        let mut builder = self
            .client
            .request(method.clone(), url.clone())
            .header(REQUEST_ID_HEADER, request_id.to_string());
        if let Some(token) = &token {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(GatewayError::network)?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(GatewayError::network)?;

        tracing::debug!(%request_id, %method, path = url.path(), status, "Request completed");

        Ok(RawResponse {
            status,
            body,
            token,
        })
    }

    /// Refresh the tokens unless another caller already rotated them since
    /// `stale_token` was sent.
    async fn refresh_after(&self, stale_token: Option<&str>) -> Result<(), GatewayError> {
        let _guard = self.refresh_lock.lock().await;

        let current = self.storage.access_token().await?;
        if current.is_some() && current.as_deref() != stale_token {
            return Ok(());
        }

        let Some(refresh_token) = self.storage.refresh_token().await? else {
            return Err(GatewayError::from_response(401, ""));
        };

        let url = self.url("/auth/refresh", &[])?;
        let body = to_body(&RefreshRequest {
            refresh_token: refresh_token.clone(),
        })?;
        let response = self
            .client
            .post(url)
            .header(REQUEST_ID_HEADER, Uuid::new_v4().to_string())
            .json(&body)
            .send()
            .await
            .map_err(GatewayError::network)?;

        let status = response.status().as_u16();
        let text = response.text().await.map_err(GatewayError::network)?;
        let refreshed: RefreshResponse = decode(RawResponse {
            status,
            body: text,
            token: None,
        })?;

        let tokens = Tokens {
            access: refreshed.access_token,
            refresh: refreshed.refresh_token.unwrap_or(refresh_token),
        };
        self.storage.save_tokens(&tokens).await?;
        tracing::info!("Access token refreshed");

        if let Some(store) = &self.store {
            store.dispatch(Event::Auth(AuthEvent::TokensRotated { tokens }));
        }

        Ok(())
    }

    fn url(&self, path: &str, query: &[(&str, &str)]) -> Result<Url, GatewayError> {
        let mut url = Url::parse(&format!("{}{}", self.base_url, path)).map_err(|e| {
            GatewayError {
                kind: ErrorKind::Validation,
                status: None,
                message: format!("Invalid request URL: {}", e),
                session_expired: false,
            }
        })?;
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query.iter());
        }
        Ok(url)
    }
}

fn is_auth_path(path: &str) -> bool {
    AUTH_PATHS.iter().any(|p| path.starts_with(p))
}

fn to_body<B: Serialize + ?Sized>(body: &B) -> Result<serde_json::Value, GatewayError> {
    serde_json::to_value(body).map_err(|e| GatewayError {
        kind: ErrorKind::Validation,
        status: None,
        message: format!("Invalid request body: {}", e),
        session_expired: false,
    })
}

fn decode<T: DeserializeOwned>(response: RawResponse) -> Result<T, GatewayError> {
    if !(200..300).contains(&response.status) {
        return Err(GatewayError::from_response(response.status, &response.body));
    }

    // Empty bodies decode as `null` so `()` and `Option<_>` targets work.
    let body = if response.body.trim().is_empty() {
        "null"
    } else {
        response.body.as_str()
    };
    serde_json::from_str(body).map_err(GatewayError::decode)
}
