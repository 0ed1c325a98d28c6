use crate::errors::GatewayError;
use crate::models::{LoginRequest, LoginResponse, RegisterRequest, UserSummary};
use crate::store::{coordination, Domain, Event};

use super::{ActionResponse, Actions};

impl Actions {
    /// Sign in, persist the token pair and user, then open the session.
    pub async fn login(&self, email: &str, password: &str) -> ActionResponse<UserSummary> {
        let request = LoginRequest {
            email: email.trim().to_string(),
            password: password.to_string(),
        };

        let call = async {
            let response: LoginResponse = self.gateway.post("/auth/login", &request).await?;
            let (tokens, user) = response.into_parts();
            self.storage.save_tokens(&tokens).await?;
            self.storage.save_user(&user).await?;
            Ok::<_, GatewayError>((user, tokens))
        };

        let response = self
            .run(Domain::Auth, call, |(user, tokens)| {
                coordination::session_started(user.clone(), tokens.clone())
            })
            .await;

        if let Some((user, _)) = &response.data {
            tracing::info!(user_id = user.id, "Signed in");
        }
        response.map(|(user, _)| user)
    }

    /// Create an account. Does not sign in.
    pub async fn register(&self, request: RegisterRequest) -> ActionResponse<()> {
        let call = async {
            let _: serde_json::Value = self.gateway.post("/auth/register", &request).await?;
            Ok::<_, GatewayError>(())
        };
        self.run(Domain::Auth, call, |_| vec![Event::settled(Domain::Auth)])
            .await
    }

    /// End the session. Local state is cleared whatever the server answers.
    pub async fn logout(&self) -> ActionResponse<()> {
        self.store.dispatch(Event::started(Domain::Auth));

        let result = self
            .gateway
            .post_empty::<serde_json::Value>("/auth/logout")
            .await;

        if let Err(e) = self.storage.clear().await {
            tracing::error!("Failed to clear stored session: {}", e);
        }
        self.store.dispatch_batch(coordination::session_ended());

        match result {
            Ok(_) => {
                tracing::info!("Signed out");
                ActionResponse::success(())
            }
            Err(err) => {
                tracing::warn!("Logout request failed, session cleared locally: {}", err);
                ActionResponse::failure(&err)
            }
        }
    }

    /// Rebuild the session from persisted tokens. No network call.
    ///
    /// Returns the cached user, or `None` when there is no stored session.
    pub async fn restore_session(&self) -> ActionResponse<Option<UserSummary>> {
        let call = async {
            let tokens = self.storage.tokens().await?;
            let user = match tokens {
                Some(_) => self.storage.user().await?,
                None => None,
            };
            Ok::<_, GatewayError>((tokens, user))
        };

        let response = self
            .run(Domain::Auth, call, |(tokens, user)| match tokens {
                Some(tokens) => coordination::session_restored(user.clone(), tokens.clone()),
                None => vec![Event::settled(Domain::Auth)],
            })
            .await;

        if let Some((Some(_), user)) = &response.data {
            tracing::info!(user_id = ?user.as_ref().map(|u| u.id), "Session restored");
        }
        response.map(|(_, user)| user)
    }

    /// Reload the signed-in user from `GET /users/me`.
    pub async fn refresh_profile(&self) -> ActionResponse<UserSummary> {
        let call = async {
            let user: UserSummary = self.gateway.get("/users/me").await?;
            self.storage.save_user(&user).await?;
            Ok::<_, GatewayError>(user)
        };

        self.run(Domain::Auth, call, |user| {
            let mut events = coordination::profile_updated(user.clone());
            events.push(Event::settled(Domain::Auth));
            events
        })
        .await
    }
}
