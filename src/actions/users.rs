use crate::errors::GatewayError;
use crate::models::{UpdateProfileRequest, UserSummary};
use crate::store::{coordination, Domain, Event, UserEvent};

use super::{ActionResponse, Actions};

impl Actions {
    /// Search users by name or email. A blank query clears the results
    /// without calling the server.
    pub async fn search_users(&self, query: &str) -> ActionResponse<Vec<UserSummary>> {
        let query = query.trim().to_string();
        let call = async {
            if query.is_empty() {
                return Ok(Vec::new());
            }
            self.gateway
                .get_with_query::<Vec<UserSummary>>("/users/search", &[("q", query.as_str())])
                .await
        };

        self.run(Domain::User, call, |users| {
            vec![Event::User(UserEvent::SearchResults {
                query: query.clone(),
                users: users.clone(),
            })]
        })
        .await
    }

    /// Update the signed-in user's profile and the cached copy of it.
    pub async fn update_profile(
        &self,
        changes: UpdateProfileRequest,
    ) -> ActionResponse<UserSummary> {
        let call = async {
            let user: UserSummary = self.gateway.put("/users/profile", &changes).await?;
            self.storage.save_user(&user).await?;
            Ok::<_, GatewayError>(user)
        };

        let response = self
            .run(Domain::User, call, |user| {
                coordination::profile_updated(user.clone())
            })
            .await;
        if let Some(user) = &response.data {
            tracing::info!(user_id = user.id, "Profile updated");
        }
        response
    }
}
