use crate::errors::{ErrorKind, GatewayError};
use crate::models::{CreateTeamRequest, Team, TeamId, UserId, UserSummary};
use crate::selectors;
use crate::store::{Domain, Event, TeamEvent};

use super::{ActionResponse, Actions};

impl Actions {
    /// Teams the signed-in user belongs to.
    pub async fn fetch_user_teams(&self) -> ActionResponse<Vec<Team>> {
        let user_id = self.current_user_id();
        let call = async {
            let user_id = user_id.ok_or_else(GatewayError::unauthenticated)?;
            self.gateway
                .get::<Vec<Team>>(&format!("/teams/user/{}", user_id))
                .await
        };

        self.run(Domain::Team, call, |teams| {
            vec![Event::Team(TeamEvent::TeamsLoaded {
                teams: teams.clone(),
            })]
        })
        .await
    }

    pub async fn create_team(&self, name: &str, member_ids: Vec<UserId>) -> ActionResponse<Team> {
        let request = CreateTeamRequest {
            nom: name.trim().to_string(),
            member_ids,
        };
        let call = async {
            if request.nom.is_empty() {
                return Err(GatewayError::rejected(
                    ErrorKind::Validation,
                    "A team needs a name",
                ));
            }
            self.gateway.post::<Team, _>("/teams", &request).await
        };

        let response = self
            .run(Domain::Team, call, |team| {
                vec![Event::Team(TeamEvent::TeamCreated { team: team.clone() })]
            })
            .await;
        if let Some(team) = &response.data {
            tracing::info!(team_id = team.id, "Team created");
        }
        response
    }

    pub async fn fetch_team_members(&self, team_id: TeamId) -> ActionResponse<Vec<UserSummary>> {
        let path = format!("/teams/{}/members", team_id);
        let call = self.gateway.get::<Vec<UserSummary>>(&path);

        self.run(Domain::Team, call, |members| {
            vec![Event::Team(TeamEvent::MembersLoaded {
                team_id,
                members: members.clone(),
            })]
        })
        .await
    }

    /// Add a user, then reload the member list the server now holds.
    pub async fn add_team_member(
        &self,
        team_id: TeamId,
        user_id: UserId,
    ) -> ActionResponse<Vec<UserSummary>> {
        let call = async {
            self.ensure_team_owner(team_id)?;
            let path = format!("/teams/{}/members", team_id);
            let _: serde_json::Value = self
                .gateway
                .post_empty(&format!("{}/{}", path, user_id))
                .await?;
            self.gateway.get::<Vec<UserSummary>>(&path).await
        };

        self.run(Domain::Team, call, |members| {
            vec![Event::Team(TeamEvent::MembersLoaded {
                team_id,
                members: members.clone(),
            })]
        })
        .await
    }

    pub async fn remove_team_member(&self, team_id: TeamId, user_id: UserId) -> ActionResponse<()> {
        let call = async {
            self.ensure_team_owner(team_id)?;
            let _: serde_json::Value = self
                .gateway
                .delete(&format!("/teams/{}/members/{}", team_id, user_id))
                .await?;
            Ok::<_, GatewayError>(())
        };

        self.run(Domain::Team, call, |_| {
            vec![Event::Team(TeamEvent::MemberRemoved { team_id, user_id })]
        })
        .await
    }

    /// Reject member changes on a loaded team the current user does not own.
    fn ensure_team_owner(&self, team_id: TeamId) -> Result<(), GatewayError> {
        let state = self.store.state();
        let team = selectors::team(&state, team_id);
        let user_id = selectors::current_user_id(&state);

        match (team, user_id) {
            (Some(team), Some(user_id)) if team.owner.is_some() && !team.is_owner(user_id) => {
                Err(GatewayError::rejected(
                    ErrorKind::Auth,
                    "Only the team owner can manage its members",
                ))
            }
            _ => Ok(()),
        }
    }
}
