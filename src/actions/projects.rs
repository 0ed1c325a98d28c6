use crate::errors::{ErrorKind, GatewayError};
use crate::models::{CreateProjectRequest, Project, ProjectId, TeamId, UserId, UserSummary};
use crate::store::{Domain, Event, ProjectEvent};

use super::{ActionResponse, Actions};

impl Actions {
    pub async fn fetch_team_projects(&self, team_id: TeamId) -> ActionResponse<Vec<Project>> {
        let path = format!("/projets/team/{}", team_id);
        let call = self.gateway.get::<Vec<Project>>(&path);

        self.run(Domain::Project, call, |projects| {
            vec![Event::Project(ProjectEvent::ProjectsLoaded {
                team_id,
                projects: projects.clone(),
            })]
        })
        .await
    }

    pub async fn create_project(&self, request: CreateProjectRequest) -> ActionResponse<Project> {
        let call = async {
            if request.nom.trim().is_empty() {
                return Err(GatewayError::rejected(
                    ErrorKind::Validation,
                    "A project needs a name",
                ));
            }
            self.gateway.post::<Project, _>("/projets", &request).await
        };

        let response = self
            .run(Domain::Project, call, |project| {
                vec![Event::Project(ProjectEvent::ProjectCreated {
                    project: project.clone(),
                })]
            })
            .await;
        if let Some(project) = &response.data {
            tracing::info!(project_id = project.id, team_id = project.team_id, "Project created");
        }
        response
    }

    pub async fn fetch_project_members(
        &self,
        project_id: ProjectId,
    ) -> ActionResponse<Vec<UserSummary>> {
        let path = format!("/projets/{}/members", project_id);
        let call = self.gateway.get::<Vec<UserSummary>>(&path);

        self.run(Domain::Project, call, |members| {
            vec![Event::Project(ProjectEvent::MembersLoaded {
                project_id,
                members: members.clone(),
            })]
        })
        .await
    }

    /// Add a user, then reload the member list.
    pub async fn add_project_member(
        &self,
        project_id: ProjectId,
        user_id: UserId,
    ) -> ActionResponse<Vec<UserSummary>> {
        let path = format!("/projets/{}/members", project_id);
        let call = async {
            let _: serde_json::Value = self
                .gateway
                .post_empty(&format!("{}/{}", path, user_id))
                .await?;
            self.gateway.get::<Vec<UserSummary>>(&path).await
        };

        self.run(Domain::Project, call, |members| {
            vec![Event::Project(ProjectEvent::MembersLoaded {
                project_id,
                members: members.clone(),
            })]
        })
        .await
    }

    pub async fn remove_project_member(
        &self,
        project_id: ProjectId,
        user_id: UserId,
    ) -> ActionResponse<()> {
        let path = format!("/projets/{}/members/{}", project_id, user_id);
        let call = async {
            let _: serde_json::Value = self.gateway.delete(&path).await?;
            Ok::<_, GatewayError>(())
        };

        self.run(Domain::Project, call, |_| {
            vec![Event::Project(ProjectEvent::MemberRemoved {
                project_id,
                user_id,
            })]
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::offline_actions;
    use crate::errors::ErrorKind;
    use crate::models::CreateProjectRequest;

    #[tokio::test]
    async fn test_blank_project_name_is_rejected() {
        let (actions, _dir) = offline_actions().await;
        let response = actions
            .create_project(CreateProjectRequest {
                nom: " ".to_string(),
                description: String::new(),
                team_id: 5,
            })
            .await;

        assert_eq!(response.error_kind(), Some(ErrorKind::Validation));
        let state = actions.store().state();
        assert!(!state.project.loading);
        assert_eq!(state.project.error.as_deref(), Some("A project needs a name"));
    }

    #[tokio::test]
    async fn test_unreachable_backend_leaves_projects_untouched() {
        let (actions, _dir) = offline_actions().await;
        let response = actions.fetch_team_projects(5).await;

        assert_eq!(response.error_kind(), Some(ErrorKind::Network));
        let state = actions.store().state();
        assert!(state.project.projects_by_team.is_empty());
        // Network failures never end the session.
        assert!(state.auth.error.is_none());
    }
}
