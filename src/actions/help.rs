use crate::errors::{ErrorKind, GatewayError};
use crate::models::{CreateHelpRequest, HelpRequest, HelpRequestId, ProjectId, TaskId};
use crate::selectors;
use crate::store::{Domain, Event, HelpEvent};

use super::{ActionResponse, Actions};

impl Actions {
    /// Ask for help on a task. Only one request per task may be open.
    pub async fn request_help(
        &self,
        task_id: TaskId,
        description: &str,
    ) -> ActionResponse<HelpRequest> {
        let state = self.store.state();
        let open = selectors::active_help_for_task(&state, task_id).map(|r| r.id);
        let project_id = selectors::task(&state, task_id).map(|t| t.project_id);
        drop(state);

        let request = CreateHelpRequest {
            description: description.trim().to_string(),
            task_id,
        };
        let call = async {
            if let Some(open) = open {
                tracing::debug!(task_id, request_id = open, "Help already requested");
                return Err(GatewayError::rejected(
                    ErrorKind::Conflict,
                    "A help request is already open for this task",
                ));
            }
            self.gateway.post::<HelpRequest, _>("/aides", &request).await
        };

        self.run(Domain::Help, call, |created| {
            vec![Event::Help(HelpEvent::Requested {
                project_id,
                request: created.clone(),
            })]
        })
        .await
    }

    pub async fn fetch_pending_help(
        &self,
        project_id: ProjectId,
    ) -> ActionResponse<Vec<HelpRequest>> {
        let path = format!("/aides/project/{}/en-attente", project_id);
        let call = self.gateway.get::<Vec<HelpRequest>>(&path);

        self.run(Domain::Help, call, |requests| {
            vec![Event::Help(HelpEvent::PendingLoaded {
                project_id,
                requests: requests.clone(),
            })]
        })
        .await
    }

    /// Take on a pending request as the helper.
    pub async fn accept_help(&self, request_id: HelpRequestId) -> ActionResponse<HelpRequest> {
        self.resolve_help(request_id, "accepter").await
    }

    /// Mark an accepted request as done.
    pub async fn complete_help(&self, request_id: HelpRequestId) -> ActionResponse<HelpRequest> {
        self.resolve_help(request_id, "terminer").await
    }

    async fn resolve_help(
        &self,
        request_id: HelpRequestId,
        transition: &str,
    ) -> ActionResponse<HelpRequest> {
        let path = format!("/aides/{}/{}", request_id, transition);
        let call = self.gateway.put_empty::<HelpRequest>(&path);

        self.run(Domain::Help, call, |request| {
            vec![Event::Help(HelpEvent::Resolved {
                request: request.clone(),
            })]
        })
        .await
    }
}
