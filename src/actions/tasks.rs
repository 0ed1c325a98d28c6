use crate::errors::{ErrorKind, GatewayError};
use crate::models::{
    next_status, NewTask, ProjectId, StatusUpdateRequest, Task, TaskId, TaskStatus,
    UpdateTaskRequest, UserId,
};
use crate::store::{Domain, Event, TaskEvent};

use super::{ActionResponse, Actions};

impl Actions {
    pub async fn fetch_project_tasks(&self, project_id: ProjectId) -> ActionResponse<Vec<Task>> {
        let path = format!("/tasks/project/{}", project_id);
        let call = self.gateway.get::<Vec<Task>>(&path);

        self.run(Domain::Task, call, |tasks| {
            vec![Event::Task(TaskEvent::TasksLoaded {
                project_id,
                tasks: tasks.clone(),
            })]
        })
        .await
    }

    /// Create a task, then assign it when `assigned_to_id` is set.
    ///
    /// A failed assignment does not fail the action: the task is kept
    /// unassigned and the response carries a warning.
    pub async fn create_task(&self, new_task: NewTask) -> ActionResponse<Task> {
        let call = async {
            if new_task.title.trim().is_empty() {
                return Err(GatewayError::rejected(
                    ErrorKind::Validation,
                    "A task needs a title",
                ));
            }

            let mut task: Task = self.gateway.post("/tasks", &new_task).await?;
            let mut warning = None;

            if let Some(member_id) = new_task.assigned_to_id {
                match self.put_assignment(task.id, member_id).await {
                    Ok(Some(assigned)) => task = assigned,
                    Ok(None) => task.assigned_to = Some(member_id),
                    Err(err) if err.ends_session() => return Err(err),
                    Err(err) => {
                        tracing::warn!(task_id = task.id, member_id, "Assignment failed: {}", err);
                        warning = Some(format!(
                            "The task was created but could not be assigned: {}",
                            err.message
                        ));
                    }
                }
            }

            Ok::<_, GatewayError>((task, warning))
        };

        let response = self
            .run(Domain::Task, call, |(task, _)| {
                vec![Event::Task(TaskEvent::TaskSaved { task: task.clone() })]
            })
            .await;

        match response.data {
            Some((task, Some(warning))) => ActionResponse::success(task).with_warning(warning),
            Some((task, None)) => {
                tracing::info!(task_id = task.id, project_id = task.project_id, "Task created");
                ActionResponse::success(task)
            }
            None => ActionResponse {
                success: false,
                data: None,
                error: response.error,
                warning: None,
            },
        }
    }

    pub async fn update_task(
        &self,
        task_id: TaskId,
        changes: UpdateTaskRequest,
    ) -> ActionResponse<Task> {
        let path = format!("/tasks/{}", task_id);
        let call = self.gateway.put::<Task, _>(&path, &changes);

        self.run(Domain::Task, call, |task| {
            vec![Event::Task(TaskEvent::TaskSaved { task: task.clone() })]
        })
        .await
    }

    pub async fn delete_task(&self, task_id: TaskId) -> ActionResponse<()> {
        let path = format!("/tasks/{}", task_id);
        let call = async {
            let _: serde_json::Value = self.gateway.delete(&path).await?;
            Ok::<_, GatewayError>(())
        };

        self.run(Domain::Task, call, |_| {
            vec![Event::Task(TaskEvent::TaskDeleted { task_id })]
        })
        .await
    }

    pub async fn assign_task(&self, task_id: TaskId, member_id: UserId) -> ActionResponse<Task> {
        let call = async {
            if let Some(task) = self.put_assignment(task_id, member_id).await? {
                return Ok(task);
            }
            // Bodiless answer: patch the copy we already hold.
            self.store
                .state()
                .task
                .find(task_id)
                .cloned()
                .map(|mut task| {
                    task.assigned_to = Some(member_id);
                    task
                })
                .ok_or_else(|| GatewayError::decode("assignment response carried no task"))
        };

        self.run(Domain::Task, call, |task| {
            vec![Event::Task(TaskEvent::TaskSaved { task: task.clone() })]
        })
        .await
    }

    /// Set a task's status. The new status is shown as soon as the call
    /// starts and rolled back if the server rejects it.
    ///
    /// When several changes to the same task overlap, the last one started
    /// wins: answers to older calls only clear the loading flag. A cancelled
    /// call restores the status it replaced.
    pub async fn update_task_status(
        &self,
        task_id: TaskId,
        status: TaskStatus,
    ) -> ActionResponse<Task> {
        let current = self.store.state().task.find(task_id).map(|t| t.status);
        let ticket = self.sequencer.begin(task_id, current);
        let sequencer = &self.sequencer;

        let path = format!("/tasks/{}/status", task_id);
        let body = StatusUpdateRequest { statut: status };
        let call = self.gateway.put::<Task, _>(&path, &body);

        let response = self
            .execute(
                Event::Task(TaskEvent::StatusChangeStarted { task_id, status }),
                Domain::Task,
                call,
                |task| {
                    sequencer.confirm(&ticket, task.status);
                    if sequencer.is_latest(&ticket) {
                        vec![Event::Task(TaskEvent::TaskSaved { task: task.clone() })]
                    } else {
                        tracing::debug!(task_id, "Ignoring superseded status response");
                        vec![Event::settled(Domain::Task)]
                    }
                },
                |err| {
                    if !sequencer.is_latest(&ticket) {
                        tracing::debug!(task_id, "Ignoring superseded status failure");
                        return vec![Event::settled(Domain::Task)];
                    }
                    match sequencer.rollback_target(&ticket) {
                        Some(previous) => vec![Event::Task(TaskEvent::StatusChangeFailed {
                            task_id,
                            previous,
                            message: err.message.clone(),
                        })],
                        None => vec![Event::failed(Domain::Task, err.message.clone())],
                    }
                },
                || match sequencer.rollback_target(&ticket) {
                    Some(previous) if sequencer.is_latest(&ticket) => {
                        vec![Event::Task(TaskEvent::StatusChangeReverted { task_id, previous })]
                    }
                    _ => vec![Event::settled(Domain::Task)],
                },
            )
            .await;

        self.sequencer.finish(&ticket);
        response
    }

    /// Advance a task to the next status in the cycle.
    pub async fn toggle_task_status(&self, task_id: TaskId) -> ActionResponse<Task> {
        let current = self
            .store
            .state()
            .task
            .find(task_id)
            .map(|t| t.status.as_str())
            .unwrap_or_default();

        self.update_task_status(task_id, next_status(current)).await
    }

    /// `PUT /tasks/:id/assign/:memberId`. `None` when the answer is not a task.
    async fn put_assignment(
        &self,
        task_id: TaskId,
        member_id: UserId,
    ) -> Result<Option<Task>, GatewayError> {
        let body: serde_json::Value = self
            .gateway
            .put_empty(&format!("/tasks/{}/assign/{}", task_id, member_id))
            .await?;
        Ok(serde_json::from_value(body).ok())
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::offline_actions;
    use crate::errors::ErrorKind;
    use crate::models::{NewTask, Task, TaskStatus};
    use crate::store::{Event, TaskEvent};

    fn task(status: TaskStatus) -> Task {
        Task {
            id: 11,
            title: "Collecte".to_string(),
            description: String::new(),
            due_date: None,
            status,
            assigned_to: None,
            project_id: 4,
            location: None,
        }
    }

    #[tokio::test]
    async fn test_rejected_toggle_rolls_back() {
        let (actions, _dir) = offline_actions().await;
        actions.store().dispatch(Event::Task(TaskEvent::TasksLoaded {
            project_id: 4,
            tasks: vec![task(TaskStatus::AFaire)],
        }));
        let mut feed = actions.store().dispatched();

        let response = actions.toggle_task_status(11).await;
        assert_eq!(response.error_kind(), Some(ErrorKind::Network));

        let started = feed.recv().await.unwrap();
        assert_eq!(
            &started[..],
            &[Event::Task(TaskEvent::StatusChangeStarted {
                task_id: 11,
                status: TaskStatus::EnCours,
            })]
        );

        let state = actions.store().state();
        assert_eq!(state.task.find(11).unwrap().status, TaskStatus::AFaire);
        assert!(state.task.error.is_some());
        assert!(!state.task.loading);
    }

    #[tokio::test]
    async fn test_cancelled_toggle_restores_status() {
        let (actions, _dir) = offline_actions().await;
        actions.store().dispatch(Event::Task(TaskEvent::TasksLoaded {
            project_id: 4,
            tasks: vec![task(TaskStatus::AFaire)],
        }));

        let view = actions.for_view();
        view.cancel();
        let response = view.toggle_task_status(11).await;
        assert_eq!(response.error_kind(), Some(ErrorKind::Cancelled));

        let state = actions.store().state();
        assert_eq!(state.task.find(11).unwrap().status, TaskStatus::AFaire);
        assert!(state.task.error.is_none());
        assert!(!state.task.loading);
    }

    #[tokio::test]
    async fn test_create_task_requires_title() {
        let (actions, _dir) = offline_actions().await;
        let response = actions
            .create_task(NewTask {
                title: " ".to_string(),
                description: "D".to_string(),
                due_date: "2025-06-01".to_string(),
                project_id: 4,
                location: None,
                assigned_to_id: Some(42),
            })
            .await;

        assert_eq!(response.error_kind(), Some(ErrorKind::Validation));
        assert!(response.warning.is_none());
        assert!(actions.store().state().task.find(11).is_none());
    }
}
