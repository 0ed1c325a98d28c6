use std::collections::BTreeMap;

use crate::models::{ProjectId, Task, TaskId};
use crate::store::events::TaskEvent;
use crate::store::state::TaskState;

pub fn reduce(state: &TaskState, event: &TaskEvent) -> TaskState {
    match event {
        TaskEvent::Started => TaskState {
            loading: true,
            error: None,
            ..state.clone()
        },
        TaskEvent::Failed { message } => TaskState {
            loading: false,
            error: Some(message.clone()),
            ..state.clone()
        },
        TaskEvent::Settled => TaskState {
            loading: false,
            ..state.clone()
        },
        TaskEvent::TasksLoaded { project_id, tasks } => {
            let mut next = settled(state);
            next.tasks_by_project.insert(*project_id, tasks.clone());
            next
        }
        TaskEvent::TaskSaved { task } => {
            let mut next = settled(state);
            upsert_task(&mut next.tasks_by_project, task.clone());
            next
        }
        TaskEvent::TaskDeleted { task_id } => {
            let mut next = settled(state);
            remove_task(&mut next.tasks_by_project, *task_id);
            next
        }
        TaskEvent::StatusChangeStarted { task_id, status } => {
            let mut next = TaskState {
                loading: true,
                error: None,
                ..state.clone()
            };
            patch(&mut next.tasks_by_project, *task_id, |t| t.status = *status);
            next
        }
        TaskEvent::StatusChangeFailed {
            task_id,
            previous,
            message,
        } => {
            let mut next = TaskState {
                loading: false,
                error: Some(message.clone()),
                ..state.clone()
            };
            patch(&mut next.tasks_by_project, *task_id, |t| t.status = *previous);
            next
        }
        TaskEvent::StatusChangeReverted { task_id, previous } => {
            let mut next = TaskState {
                loading: false,
                ..state.clone()
            };
            patch(&mut next.tasks_by_project, *task_id, |t| t.status = *previous);
            next
        }
        TaskEvent::RemoteStatusChanged { task_id, status } => {
            let mut next = state.clone();
            patch(&mut next.tasks_by_project, *task_id, |t| t.status = *status);
            next
        }
        TaskEvent::RemoteAssigned { task_id, assignee } => {
            let mut next = state.clone();
            patch(&mut next.tasks_by_project, *task_id, |t| {
                t.assigned_to = *assignee
            });
            next
        }
        TaskEvent::RemoteSaved { task } => {
            let mut next = state.clone();
            upsert_task(&mut next.tasks_by_project, task.clone());
            next
        }
        TaskEvent::RemoteDeleted { task_id } => {
            let mut next = state.clone();
            remove_task(&mut next.tasks_by_project, *task_id);
            next
        }
        TaskEvent::Cleared => TaskState::default(),
    }
}

fn settled(state: &TaskState) -> TaskState {
    TaskState {
        loading: false,
        error: None,
        ..state.clone()
    }
}

fn patch(
    tasks_by_project: &mut BTreeMap<ProjectId, Vec<Task>>,
    task_id: TaskId,
    apply: impl FnOnce(&mut Task),
) {
    if let Some(task) = tasks_by_project
        .values_mut()
        .flat_map(|tasks| tasks.iter_mut())
        .find(|t| t.id == task_id)
    {
        apply(task);
    }
}

/// Replace in place when the task stays in its project, move it otherwise.
fn upsert_task(tasks_by_project: &mut BTreeMap<ProjectId, Vec<Task>>, task: Task) {
    if let Some(slot) = tasks_by_project
        .get_mut(&task.project_id)
        .and_then(|tasks| tasks.iter_mut().find(|t| t.id == task.id))
    {
        *slot = task;
        return;
    }

    remove_task(tasks_by_project, task.id);
    tasks_by_project
        .entry(task.project_id)
        .or_default()
        .push(task);
}

fn remove_task(tasks_by_project: &mut BTreeMap<ProjectId, Vec<Task>>, task_id: TaskId) {
    for tasks in tasks_by_project.values_mut() {
        tasks.retain(|t| t.id != task_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TaskStatus;

    fn task(id: TaskId, project_id: ProjectId) -> Task {
        Task {
            id,
            title: format!("Task {}", id),
            description: String::new(),
            due_date: None,
            status: TaskStatus::AFaire,
            assigned_to: None,
            project_id,
            location: None,
        }
    }

    #[test]
    fn test_saving_twice_is_idempotent() {
        let event = TaskEvent::TaskSaved { task: task(1, 5) };
        let once = reduce(&TaskState::default(), &event);
        let twice = reduce(&once, &event);
        assert_eq!(once, twice);
        assert_eq!(once.tasks_by_project[&5].len(), 1);
    }

    #[test]
    fn test_task_moving_projects_leaves_old_list() {
        let state = reduce(
            &TaskState::default(),
            &TaskEvent::TasksLoaded {
                project_id: 5,
                tasks: vec![task(1, 5), task(2, 5)],
            },
        );
        let state = reduce(&state, &TaskEvent::TaskSaved { task: task(1, 6) });
        assert_eq!(state.tasks_by_project[&5].len(), 1);
        assert_eq!(state.tasks_by_project[&6][0].id, 1);
    }

    #[test]
    fn test_speculative_status_and_rollback() {
        let state = reduce(
            &TaskState::default(),
            &TaskEvent::TasksLoaded {
                project_id: 5,
                tasks: vec![task(1, 5)],
            },
        );
        let state = reduce(
            &state,
            &TaskEvent::StatusChangeStarted {
                task_id: 1,
                status: TaskStatus::EnCours,
            },
        );
        assert!(state.loading);
        assert_eq!(state.find(1).unwrap().status, TaskStatus::EnCours);

        let state = reduce(
            &state,
            &TaskEvent::StatusChangeFailed {
                task_id: 1,
                previous: TaskStatus::AFaire,
                message: "Transition refusée".to_string(),
            },
        );
        assert!(!state.loading);
        assert_eq!(state.find(1).unwrap().status, TaskStatus::AFaire);
        assert_eq!(state.error.as_deref(), Some("Transition refusée"));
    }

    #[test]
    fn test_reverted_status_change_leaves_no_error() {
        let state = reduce(
            &TaskState::default(),
            &TaskEvent::TasksLoaded {
                project_id: 5,
                tasks: vec![task(1, 5)],
            },
        );
        let state = reduce(
            &state,
            &TaskEvent::StatusChangeStarted {
                task_id: 1,
                status: TaskStatus::EnCours,
            },
        );
        let state = reduce(
            &state,
            &TaskEvent::StatusChangeReverted {
                task_id: 1,
                previous: TaskStatus::AFaire,
            },
        );

        assert!(!state.loading);
        assert!(state.error.is_none());
        assert_eq!(state.find(1).unwrap().status, TaskStatus::AFaire);
    }

    #[test]
    fn test_remote_events_patch_without_touching_loading() {
        let state = reduce(
            &TaskState::default(),
            &TaskEvent::TasksLoaded {
                project_id: 5,
                tasks: vec![task(1, 5)],
            },
        );
        let state = reduce(&state, &TaskEvent::Started);
        let state = reduce(
            &state,
            &TaskEvent::RemoteAssigned {
                task_id: 1,
                assignee: Some(42),
            },
        );
        assert!(state.loading);
        assert_eq!(state.find(1).unwrap().assigned_to, Some(42));

        let state = reduce(&state, &TaskEvent::RemoteDeleted { task_id: 1 });
        assert!(state.find(1).is_none());
    }

    #[test]
    fn test_remote_patch_for_unknown_task_is_noop() {
        let state = TaskState::default();
        let next = reduce(
            &state,
            &TaskEvent::RemoteStatusChanged {
                task_id: 99,
                status: TaskStatus::Terminee,
            },
        );
        assert_eq!(state, next);
    }
}
