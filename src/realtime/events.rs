//! Push channel wire format.
//!
//! Frames are JSON text messages shaped `{"event": name, "data": {...}}` in
//! both directions.

use serde::{Deserialize, Serialize};

use crate::models::{de_known_status, de_user_ref, Task, TaskId, TaskStatus, UserId};
use crate::store::{Event, TaskEvent};

/// Server-to-client update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum PushEvent {
    #[serde(rename_all = "camelCase")]
    TaskStatusUpdated {
        #[serde(alias = "tacheId")]
        task_id: TaskId,
        #[serde(alias = "statut", deserialize_with = "de_known_status")]
        status: TaskStatus,
    },
    #[serde(rename_all = "camelCase")]
    TaskAssigned {
        #[serde(alias = "tacheId")]
        task_id: TaskId,
        #[serde(default, deserialize_with = "de_user_ref")]
        new_assignee: Option<UserId>,
    },
    TaskCreated { task: Task },
    TaskUpdated { task: Task },
    TaskDeleted { task: TaskRef },
}

/// A deleted task only needs its id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRef {
    pub id: TaskId,
}

impl PushEvent {
    pub fn task_id(&self) -> TaskId {
        match self {
            PushEvent::TaskStatusUpdated { task_id, .. } => *task_id,
            PushEvent::TaskAssigned { task_id, .. } => *task_id,
            PushEvent::TaskCreated { task } | PushEvent::TaskUpdated { task } => task.id,
            PushEvent::TaskDeleted { task } => task.id,
        }
    }

    /// The store event that applies this update.
    pub fn into_event(self) -> Event {
        let event = match self {
            PushEvent::TaskStatusUpdated { task_id, status } => {
                TaskEvent::RemoteStatusChanged { task_id, status }
            }
            PushEvent::TaskAssigned {
                task_id,
                new_assignee,
            } => TaskEvent::RemoteAssigned {
                task_id,
                assignee: new_assignee,
            },
            PushEvent::TaskCreated { task } | PushEvent::TaskUpdated { task } => {
                TaskEvent::RemoteSaved { task }
            }
            PushEvent::TaskDeleted { task } => TaskEvent::RemoteDeleted { task_id: task.id },
        };
        Event::Task(event)
    }
}

/// What a subscription listens to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Everything the server routes to this user.
    User(UserId),
    /// A single task's updates.
    Task(TaskId),
}

/// Client-to-server messages.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
enum ClientMessage {
    #[serde(rename_all = "camelCase")]
    Join {
        #[serde(skip_serializing_if = "Option::is_none")]
        user_id: Option<UserId>,
        #[serde(skip_serializing_if = "Option::is_none")]
        task_id: Option<TaskId>,
    },
}

impl Scope {
    /// Message sent right after connecting.
    pub fn join_message(&self) -> String {
        let message = match *self {
            Scope::User(user_id) => ClientMessage::Join {
                user_id: Some(user_id),
                task_id: None,
            },
            Scope::Task(task_id) => ClientMessage::Join {
                user_id: None,
                task_id: Some(task_id),
            },
        };
        // Integer-only payloads always serialize.
        serde_json::to_string(&message).unwrap_or_default()
    }

    /// Whether an update concerns this scope.
    pub fn accepts(&self, event: &PushEvent) -> bool {
        match *self {
            Scope::User(_) => true,
            Scope::Task(task_id) => event.task_id() == task_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_update_parses_backend_frame() {
        let event: PushEvent = serde_json::from_str(
            r#"{"event":"taskStatusUpdated","data":{"taskId":7,"status":"TERMINEE"}}"#,
        )
        .unwrap();
        assert_eq!(
            event,
            PushEvent::TaskStatusUpdated {
                task_id: 7,
                status: TaskStatus::Terminee
            }
        );
    }

    #[test]
    fn test_assignment_accepts_user_object_or_null() {
        let event: PushEvent = serde_json::from_str(
            r#"{"event":"taskAssigned","data":{"taskId":7,"newAssignee":{"id":42,"username":"k"}}}"#,
        )
        .unwrap();
        assert_eq!(
            event.into_event(),
            Event::Task(TaskEvent::RemoteAssigned {
                task_id: 7,
                assignee: Some(42)
            })
        );

        let event: PushEvent = serde_json::from_str(
            r#"{"event":"taskAssigned","data":{"taskId":7,"newAssignee":null}}"#,
        )
        .unwrap();
        assert!(matches!(
            event,
            PushEvent::TaskAssigned {
                new_assignee: None,
                ..
            }
        ));
    }

    #[test]
    fn test_deleted_task_needs_only_id() {
        let event: PushEvent =
            serde_json::from_str(r#"{"event":"taskDeleted","data":{"task":{"id":3}}}"#).unwrap();
        assert_eq!(event.task_id(), 3);
        assert_eq!(
            event.into_event(),
            Event::Task(TaskEvent::RemoteDeleted { task_id: 3 })
        );
    }

    #[test]
    fn test_unknown_status_frame_is_rejected() {
        assert!(serde_json::from_str::<PushEvent>(
            r#"{"event":"taskStatusUpdated","data":{"taskId":7,"status":"bloquee"}}"#
        )
        .is_err());
    }

    #[test]
    fn test_created_task_with_null_fields_parses() {
        let event: PushEvent = serde_json::from_str(
            r#"{"event":"taskCreated","data":{"task":{"id":5,"titre":"Tri","description":null,
                "statut":null,"projetId":2,"location":{"lat":null,"lng":null}}}}"#,
        )
        .unwrap();
        assert_eq!(event.task_id(), 5);
    }

    #[test]
    fn test_unknown_event_is_rejected() {
        assert!(serde_json::from_str::<PushEvent>(r#"{"event":"typing","data":{}}"#).is_err());
    }

    #[test]
    fn test_join_messages() {
        assert_eq!(
            Scope::User(5).join_message(),
            r#"{"event":"join","data":{"userId":5}}"#
        );
        assert_eq!(
            Scope::Task(9).join_message(),
            r#"{"event":"join","data":{"taskId":9}}"#
        );
    }

    #[test]
    fn test_task_scope_filters_by_id() {
        let event = PushEvent::TaskStatusUpdated {
            task_id: 9,
            status: TaskStatus::EnCours,
        };
        assert!(Scope::Task(9).accepts(&event));
        assert!(!Scope::Task(10).accepts(&event));
        assert!(Scope::User(1).accepts(&event));
    }
}
