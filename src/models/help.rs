//! Help request model.

use serde::{Deserialize, Serialize};

use super::{de_null_default, de_user_ref, HelpRequestId, TaskId, UserId, UserSummary};

/// Workflow state of a help request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HelpStatus {
    #[default]
    EnAttente,
    Acceptee,
}

/// A request from a task's assignee for help from another team member.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HelpRequest {
    pub id: HelpRequestId,
    #[serde(alias = "tacheId")]
    pub task_id: TaskId,
    pub demandeur: UserSummary,
    #[serde(default, alias = "helper", alias = "aidant", deserialize_with = "de_user_ref")]
    pub helper_id: Option<UserId>,
    #[serde(default, alias = "statut")]
    pub status: HelpStatus,
    #[serde(default)]
    pub completed: bool,
    #[serde(default, deserialize_with = "de_null_default")]
    pub description: String,
}

impl HelpRequest {
    /// Pending or accepted, and not yet completed.
    pub fn is_active(&self) -> bool {
        !self.completed
    }
}

/// Request body for `POST /aides`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateHelpRequest {
    pub description: String,
    pub task_id: TaskId,
}
