//! The state tree, one slice per domain.
//!
//! Every field defaults so a partially-initialized tree (for example one
//! deserialized from `{}`) is always valid.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::models::{
    HelpRequest, Project, ProjectId, Task, TaskId, Team, TeamId, Tokens, UserSummary,
};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppState {
    pub auth: Arc<AuthState>,
    pub team: Arc<TeamState>,
    pub project: Arc<ProjectState>,
    pub task: Arc<TaskState>,
    pub user: Arc<UserState>,
    pub help: Arc<HelpState>,
}

/// Session slice. `is_authenticated` implies `tokens.is_some()`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AuthState {
    pub is_authenticated: bool,
    pub user: Option<UserSummary>,
    pub tokens: Option<Tokens>,
    pub loading: bool,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TeamState {
    pub teams: Vec<Team>,
    pub members_by_team: BTreeMap<TeamId, Vec<UserSummary>>,
    pub loading: bool,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProjectState {
    pub projects_by_team: BTreeMap<TeamId, Vec<Project>>,
    pub members_by_project: BTreeMap<ProjectId, Vec<UserSummary>>,
    pub loading: bool,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TaskState {
    pub tasks_by_project: BTreeMap<ProjectId, Vec<Task>>,
    pub loading: bool,
    pub error: Option<String>,
}

impl TaskState {
    pub fn find(&self, task_id: TaskId) -> Option<&Task> {
        self.tasks_by_project
            .values()
            .flat_map(|tasks| tasks.iter())
            .find(|t| t.id == task_id)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UserState {
    pub profile: Option<UserSummary>,
    pub search_query: String,
    pub search_results: Vec<UserSummary>,
    pub loading: bool,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HelpState {
    pub pending_by_project: BTreeMap<ProjectId, Vec<HelpRequest>>,
    /// Every request seen for a task, pending or resolved.
    pub requests_by_task: BTreeMap<TaskId, Vec<HelpRequest>>,
    pub loading: bool,
    pub error: Option<String>,
}
