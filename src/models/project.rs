//! Project model.

use serde::{Deserialize, Serialize};

use super::{de_null_default, ProjectId, Task, TeamId, UserSummary};

/// A project. Belongs to exactly one team.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: ProjectId,
    #[serde(default, alias = "nom", deserialize_with = "de_null_default")]
    pub name: String,
    #[serde(default, deserialize_with = "de_null_default")]
    pub description: String,
    #[serde(alias = "equipeId")]
    pub team_id: TeamId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<UserSummary>,
    #[serde(default, alias = "membres")]
    pub members: Vec<UserSummary>,
    #[serde(default, alias = "taches")]
    pub tasks: Vec<Task>,
}

/// Request body for `POST /projets`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProjectRequest {
    pub nom: String,
    pub description: String,
    pub team_id: TeamId,
}
