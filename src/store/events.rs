//! Typed state-change events, partitioned by domain.
//!
//! Each slice of the state tree is reduced only by its own domain's enum, so
//! a cross-domain write cannot be expressed by a single event.

use serde::{Deserialize, Serialize};

use crate::models::{
    HelpRequest, Project, ProjectId, Task, TaskId, TaskStatus, Team, TeamId, Tokens, UserId,
    UserSummary,
};

/// The partitions of the state tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    Auth,
    Team,
    Project,
    Task,
    User,
    Help,
}

/// An event dispatched to the store, serialized as `{type, payload}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum Event {
    Auth(AuthEvent),
    Team(TeamEvent),
    Project(ProjectEvent),
    Task(TaskEvent),
    User(UserEvent),
    Help(HelpEvent),
}

impl Event {
    pub fn domain(&self) -> Domain {
        match self {
            Event::Auth(_) => Domain::Auth,
            Event::Team(_) => Domain::Team,
            Event::Project(_) => Domain::Project,
            Event::Task(_) => Domain::Task,
            Event::User(_) => Domain::User,
            Event::Help(_) => Domain::Help,
        }
    }

    /// Loading-start event for a domain.
    pub fn started(domain: Domain) -> Self {
        match domain {
            Domain::Auth => Event::Auth(AuthEvent::Started),
            Domain::Team => Event::Team(TeamEvent::Started),
            Domain::Project => Event::Project(ProjectEvent::Started),
            Domain::Task => Event::Task(TaskEvent::Started),
            Domain::User => Event::User(UserEvent::Started),
            Domain::Help => Event::Help(HelpEvent::Started),
        }
    }

    /// Terminal failure event for a domain.
    pub fn failed(domain: Domain, message: impl Into<String>) -> Self {
        let message = message.into();
        match domain {
            Domain::Auth => Event::Auth(AuthEvent::Failed { message }),
            Domain::Team => Event::Team(TeamEvent::Failed { message }),
            Domain::Project => Event::Project(ProjectEvent::Failed { message }),
            Domain::Task => Event::Task(TaskEvent::Failed { message }),
            Domain::User => Event::User(UserEvent::Failed { message }),
            Domain::Help => Event::Help(HelpEvent::Failed { message }),
        }
    }

    /// Terminal event that only clears the loading flag.
    pub fn settled(domain: Domain) -> Self {
        match domain {
            Domain::Auth => Event::Auth(AuthEvent::Settled),
            Domain::Team => Event::Team(TeamEvent::Settled),
            Domain::Project => Event::Project(ProjectEvent::Settled),
            Domain::Task => Event::Task(TaskEvent::Settled),
            Domain::User => Event::User(UserEvent::Settled),
            Domain::Help => Event::Help(HelpEvent::Settled),
        }
    }

    /// Reset of a domain's slice to its initial state.
    pub fn cleared(domain: Domain) -> Self {
        match domain {
            Domain::Auth => Event::Auth(AuthEvent::LoggedOut),
            Domain::Team => Event::Team(TeamEvent::Cleared),
            Domain::Project => Event::Project(ProjectEvent::Cleared),
            Domain::Task => Event::Task(TaskEvent::Cleared),
            Domain::User => Event::User(UserEvent::Cleared),
            Domain::Help => Event::Help(HelpEvent::Cleared),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuthEvent {
    Started,
    Failed { message: String },
    Settled,
    LoggedIn { user: UserSummary, tokens: Tokens },
    /// Session rebuilt from persistent storage at startup.
    Restored { user: Option<UserSummary>, tokens: Tokens },
    UserRefreshed { user: UserSummary },
    /// The gateway refreshed the token pair.
    TokensRotated { tokens: Tokens },
    LoggedOut,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TeamEvent {
    Started,
    Failed { message: String },
    Settled,
    TeamsLoaded { teams: Vec<Team> },
    TeamCreated { team: Team },
    MembersLoaded { team_id: TeamId, members: Vec<UserSummary> },
    MemberRemoved { team_id: TeamId, user_id: UserId },
    Cleared,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProjectEvent {
    Started,
    Failed { message: String },
    Settled,
    ProjectsLoaded { team_id: TeamId, projects: Vec<Project> },
    ProjectCreated { project: Project },
    MembersLoaded { project_id: ProjectId, members: Vec<UserSummary> },
    MemberRemoved { project_id: ProjectId, user_id: UserId },
    Cleared,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TaskEvent {
    Started,
    Failed { message: String },
    Settled,
    TasksLoaded { project_id: ProjectId, tasks: Vec<Task> },
    /// Server-confirmed create or update.
    TaskSaved { task: Task },
    TaskDeleted { task_id: TaskId },
    /// Loading start of a status change, carrying the speculative status.
    StatusChangeStarted { task_id: TaskId, status: TaskStatus },
    /// Server rejected a status change; restore `previous`.
    StatusChangeFailed {
        task_id: TaskId,
        previous: TaskStatus,
        message: String,
    },
    /// A status change was abandoned before the server answered; restore
    /// `previous` without reporting an error.
    StatusChangeReverted { task_id: TaskId, previous: TaskStatus },
    RemoteStatusChanged { task_id: TaskId, status: TaskStatus },
    RemoteAssigned { task_id: TaskId, assignee: Option<UserId> },
    RemoteSaved { task: Task },
    RemoteDeleted { task_id: TaskId },
    Cleared,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum UserEvent {
    Started,
    Failed { message: String },
    Settled,
    ProfileLoaded { user: UserSummary },
    SearchResults { query: String, users: Vec<UserSummary> },
    Cleared,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HelpEvent {
    Started,
    Failed { message: String },
    Settled,
    PendingLoaded { project_id: ProjectId, requests: Vec<HelpRequest> },
    Requested { project_id: Option<ProjectId>, request: HelpRequest },
    /// Accepted or completed; the request leaves every pending list.
    Resolved { request: HelpRequest },
    Cleared,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_wire_shape() {
        let event = Event::Task(TaskEvent::TaskDeleted { task_id: 4 });
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "type": "task", "payload": { "type": "task_deleted", "task_id": 4 } })
        );
        let back: Event = serde_json::from_value(json).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn test_generic_constructors_stay_in_domain() {
        for domain in [
            Domain::Auth,
            Domain::Team,
            Domain::Project,
            Domain::Task,
            Domain::User,
            Domain::Help,
        ] {
            assert_eq!(Event::started(domain).domain(), domain);
            assert_eq!(Event::failed(domain, "x").domain(), domain);
            assert_eq!(Event::settled(domain).domain(), domain);
            assert_eq!(Event::cleared(domain).domain(), domain);
        }
    }
}
