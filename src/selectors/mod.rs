//! Read-only views over the state tree.
//!
//! Plain functions borrow straight from the snapshot and fall back to empty
//! values for missing keys. Derived collections live on [`Selectors`], which
//! memoizes them on the identity of their input slice: an unchanged slice
//! returns the very same `Arc`.

use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::NaiveDate;

use crate::models::{
    HelpRequest, Project, ProjectId, Task, TaskId, TaskStatus, Team, TeamId, UserId, UserSummary,
};
use crate::store::{AppState, Domain, TaskState};

// ==================== SESSION ====================

pub fn access_token(state: &AppState) -> Option<&str> {
    state.auth.tokens.as_ref().map(|t| t.access.as_str())
}

pub fn is_authenticated(state: &AppState) -> bool {
    state.auth.is_authenticated && state.auth.tokens.is_some()
}

pub fn current_user(state: &AppState) -> Option<&UserSummary> {
    state.auth.user.as_ref()
}

pub fn current_user_id(state: &AppState) -> Option<UserId> {
    current_user(state).map(|u| u.id)
}

// ==================== STATUS FLAGS ====================

pub fn is_loading(state: &AppState, domain: Domain) -> bool {
    match domain {
        Domain::Auth => state.auth.loading,
        Domain::Team => state.team.loading,
        Domain::Project => state.project.loading,
        Domain::Task => state.task.loading,
        Domain::User => state.user.loading,
        Domain::Help => state.help.loading,
    }
}

pub fn error(state: &AppState, domain: Domain) -> Option<&str> {
    match domain {
        Domain::Auth => state.auth.error.as_deref(),
        Domain::Team => state.team.error.as_deref(),
        Domain::Project => state.project.error.as_deref(),
        Domain::Task => state.task.error.as_deref(),
        Domain::User => state.user.error.as_deref(),
        Domain::Help => state.help.error.as_deref(),
    }
}

// ==================== TEAMS & PROJECTS ====================

pub fn teams(state: &AppState) -> &[Team] {
    &state.team.teams
}

pub fn team(state: &AppState, team_id: TeamId) -> Option<&Team> {
    state.team.teams.iter().find(|t| t.id == team_id)
}

/// Members loaded for the team, or those embedded in the team itself.
pub fn team_members(state: &AppState, team_id: TeamId) -> &[UserSummary] {
    match state.team.members_by_team.get(&team_id) {
        Some(members) => members.as_slice(),
        None => team(state, team_id)
            .map(|t| t.members.as_slice())
            .unwrap_or(&[]),
    }
}

/// UI gate for member management.
pub fn can_manage_team(state: &AppState, team_id: TeamId) -> bool {
    match (team(state, team_id), current_user_id(state)) {
        (Some(team), Some(user_id)) => team.is_owner(user_id),
        _ => false,
    }
}

pub fn projects_for_team(state: &AppState, team_id: TeamId) -> &[Project] {
    state
        .project
        .projects_by_team
        .get(&team_id)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

pub fn project(state: &AppState, project_id: ProjectId) -> Option<&Project> {
    state
        .project
        .projects_by_team
        .values()
        .flat_map(|projects| projects.iter())
        .find(|p| p.id == project_id)
}

pub fn project_members(state: &AppState, project_id: ProjectId) -> &[UserSummary] {
    match state.project.members_by_project.get(&project_id) {
        Some(members) => members.as_slice(),
        None => project(state, project_id)
            .map(|p| p.members.as_slice())
            .unwrap_or(&[]),
    }
}

// ==================== TASKS ====================

pub fn tasks_for_project(state: &AppState, project_id: ProjectId) -> &[Task] {
    state
        .task
        .tasks_by_project
        .get(&project_id)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

pub fn task(state: &AppState, task_id: TaskId) -> Option<&Task> {
    state.task.find(task_id)
}

pub fn tasks_assigned_to(state: &AppState, user_id: UserId) -> Vec<&Task> {
    state
        .task
        .tasks_by_project
        .values()
        .flat_map(|tasks| tasks.iter())
        .filter(|t| t.assigned_to == Some(user_id))
        .collect()
}

// ==================== HELP REQUESTS ====================

pub fn pending_help(state: &AppState, project_id: ProjectId) -> &[HelpRequest] {
    state
        .help
        .pending_by_project
        .get(&project_id)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

/// The uncompleted request for a task, if any.
pub fn active_help_for_task(state: &AppState, task_id: TaskId) -> Option<&HelpRequest> {
    state
        .help
        .requests_by_task
        .get(&task_id)
        .and_then(|requests| requests.iter().find(|r| r.is_active()))
}

// ==================== USERS ====================

pub fn search_results(state: &AppState) -> &[UserSummary] {
    &state.user.search_results
}

pub fn profile(state: &AppState) -> Option<&UserSummary> {
    state.user.profile.as_ref()
}

// ==================== MEMOIZED VIEWS ====================

/// Single-entry cache keyed on the identity of the input slice.
pub struct Memo<S, O> {
    cache: Mutex<Option<(Arc<S>, Arc<O>)>>,
}

impl<S, O> Memo<S, O> {
    pub fn new() -> Self {
        Self {
            cache: Mutex::new(None),
        }
    }

    pub fn get(&self, input: &Arc<S>, compute: impl FnOnce(&S) -> O) -> Arc<O> {
        let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some((cached_input, output)) = cache.as_ref() {
            if Arc::ptr_eq(cached_input, input) {
                return Arc::clone(output);
            }
        }

        let output = Arc::new(compute(input));
        *cache = Some((Arc::clone(input), Arc::clone(&output)));
        output
    }
}

impl<S, O> Default for Memo<S, O> {
    fn default() -> Self {
        Self::new()
    }
}

/// One [`Memo`] entry per parameter value.
pub struct KeyedMemo<K, S, O> {
    cache: Mutex<HashMap<K, (Arc<S>, Arc<O>)>>,
}

impl<K: Eq + Hash + Clone, S, O> KeyedMemo<K, S, O> {
    pub fn new() -> Self {
        Self {
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn get(&self, key: &K, input: &Arc<S>, compute: impl FnOnce(&S) -> O) -> Arc<O> {
        let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some((cached_input, output)) = cache.get(key) {
            if Arc::ptr_eq(cached_input, input) {
                return Arc::clone(output);
            }
        }

        let output = Arc::new(compute(input));
        cache.insert(key.clone(), (Arc::clone(input), Arc::clone(&output)));
        output
    }
}

impl<K: Eq + Hash + Clone, S, O> Default for KeyedMemo<K, S, O> {
    fn default() -> Self {
        Self::new()
    }
}

/// Memoized derived views. Create one per consumer (e.g. per screen).
#[derive(Default)]
pub struct Selectors {
    all_tasks: Memo<TaskState, Vec<Task>>,
    valid_tasks: Memo<TaskState, Vec<Task>>,
    tasks_by_status: KeyedMemo<ProjectId, TaskState, BTreeMap<TaskStatus, Vec<Task>>>,
}

impl Selectors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every task across projects.
    pub fn all_tasks(&self, state: &AppState) -> Arc<Vec<Task>> {
        self.all_tasks.get(&state.task, |slice| {
            slice
                .tasks_by_project
                .values()
                .flat_map(|tasks| tasks.iter().cloned())
                .collect()
        })
    }

    /// Tasks that can be placed on a map: both coordinates parse as finite
    /// numbers. Excluded tasks stay in the store.
    pub fn valid_tasks(&self, state: &AppState) -> Arc<Vec<Task>> {
        self.valid_tasks.get(&state.task, |slice| {
            slice
                .tasks_by_project
                .values()
                .flat_map(|tasks| tasks.iter())
                .filter(|t| t.location.as_ref().and_then(|l| l.coordinates()).is_some())
                .cloned()
                .collect()
        })
    }

    /// A project's tasks grouped by status, for board-style rendering.
    pub fn tasks_by_status(
        &self,
        state: &AppState,
        project_id: ProjectId,
    ) -> Arc<BTreeMap<TaskStatus, Vec<Task>>> {
        self.tasks_by_status
            .get(&project_id, &state.task, |slice| {
                let mut grouped: BTreeMap<TaskStatus, Vec<Task>> = BTreeMap::new();
                for task in slice.tasks_by_project.get(&project_id).into_iter().flatten() {
                    grouped.entry(task.status).or_default().push(task.clone());
                }
                grouped
            })
    }
}

/// Open tasks past their due date. Not memoized: depends on `today`.
pub fn overdue_tasks(state: &AppState, today: NaiveDate) -> Vec<&Task> {
    state
        .task
        .tasks_by_project
        .values()
        .flat_map(|tasks| tasks.iter())
        .filter(|t| t.is_overdue(today))
        .collect()
}
