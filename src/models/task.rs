//! Task model and the status cycle.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize};

use super::{de_lenient, de_null_default, de_user_ref, ProjectId, TaskId, UserId};

/// Lifecycle status of a task, using the backend's wire names.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    AFaire,
    EnCours,
    Terminee,
    Annulee,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::AFaire => "a_faire",
            TaskStatus::EnCours => "en_cours",
            TaskStatus::Terminee => "terminee",
            TaskStatus::Annulee => "annulee",
        }
    }

    /// Successor in the fixed cycle `a_faire → en_cours → terminee → annulee → a_faire`.
    pub fn next(self) -> Self {
        match self {
            TaskStatus::AFaire => TaskStatus::EnCours,
            TaskStatus::EnCours => TaskStatus::Terminee,
            TaskStatus::Terminee => TaskStatus::Annulee,
            TaskStatus::Annulee => TaskStatus::AFaire,
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unrecognized status string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownStatus(pub String);

impl fmt::Display for UnknownStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown task status '{}'", self.0)
    }
}

impl std::error::Error for UnknownStatus {}

impl FromStr for TaskStatus {
    type Err = UnknownStatus;

    /// Case-insensitive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "a_faire" => Ok(TaskStatus::AFaire),
            "en_cours" => Ok(TaskStatus::EnCours),
            "terminee" => Ok(TaskStatus::Terminee),
            "annulee" => Ok(TaskStatus::Annulee),
            _ => Err(UnknownStatus(s.to_string())),
        }
    }
}

/// Lenient: `null`, non-string or unknown values decode as `a_faire`, the
/// same fallback as [`next_status`].
impl<'de> Deserialize<'de> for TaskStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
        Ok(raw
            .as_ref()
            .and_then(|v| v.as_str())
            .and_then(|s| s.parse().ok())
            .unwrap_or_default())
    }
}

/// Next status for a toggle, given the raw current value.
///
/// Unrecognized or empty input yields `a_faire`.
pub fn next_status(current: &str) -> TaskStatus {
    match current.parse::<TaskStatus>() {
        Ok(status) => status.next(),
        Err(_) => TaskStatus::AFaire,
    }
}

/// A coordinate as sent by the backend: either a JSON number or a numeric string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Coordinate {
    Number(f64),
    Text(String),
}

impl Coordinate {
    /// The coordinate as a finite number, if it is one.
    pub fn as_finite(&self) -> Option<f64> {
        let value = match self {
            Coordinate::Number(n) => *n,
            Coordinate::Text(s) => s.trim().parse::<f64>().ok()?,
        };
        value.is_finite().then_some(value)
    }
}

impl From<f64> for Coordinate {
    fn from(value: f64) -> Self {
        Coordinate::Number(value)
    }
}

impl From<&str> for Coordinate {
    fn from(value: &str) -> Self {
        Coordinate::Text(value.to_string())
    }
}

/// Geographic location of a task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    #[serde(default, alias = "lat", deserialize_with = "de_lenient")]
    pub latitude: Option<Coordinate>,
    #[serde(default, alias = "lng", alias = "lon", deserialize_with = "de_lenient")]
    pub longitude: Option<Coordinate>,
}

impl Location {
    pub fn new(latitude: impl Into<Coordinate>, longitude: impl Into<Coordinate>) -> Self {
        Self {
            latitude: Some(latitude.into()),
            longitude: Some(longitude.into()),
        }
    }

    /// `(latitude, longitude)` when both parse as finite numbers.
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        Some((
            self.latitude.as_ref()?.as_finite()?,
            self.longitude.as_ref()?.as_finite()?,
        ))
    }
}

/// A task inside a project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    #[serde(default, alias = "titre", deserialize_with = "de_null_default")]
    pub title: String,
    #[serde(default, deserialize_with = "de_null_default")]
    pub description: String,
    #[serde(default, alias = "dateEcheance")]
    pub due_date: Option<String>,
    #[serde(default, alias = "statut")]
    pub status: TaskStatus,
    #[serde(
        default,
        alias = "assignedToId",
        deserialize_with = "de_user_ref"
    )]
    pub assigned_to: Option<UserId>,
    #[serde(alias = "projetId")]
    pub project_id: ProjectId,
    #[serde(default, deserialize_with = "de_lenient")]
    pub location: Option<Location>,
}

impl Task {
    /// Due date as a calendar date. Accepts `YYYY-MM-DD` and RFC 3339 timestamps.
    pub fn due_date(&self) -> Option<NaiveDate> {
        let raw = self.due_date.as_deref()?.trim();
        NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .ok()
            .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()))
    }

    pub fn is_unassigned(&self) -> bool {
        self.assigned_to.is_none()
    }

    /// Open task whose due date is before `today`.
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        matches!(self.status, TaskStatus::AFaire | TaskStatus::EnCours)
            && self.due_date().is_some_and(|due| due < today)
    }
}

/// Parameters for creating a task. `assigned_to_id` is applied by a second
/// call after creation and is not part of the create body.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTask {
    pub title: String,
    pub description: String,
    pub due_date: String,
    pub project_id: ProjectId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    #[serde(skip)]
    pub assigned_to_id: Option<UserId>,
}

/// Request body for `PUT /tasks/:id`. Only present fields are sent.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
}

/// Request body for `PUT /tasks/:id/status`.
#[derive(Debug, Clone, Serialize)]
pub struct StatusUpdateRequest {
    pub statut: TaskStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_status_cycle() {
        assert_eq!(next_status("a_faire"), TaskStatus::EnCours);
        assert_eq!(next_status("en_cours"), TaskStatus::Terminee);
        assert_eq!(next_status("terminee"), TaskStatus::Annulee);
        assert_eq!(next_status("annulee"), TaskStatus::AFaire);
    }

    #[test]
    fn test_next_status_is_case_insensitive() {
        assert_eq!(next_status("A_FAIRE"), TaskStatus::EnCours);
        assert_eq!(next_status("En_Cours"), TaskStatus::Terminee);
        assert_eq!(next_status(" TERMINEE "), TaskStatus::Annulee);
        assert_eq!(next_status("AnNuLeE"), TaskStatus::AFaire);
    }

    #[test]
    fn test_next_status_unknown_defaults_to_a_faire() {
        assert_eq!(next_status(""), TaskStatus::AFaire);
        assert_eq!(next_status("done"), TaskStatus::AFaire);
        assert_eq!(next_status("en cours"), TaskStatus::AFaire);
    }

    #[test]
    fn test_every_status_round_trips_through_next() {
        for status in [
            TaskStatus::AFaire,
            TaskStatus::EnCours,
            TaskStatus::Terminee,
            TaskStatus::Annulee,
        ] {
            assert_eq!(next_status(status.as_str()), status.next());
            assert_eq!(status.next().next().next().next(), status);
        }
    }

    #[test]
    fn test_task_deserializes_backend_shape() {
        let task: Task = serde_json::from_str(
            r#"{"id":1,"titre":"Relevé","statut":"EN_COURS","assignedTo":{"id":42,"username":"k"},
                "projetId":3,"location":{"lat":"33.5","lng":-7.5}}"#,
        )
        .unwrap();
        assert_eq!(task.title, "Relevé");
        assert_eq!(task.status, TaskStatus::EnCours);
        assert_eq!(task.assigned_to, Some(42));
        assert_eq!(task.project_id, 3);
        assert_eq!(task.location.unwrap().coordinates(), Some((33.5, -7.5)));
    }

    #[test]
    fn test_unassigned_task() {
        let task: Task =
            serde_json::from_str(r#"{"id":1,"title":"T","assignedTo":null,"projectId":3}"#).unwrap();
        assert!(task.is_unassigned());
        assert_eq!(task.status, TaskStatus::AFaire);
    }

    #[test]
    fn test_coordinates_must_be_finite() {
        assert!(Location::new("NaN", "1").coordinates().is_none());
        assert!(Location::new("inf", 2.0).coordinates().is_none());
        assert!(Location::new("north", 2.0).coordinates().is_none());
        assert_eq!(Location::new(" 33.5 ", 2.0).coordinates(), Some((33.5, 2.0)));
    }

    #[test]
    fn test_null_fields_fall_back_to_defaults() {
        let task: Task = serde_json::from_str(
            r#"{"id":1,"titre":null,"description":null,"statut":null,"projetId":3}"#,
        )
        .unwrap();
        assert_eq!(task.title, "");
        assert_eq!(task.description, "");
        assert_eq!(task.status, TaskStatus::AFaire);
    }

    #[test]
    fn test_unknown_status_decodes_as_a_faire() {
        let task: Task =
            serde_json::from_str(r#"{"id":1,"title":"T","statut":"bloquee","projectId":3}"#)
                .unwrap();
        assert_eq!(task.status, TaskStatus::AFaire);

        let task: Task =
            serde_json::from_str(r#"{"id":1,"title":"T","statut":7,"projectId":3}"#).unwrap();
        assert_eq!(task.status, TaskStatus::AFaire);
    }

    #[test]
    fn test_bad_location_keeps_the_task() {
        let tasks: Vec<Task> = serde_json::from_str(
            r#"[
                {"id":1,"title":"a","projectId":3,"location":{"latitude":null,"longitude":null}},
                {"id":2,"title":"b","projectId":3,"location":{"lat":true,"lng":"-7.5"}},
                {"id":3,"title":"c","projectId":3,"location":"Casablanca"},
                {"id":4,"title":"d","projectId":3,"location":{"lat":"33.5","lng":-7.5}}
            ]"#,
        )
        .unwrap();

        assert_eq!(tasks.len(), 4);
        assert!(tasks[0].location.as_ref().unwrap().coordinates().is_none());
        assert!(tasks[1].location.as_ref().unwrap().coordinates().is_none());
        assert!(tasks[2].location.is_none());
        assert_eq!(
            tasks[3].location.as_ref().unwrap().coordinates(),
            Some((33.5, -7.5))
        );
    }

    #[test]
    fn test_due_date_parsing_and_overdue() {
        let mut task: Task =
            serde_json::from_str(r#"{"id":1,"title":"T","dueDate":"2025-06-01","projectId":3}"#)
                .unwrap();
        let june_2 = NaiveDate::from_ymd_opt(2025, 6, 2).unwrap();
        assert_eq!(task.due_date(), NaiveDate::from_ymd_opt(2025, 6, 1));
        assert!(task.is_overdue(june_2));

        task.status = TaskStatus::Terminee;
        assert!(!task.is_overdue(june_2));

        task.due_date = Some("2025-06-01T10:00:00.000Z".to_string());
        assert_eq!(task.due_date(), NaiveDate::from_ymd_opt(2025, 6, 1));
    }

    #[test]
    fn test_new_task_body_omits_assignee() {
        let body = NewTask {
            title: "T".to_string(),
            description: "D".to_string(),
            due_date: "2025-06-01".to_string(),
            project_id: 3,
            location: None,
            assigned_to_id: Some(42),
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            serde_json::json!({
                "title": "T",
                "description": "D",
                "dueDate": "2025-06-01",
                "projectId": 3
            })
        );
    }

    #[test]
    fn test_status_body_wire_name() {
        let body = StatusUpdateRequest {
            statut: TaskStatus::EnCours,
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            serde_json::json!({ "statut": "en_cours" })
        );
    }
}
