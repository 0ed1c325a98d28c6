//! Data models for the TeamTask client.
//!
//! Field names follow the backend's JSON contract; French wire names are
//! accepted as aliases where the backend uses them.

mod help;
mod project;
mod task;
mod team;
mod user;

pub use help::*;
pub use project::*;
pub use task::*;
pub use team::*;
pub use user::*;

/// Identifier of a user.
pub type UserId = i64;
/// Identifier of a team.
pub type TeamId = i64;
/// Identifier of a project.
pub type ProjectId = i64;
/// Identifier of a task.
pub type TaskId = i64;
/// Identifier of a help request.
pub type HelpRequestId = i64;

/// Deserialize a user reference sent either as a bare id, as an embedded
/// user object with an `id` field, or as `null`.
pub(crate) fn de_user_ref<'de, D>(deserializer: D) -> Result<Option<UserId>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::Deserialize;

    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Number(n)) => n.as_i64(),
        Some(serde_json::Value::String(s)) => s.trim().parse().ok(),
        Some(serde_json::Value::Object(obj)) => obj.get("id").and_then(|id| id.as_i64()),
        _ => None,
    })
}

/// Deserialize a field where `null` means the type's default.
pub(crate) fn de_null_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: serde::Deserialize<'de> + Default,
{
    use serde::Deserialize;

    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Deserialize an optional field, mapping `null` and malformed values to
/// `None` instead of failing the enclosing record.
pub(crate) fn de_lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: serde::de::DeserializeOwned,
{
    use serde::Deserialize;

    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| serde_json::from_value(v).ok()))
}

/// Strict status decoding for updates that must not guess a status.
pub(crate) fn de_known_status<'de, D>(deserializer: D) -> Result<TaskStatus, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::Deserialize;

    let raw = String::deserialize(deserializer)?;
    raw.parse().map_err(serde::de::Error::custom)
}
