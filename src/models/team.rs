//! Team model.

use serde::{Deserialize, Serialize};

use super::{de_null_default, TeamId, UserId, UserSummary};

/// A team of users. The owner is always a member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Team {
    pub id: TeamId,
    #[serde(default, alias = "nom", deserialize_with = "de_null_default")]
    pub name: String,
    #[serde(default, alias = "proprietaire", skip_serializing_if = "Option::is_none")]
    pub owner: Option<UserSummary>,
    #[serde(default, alias = "membres")]
    pub members: Vec<UserSummary>,
}

impl Team {
    /// Client-side gate for member management. The server re-checks.
    pub fn is_owner(&self, user_id: UserId) -> bool {
        self.owner.as_ref().is_some_and(|o| o.id == user_id)
    }

    /// Return the team with its owner guaranteed to appear in `members`.
    pub fn with_owner_as_member(mut self) -> Self {
        if let Some(owner) = &self.owner {
            if !self.members.iter().any(|m| m.id == owner.id) {
                self.members.insert(0, owner.clone());
            }
        }
        self
    }
}

/// Request body for `POST /teams`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTeamRequest {
    pub nom: String,
    pub member_ids: Vec<UserId>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: UserId) -> UserSummary {
        UserSummary {
            id,
            email: format!("u{}@example.com", id),
            username: format!("u{}", id),
            first_name: String::new(),
            last_name: String::new(),
            avatar_url: None,
        }
    }

    #[test]
    fn test_owner_is_inserted_as_member() {
        let team = Team {
            id: 1,
            name: "Terrain".to_string(),
            owner: Some(user(5)),
            members: vec![user(6)],
        }
        .with_owner_as_member();

        assert_eq!(team.members.len(), 2);
        assert_eq!(team.members[0].id, 5);
        assert!(team.is_owner(5));
        assert!(!team.is_owner(6));
    }

    #[test]
    fn test_owner_not_duplicated() {
        let team = Team {
            id: 1,
            name: "Terrain".to_string(),
            owner: Some(user(5)),
            members: vec![user(5)],
        }
        .with_owner_as_member();
        assert_eq!(team.members.len(), 1);
    }

    #[test]
    fn test_create_body_wire_names() {
        let body = CreateTeamRequest {
            nom: "Terrain".to_string(),
            member_ids: vec![2, 3],
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            serde_json::json!({ "nom": "Terrain", "memberIds": [2, 3] })
        );
    }
}
