//! User and session models.

use serde::{Deserialize, Serialize};

use super::{de_null_default, UserId};

/// Public view of a user, as embedded in teams, projects and help requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: UserId,
    #[serde(default, deserialize_with = "de_null_default")]
    pub email: String,
    #[serde(default, deserialize_with = "de_null_default")]
    pub username: String,
    #[serde(default, alias = "prenom", deserialize_with = "de_null_default")]
    pub first_name: String,
    #[serde(default, alias = "nom", deserialize_with = "de_null_default")]
    pub last_name: String,
    #[serde(default, alias = "avatar", skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

impl UserSummary {
    /// "First Last", falling back to the username.
    pub fn display_name(&self) -> String {
        let full = format!("{} {}", self.first_name.trim(), self.last_name.trim());
        let full = full.trim();
        if full.is_empty() {
            self.username.clone()
        } else {
            full.to_string()
        }
    }
}

/// Access/refresh token pair issued by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tokens {
    pub access: String,
    pub refresh: String,
}

/// Request body for `POST /auth/login`.
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Response body of `POST /auth/login`.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub id: UserId,
    #[serde(default, deserialize_with = "de_null_default")]
    pub email: String,
    #[serde(default, deserialize_with = "de_null_default")]
    pub username: String,
    #[serde(default, deserialize_with = "de_null_default")]
    pub nom: String,
    #[serde(default, deserialize_with = "de_null_default")]
    pub prenom: String,
}

impl LoginResponse {
    /// Split the flat login payload into the token pair and the user.
    pub fn into_parts(self) -> (Tokens, UserSummary) {
        let tokens = Tokens {
            access: self.access_token,
            refresh: self.refresh_token,
        };
        let user = UserSummary {
            id: self.id,
            email: self.email,
            username: self.username,
            first_name: self.prenom,
            last_name: self.nom,
            avatar_url: None,
        };
        (tokens, user)
    }
}

/// Request body for `POST /auth/register`.
#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub username: String,
    pub nom: String,
    pub prenom: String,
}

/// Request body for `POST /auth/refresh`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Response body of `POST /auth/refresh`. The refresh token is only rotated
/// when the backend sends a new one.
#[derive(Debug, Clone, Deserialize)]
pub struct RefreshResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

/// Request body for `PUT /users/profile`. Only present fields are sent.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(rename = "prenom", skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(rename = "nom", skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_accepts_french_names() {
        let user: UserSummary = serde_json::from_str(
            r#"{"id":3,"email":"y@example.com","username":"yassine","nom":"Alaoui","prenom":"Yassine"}"#,
        )
        .unwrap();
        assert_eq!(user.first_name, "Yassine");
        assert_eq!(user.last_name, "Alaoui");
        assert_eq!(user.display_name(), "Yassine Alaoui");
    }

    #[test]
    fn test_display_name_falls_back_to_username() {
        let user: UserSummary = serde_json::from_str(r#"{"id":3,"username":"yassine"}"#).unwrap();
        assert_eq!(user.display_name(), "yassine");
    }

    #[test]
    fn test_login_response_into_parts() {
        let resp: LoginResponse = serde_json::from_str(
            r#"{"access_token":"a","refresh_token":"r","id":9,"email":"e@x.io","username":"u","nom":"N","prenom":"P"}"#,
        )
        .unwrap();
        let (tokens, user) = resp.into_parts();
        assert_eq!(tokens.access, "a");
        assert_eq!(tokens.refresh, "r");
        assert_eq!(user.id, 9);
        assert_eq!(user.first_name, "P");
        assert_eq!(user.last_name, "N");
    }

    #[test]
    fn test_null_names_decode_as_empty() {
        let user: UserSummary = serde_json::from_str(
            r#"{"id":3,"email":null,"username":"yassine","nom":null,"prenom":null}"#,
        )
        .unwrap();
        assert_eq!(user.email, "");
        assert_eq!(user.display_name(), "yassine");

        let resp: LoginResponse = serde_json::from_str(
            r#"{"access_token":"a","refresh_token":"r","id":9,"username":"u","nom":null,"prenom":null}"#,
        )
        .unwrap();
        let (_, user) = resp.into_parts();
        assert_eq!(user.first_name, "");
        assert_eq!(user.last_name, "");
    }

    #[test]
    fn test_profile_update_only_sends_present_fields() {
        let body = UpdateProfileRequest {
            first_name: Some("Nadia".to_string()),
            ..Default::default()
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json, serde_json::json!({ "prenom": "Nadia" }));
    }
}
