use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    #[default]
    User,
    Admin,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct User {
    #[serde(rename = "_id")]
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    #[serde(default)]
    pub role: UserRole,
    // SHA-256 of the emailed reset token, cleared once used
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reset_token_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reset_token_expires_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl User {
    pub fn new(
        first_name: &str,
        last_name: &str,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> Self {
        let now = Utc::now();
        User {
            id: Uuid::new_v4().to_string(),
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            username: username.to_string(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            role: UserRole::User,
            reset_token_hash: None,
            reset_token_expires_at: None,
            created_at: Some(now),
            updated_at: Some(now),
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn reset_token_expired(&self, now: DateTime<Utc>) -> bool {
        match self.reset_token_expires_at {
            Some(expires_at) => now > expires_at,
            None => true,
        }
    }
}

#[cfg(test)]
impl User {
    pub fn test_user(username: &str) -> Self {
        User::new(
            "Test",
            "User",
            username,
            &format!("{}@example.com", username),
            "not-a-real-hash",
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_user_creation() {
        let user = User::new("John", "Doe", "johndoe", "john@example.com", "hash");

        assert_eq!(user.username, "johndoe");
        assert_eq!(user.role, UserRole::User);
        assert_eq!(user.full_name(), "John Doe");
        assert!(user.created_at.is_some());
        assert!(Uuid::parse_str(&user.id).is_ok());
    }

    #[test]
    fn test_role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&UserRole::Admin).unwrap(), "\"admin\"");
    }

    #[test]
    fn test_reset_token_expiry() {
        let mut user = User::test_user("jane");
        let now = Utc::now();
        assert!(user.reset_token_expired(now));

        user.reset_token_expires_at = Some(now + Duration::minutes(30));
        assert!(!user.reset_token_expired(now));
        assert!(user.reset_token_expired(now + Duration::hours(1)));
    }
}
