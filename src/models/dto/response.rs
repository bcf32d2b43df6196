use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::domain::{User, UserRole};
use crate::services::token_service::TokenPair;

#[derive(Debug, Clone, Serialize)]
pub struct UserDto {
    pub id: String,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub full_name: String,
    pub role: UserRole,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl From<User> for UserDto {
    fn from(user: User) -> Self {
        UserDto {
            full_name: user.full_name(),
            id: user.id,
            username: user.username,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            role: user.role,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub message: String,
    pub user: UserDto,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Shape shared by `/login` and `/refresh-token`.
#[derive(Debug, Serialize)]
pub struct TokenPairResponse {
    pub message: String,
    pub access_token: String,
    pub refresh_token: String,
    pub token_id: String,
}

impl TokenPairResponse {
    pub fn new(message: &str, pair: TokenPair) -> Self {
        Self {
            message: message.to_string(),
            access_token: pair.access_token,
            refresh_token: pair.refresh_token,
            token_id: pair.token_id,
        }
    }
}
