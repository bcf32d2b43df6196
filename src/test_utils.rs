//! In-memory stand-ins for the MongoDB repositories and the Redis cache.

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, RwLock};

use crate::{
    cache::{CacheError, TokenCache},
    errors::{AppError, AppResult},
    models::domain::{RefreshToken, TokenStatus, User},
    repositories::{RefreshTokenRepository, UserRepository},
    services::mailer::PasswordResetMailer,
};

#[derive(Default)]
pub struct InMemoryRefreshTokenRepository {
    tokens: Arc<RwLock<HashMap<String, RefreshToken>>>,
}

impl InMemoryRefreshTokenRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, id: &str) -> Option<RefreshToken> {
        self.tokens.read().await.get(id).cloned()
    }

    pub async fn set_expiry(&self, id: &str, expires_at: DateTime<Utc>) {
        if let Some(token) = self.tokens.write().await.get_mut(id) {
            token.expires_at = expires_at;
        }
    }

    pub async fn count_with_status(&self, status: TokenStatus) -> usize {
        self.tokens
            .read()
            .await
            .values()
            .filter(|t| t.status == status)
            .count()
    }
}

#[async_trait]
impl RefreshTokenRepository for InMemoryRefreshTokenRepository {
    async fn create(&self, token: RefreshToken) -> AppResult<RefreshToken> {
        let mut tokens = self.tokens.write().await;
        if tokens.contains_key(&token.id) {
            return Err(AppError::AlreadyExists(format!("Token '{}' already exists", token.id)));
        }
        tokens.insert(token.id.clone(), token.clone());
        Ok(token)
    }

    async fn find_by_id(&self, id: &str) -> AppResult<Option<RefreshToken>> {
        Ok(self.get(id).await)
    }

    async fn deactivate(&self, id: &str, to: TokenStatus, replaced_by: Option<String>) -> AppResult<bool> {
        let mut tokens = self.tokens.write().await;
        match tokens.get_mut(id) {
            Some(token) if token.status == TokenStatus::Active => {
                token.status = to;
                token.replaced_by = replaced_by;
                token.deactivated_at = Some(Utc::now());
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn revoke_all_for_user(&self, user_id: &str) -> AppResult<u64> {
        let mut tokens = self.tokens.write().await;
        let mut revoked = 0;
        for token in tokens.values_mut() {
            if token.user_id == user_id && token.status == TokenStatus::Active {
                token.status = TokenStatus::Revoked;
                token.deactivated_at = Some(Utc::now());
                revoked += 1;
            }
        }
        Ok(revoked)
    }

    async fn delete_all_for_user(&self, user_id: &str) -> AppResult<Vec<String>> {
        let mut tokens = self.tokens.write().await;
        let ids: Vec<String> = tokens
            .values()
            .filter(|t| t.user_id == user_id)
            .map(|t| t.id.clone())
            .collect();
        for id in &ids {
            tokens.remove(id);
        }
        Ok(ids)
    }

    async fn ensure_indexes(&self) -> AppResult<()> {
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryUserRepository {
    users: Arc<RwLock<HashMap<String, User>>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    async fn find_where(&self, pred: impl Fn(&User) -> bool) -> Option<User> {
        self.users.read().await.values().find(|u| pred(u)).cloned()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create(&self, user: User) -> AppResult<User> {
        let mut users = self.users.write().await;
        if users
            .values()
            .any(|u| u.username == user.username || u.email == user.email)
        {
            return Err(AppError::AlreadyExists(
                "Username or email already registered".to_string(),
            ));
        }
        users.insert(user.id.clone(), user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: &str) -> AppResult<Option<User>> {
        Ok(self.users.read().await.get(id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>> {
        Ok(self.find_where(|u| u.username == username).await)
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        Ok(self.find_where(|u| u.email == email).await)
    }

    async fn find_by_reset_token_hash(&self, hash: &str) -> AppResult<Option<User>> {
        Ok(self
            .find_where(|u| u.reset_token_hash.as_deref() == Some(hash))
            .await)
    }

    async fn update(&self, user: User) -> AppResult<User> {
        let mut users = self.users.write().await;
        if !users.contains_key(&user.id) {
            return Err(AppError::NotFound(format!("User with id '{}' not found", user.id)));
        }
        users.insert(user.id.clone(), user.clone());
        Ok(user)
    }

    async fn delete(&self, id: &str) -> AppResult<()> {
        self.users
            .write()
            .await
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| AppError::NotFound(format!("User with id '{}' not found", id)))
    }

    async fn ensure_indexes(&self) -> AppResult<()> {
        Ok(())
    }
}

/// Cache fake that ignores TTLs and counts writes.
#[derive(Default)]
pub struct InMemoryTokenCache {
    entries: RwLock<HashMap<String, TokenStatus>>,
    writes: Mutex<usize>,
}

impl InMemoryTokenCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn peek(&self, token_id: &str) -> Option<TokenStatus> {
        self.entries.read().await.get(token_id).copied()
    }

    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }

    pub async fn writes(&self) -> usize {
        *self.writes.lock().await
    }
}

#[async_trait]
impl TokenCache for InMemoryTokenCache {
    async fn get(&self, token_id: &str) -> Result<Option<TokenStatus>, CacheError> {
        Ok(self.peek(token_id).await)
    }

    async fn set(&self, token_id: &str, status: TokenStatus, _ttl_seconds: u64) -> Result<(), CacheError> {
        self.entries.write().await.insert(token_id.to_string(), status);
        *self.writes.lock().await += 1;
        Ok(())
    }

    async fn delete(&self, token_id: &str) -> Result<(), CacheError> {
        self.entries.write().await.remove(token_id);
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}

/// Captures reset links instead of sending them.
#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<(String, String)>>,
}

impl RecordingMailer {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn last_link(&self) -> Option<(String, String)> {
        self.sent.lock().await.last().cloned()
    }
}

#[async_trait]
impl PasswordResetMailer for RecordingMailer {
    async fn send_reset_link(&self, email: &str, reset_url: &str) -> AppResult<()> {
        self.sent
            .lock()
            .await
            .push((email.to_string(), reset_url.to_string()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[tokio::test]
    async fn test_in_memory_deactivate_is_compare_and_set() {
        let repo = InMemoryRefreshTokenRepository::new();
        let token = RefreshToken::new(
            "12345".to_string(),
            "user-1".to_string(),
            "hash".to_string(),
            Utc::now() + Duration::days(3),
        );
        repo.create(token).await.unwrap();

        assert!(repo.deactivate("12345", TokenStatus::Rotated, Some("12346".into())).await.unwrap());
        assert!(!repo.deactivate("12345", TokenStatus::Revoked, None).await.unwrap());
        assert!(!repo.deactivate("missing", TokenStatus::Revoked, None).await.unwrap());
        assert_eq!(repo.get("12345").await.unwrap().status, TokenStatus::Rotated);
    }

    #[tokio::test]
    async fn test_in_memory_users_reject_duplicates() {
        let repo = InMemoryUserRepository::new();
        repo.create(User::test_user("alice")).await.unwrap();

        let result = repo.create(User::test_user("alice")).await;
        assert!(matches!(result, Err(AppError::AlreadyExists(_))));
    }
}
