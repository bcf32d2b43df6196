use std::sync::Arc;

use chrono::{Duration, Utc};
use log::info;
use rand::{distributions::Alphanumeric, thread_rng, Rng};
use validator::Validate;

use crate::{
    auth::password::{hash_password, verify_password},
    config::Config,
    errors::{AppError, AppResult},
    models::{
        domain::{hash_token, User},
        dto::request::{
            CreateUserRequest, ForgotPasswordRequest, LoginRequest, ResetPasswordRequest,
            UpdateUserRequest,
        },
    },
    repositories::UserRepository,
    services::{
        mailer::PasswordResetMailer,
        token_service::{TokenPair, TokenService},
    },
};

const RESET_TOKEN_LENGTH: usize = 64;

#[derive(Debug, Clone)]
pub struct UserServiceSettings {
    pub bcrypt_cost: u32,
    pub reset_token_ttl: Duration,
    pub public_base_url: String,
}

impl From<&Config> for UserServiceSettings {
    fn from(config: &Config) -> Self {
        Self {
            bcrypt_cost: config.bcrypt_cost,
            reset_token_ttl: Duration::minutes(config.password_reset_expiration_minutes),
            public_base_url: config.public_base_url.trim_end_matches('/').to_string(),
        }
    }
}

fn generate_reset_token() -> String {
    thread_rng()
        .sample_iter(&Alphanumeric)
        .take(RESET_TOKEN_LENGTH)
        .map(char::from)
        .collect()
}

pub struct UserService {
    repository: Arc<dyn UserRepository>,
    tokens: Arc<TokenService>,
    mailer: Arc<dyn PasswordResetMailer>,
    settings: UserServiceSettings,
}

impl UserService {
    pub fn new(
        repository: Arc<dyn UserRepository>,
        tokens: Arc<TokenService>,
        mailer: Arc<dyn PasswordResetMailer>,
        settings: UserServiceSettings,
    ) -> Self {
        Self {
            repository,
            tokens,
            mailer,
            settings,
        }
    }

    pub async fn register(&self, request: CreateUserRequest) -> AppResult<User> {
        request.validate()?;

        if self.repository.find_by_username(&request.username).await?.is_some() {
            return Err(AppError::AlreadyExists("Username already exists".to_string()));
        }
        if self.repository.find_by_email(&request.email).await?.is_some() {
            return Err(AppError::AlreadyExists("Email already registered".to_string()));
        }

        let password_hash = hash_password(&request.password, self.settings.bcrypt_cost).await?;
        let user = User::new(
            &request.first_name,
            &request.last_name,
            &request.username,
            &request.email,
            &password_hash,
        );

        let user = self.repository.create(user).await?;
        info!("Registered user {} ({})", user.username, user.id);
        Ok(user)
    }

    /// Check credentials. Unknown identity and wrong password look the same.
    pub async fn authenticate(&self, request: &LoginRequest) -> AppResult<User> {
        request.validate()?;

        let email = request.email.as_deref().map(str::trim).filter(|e| !e.is_empty());
        let user = match email {
            Some(email) => self.repository.find_by_email(email).await?,
            None => {
                let username = request.username.as_deref().unwrap_or_default();
                self.repository.find_by_username(username).await?
            }
        };

        if let Some(user) = user {
            if verify_password(&request.password, &user.password_hash).await {
                return Ok(user);
            }
        }
        Err(AppError::Forbidden("Invalid credentials".to_string()))
    }

    pub async fn login(&self, request: LoginRequest) -> AppResult<TokenPair> {
        let user = self.authenticate(&request).await?;
        self.tokens.start_session(&user).await
    }

    pub async fn get_user(&self, id: &str) -> AppResult<User> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }

    pub async fn update_user(&self, id: &str, request: UpdateUserRequest) -> AppResult<User> {
        request.validate()?;

        let mut user = self.get_user(id).await?;

        if let Some(email) = request.email {
            if email != user.email && self.repository.find_by_email(&email).await?.is_some() {
                return Err(AppError::AlreadyExists("Email already registered".to_string()));
            }
            user.email = email;
        }
        if let Some(first_name) = request.first_name {
            user.first_name = first_name;
        }
        if let Some(last_name) = request.last_name {
            user.last_name = last_name;
        }
        user.updated_at = Some(Utc::now());

        self.repository.update(user).await
    }

    /// Delete an account together with its refresh-token records.
    pub async fn delete_user(&self, id: &str) -> AppResult<()> {
        let user = self.get_user(id).await?;
        let purged = self.tokens.purge_user(&user.id).await?;
        self.repository.delete(&user.id).await?;

        info!("Deleted user {} and {} refresh tokens", user.id, purged);
        Ok(())
    }

    pub async fn forgot_password(&self, request: ForgotPasswordRequest) -> AppResult<()> {
        request.validate()?;

        let mut user = self
            .repository
            .find_by_email(&request.email)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        let reset_token = generate_reset_token();
        user.reset_token_hash = Some(hash_token(&reset_token));
        user.reset_token_expires_at = Some(Utc::now() + self.settings.reset_token_ttl);
        let user = self.repository.update(user).await?;

        let reset_url = format!(
            "{}/api/v1/reset-password/{}",
            self.settings.public_base_url, reset_token
        );
        self.mailer.send_reset_link(&user.email, &reset_url).await
    }

    /// Set a new password from a reset token, then end every session.
    pub async fn reset_password(&self, token: &str, request: ResetPasswordRequest) -> AppResult<()> {
        let mut user = self
            .repository
            .find_by_reset_token_hash(&hash_token(token))
            .await?
            .ok_or_else(|| AppError::ValidationError("Invalid or expired reset token".to_string()))?;

        if user.reset_token_expired(Utc::now()) {
            return Err(AppError::ValidationError("Token has expired".to_string()));
        }

        request.validate()?;

        user.password_hash = hash_password(&request.new_password, self.settings.bcrypt_cost).await?;
        user.reset_token_hash = None;
        user.reset_token_expires_at = None;
        user.updated_at = Some(Utc::now());
        let user = self.repository.update(user).await?;

        self.tokens.revoke_all_for_user(&user.id).await?;
        info!("Password reset for user {}", user.id);
        Ok(())
    }
}
