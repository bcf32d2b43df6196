use std::sync::Arc;

use crate::{
    auth::JwtService,
    cache::{RedisTokenCache, TokenCache, UnavailableTokenCache},
    config::Config,
    db::{Database, HealthCheck},
    errors::AppResult,
    repositories::{
        MongoRefreshTokenRepository, MongoUserRepository, RefreshTokenRepository, UserRepository,
    },
    services::{
        mailer::{LogMailer, PasswordResetMailer},
        token_service::TokenService,
        user_service::{UserService, UserServiceSettings},
    },
};

#[derive(Clone)]
pub struct AppState {
    pub user_service: Arc<UserService>,
    pub token_service: Arc<TokenService>,
    pub jwt_service: Arc<JwtService>,
    pub db: Arc<dyn HealthCheck>,
    pub config: Arc<Config>,
}

/// Backends an `AppState` is assembled from.
pub struct AppParts {
    pub users: Arc<dyn UserRepository>,
    pub tokens: Arc<dyn RefreshTokenRepository>,
    pub cache: Arc<dyn TokenCache>,
    pub mailer: Arc<dyn PasswordResetMailer>,
    pub db: Arc<dyn HealthCheck>,
}

impl AppState {
    pub async fn new(config: Config) -> AppResult<Self> {
        let db = Database::connect(&config).await?;

        let users = Arc::new(MongoUserRepository::new(&db, &config.users_collection));
        users.ensure_indexes().await?;

        let tokens = Arc::new(MongoRefreshTokenRepository::new(
            &db,
            &config.refresh_tokens_collection,
        ));
        tokens.ensure_indexes().await?;

        let cache: Arc<dyn TokenCache> = match RedisTokenCache::connect(&config.redis_url).await {
            Ok(cache) => Arc::new(cache),
            Err(e) => {
                log::warn!(
                    "Redis unavailable ({}); continuing without the revocation cache",
                    e
                );
                Arc::new(UnavailableTokenCache)
            }
        };

        let parts = AppParts {
            users,
            tokens,
            cache,
            mailer: Arc::new(LogMailer),
            db: Arc::new(db),
        };
        Ok(Self::from_parts(config, parts))
    }

    pub fn from_parts(config: Config, parts: AppParts) -> Self {
        let jwt_service = Arc::new(JwtService::new(
            &config.jwt_secret,
            config.jwt_access_expiration_minutes,
            config.jwt_refresh_expiration_hours,
        ));

        let token_service = Arc::new(TokenService::new(
            parts.tokens,
            parts.users.clone(),
            parts.cache,
            jwt_service.clone(),
        ));

        let user_service = Arc::new(UserService::new(
            parts.users,
            token_service.clone(),
            parts.mailer,
            UserServiceSettings::from(&config),
        ));

        Self {
            user_service,
            token_service,
            jwt_service,
            db: parts.db,
            config: Arc::new(config),
        }
    }
}
