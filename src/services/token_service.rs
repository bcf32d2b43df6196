use std::sync::Arc;

use chrono::{DateTime, Utc};
use log::{debug, info, warn};

use crate::{
    auth::{IssuedTokens, JwtService, RefreshClaims},
    cache::TokenCache,
    errors::{AppError, AppResult, TokenError},
    models::domain::{hash_token, RefreshToken, TokenStatus, User},
    repositories::{RefreshTokenRepository, UserRepository},
};

#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub token_id: String,
    pub expires_at: DateTime<Utc>,
}

impl From<IssuedTokens> for TokenPair {
    fn from(issued: IssuedTokens) -> Self {
        Self {
            access_token: issued.access_token,
            refresh_token: issued.refresh_token,
            token_id: issued.token_id,
            expires_at: issued.refresh_expires_at,
        }
    }
}

fn store_unavailable(err: AppError) -> TokenError {
    TokenError::StoreUnavailable(err.to_string())
}

/// Owns the refresh-token lifecycle: session start, rotation and logout.
///
/// The durable store is authoritative and every transition out of
/// `Active` is a compare-and-set there. The cache only short-circuits
/// rejections; its failures are logged and never change an outcome.
pub struct TokenService {
    tokens: Arc<dyn RefreshTokenRepository>,
    users: Arc<dyn UserRepository>,
    cache: Arc<dyn TokenCache>,
    jwt: Arc<JwtService>,
}

impl TokenService {
    pub fn new(
        tokens: Arc<dyn RefreshTokenRepository>,
        users: Arc<dyn UserRepository>,
        cache: Arc<dyn TokenCache>,
        jwt: Arc<JwtService>,
    ) -> Self {
        Self {
            tokens,
            users,
            cache,
            jwt,
        }
    }

    pub fn cache_backend(&self) -> &'static str {
        self.cache.backend()
    }

    /// Issue a pair for a freshly authenticated user and persist its
    /// refresh record as `Active`.
    pub async fn start_session(&self, user: &User) -> AppResult<TokenPair> {
        let issued = self.jwt.issue_pair(user)?;
        self.persist(user, &issued).await?;

        info!("Started session {} for user {}", issued.token_id, user.id);
        Ok(issued.into())
    }

    /// Exchange an active refresh token for a new pair. The presented
    /// record becomes `Rotated` before its successor is created.
    pub async fn rotate(&self, presented: &str, token_id: &str) -> AppResult<TokenPair> {
        let now = Utc::now();

        let (current, user) = match self.check_rotatable(presented, token_id, now).await {
            Ok(found) => found,
            Err(err) => return Err(self.reject("refresh", token_id, err)),
        };

        let issued = self.jwt.issue_pair(&user)?;

        let superseded = self
            .tokens
            .deactivate(&current.id, TokenStatus::Rotated, Some(issued.token_id.clone()))
            .await
            .map_err(store_unavailable)?;
        if !superseded {
            // Another request rotated or revoked it between our read and write
            return Err(self.reject("refresh", token_id, TokenError::TokenRevoked));
        }

        self.blacklist(&current, TokenStatus::Rotated, now).await;
        self.persist(&user, &issued).await?;

        info!(
            "Rotated refresh token {} -> {} for user {}",
            current.id, issued.token_id, user.id
        );
        Ok(issued.into())
    }

    /// Revoke the session behind a refresh token. Closing an already
    /// inactive session succeeds without writing anything.
    pub async fn logout(&self, presented: &str, token_id: &str) -> AppResult<()> {
        let now = Utc::now();

        let record = match self.load_bound_record(presented, token_id, true).await {
            Ok(record) => record,
            Err(err) => return Err(self.reject("logout", token_id, err)),
        };

        let state = record.state_at(now);
        if state != TokenStatus::Active {
            debug!("Logout for token {} already {}", record.id, state);
            return Ok(());
        }

        let revoked = self
            .tokens
            .deactivate(&record.id, TokenStatus::Revoked, None)
            .await
            .map_err(store_unavailable)?;

        if revoked {
            self.blacklist(&record, TokenStatus::Revoked, now).await;
            info!("Revoked refresh token {} for user {}", record.id, record.user_id);
        }

        Ok(())
    }

    /// Revoke every active session of a user, e.g. after a password reset.
    pub async fn revoke_all_for_user(&self, user_id: &str) -> AppResult<u64> {
        let revoked = self.tokens.revoke_all_for_user(user_id).await?;
        info!("Revoked {} active refresh tokens for user {}", revoked, user_id);
        Ok(revoked)
    }

    /// Remove a deleted account's records and any cached markers for them.
    pub async fn purge_user(&self, user_id: &str) -> AppResult<usize> {
        let removed = self.tokens.delete_all_for_user(user_id).await?;

        for token_id in &removed {
            if let Err(e) = self.cache.delete(token_id).await {
                warn!("Failed to drop cache entry for token {}: {}", token_id, e);
            }
        }

        Ok(removed.len())
    }

    async fn check_rotatable(
        &self,
        presented: &str,
        token_id: &str,
        now: DateTime<Utc>,
    ) -> Result<(RefreshToken, User), TokenError> {
        let claims = self.bind_claims(presented, token_id, false)?;

        match self.cache.get(token_id).await {
            Ok(Some(status)) => {
                debug!("Cache reports token {} as {}", token_id, status);
                return Err(TokenError::TokenBlacklisted);
            }
            Ok(None) => {}
            Err(e) => warn!("Token cache read failed, using store only: {}", e),
        }

        let record = self.find_bound_record(&claims, presented).await?;

        match record.state_at(now) {
            TokenStatus::Active => {}
            TokenStatus::Expired => return Err(TokenError::TokenExpired),
            TokenStatus::Rotated | TokenStatus::Revoked => return Err(TokenError::TokenRevoked),
        }

        let user = self
            .users
            .find_by_id(&record.user_id)
            .await
            .map_err(store_unavailable)?
            .ok_or(TokenError::TokenNotFound)?;

        Ok((record, user))
    }

    async fn load_bound_record(
        &self,
        presented: &str,
        token_id: &str,
        allow_expired: bool,
    ) -> Result<RefreshToken, TokenError> {
        let claims = self.bind_claims(presented, token_id, allow_expired)?;
        self.find_bound_record(&claims, presented).await
    }

    /// Verify the JWT and that it names `token_id`.
    fn bind_claims(
        &self,
        presented: &str,
        token_id: &str,
        allow_expired: bool,
    ) -> Result<RefreshClaims, TokenError> {
        let claims = if allow_expired {
            self.jwt.inspect_refresh_token(presented)?
        } else {
            self.jwt.validate_refresh_token(presented)?
        };

        if claims.jti != token_id {
            return Err(TokenError::TokenNotFound);
        }

        Ok(claims)
    }

    async fn find_bound_record(
        &self,
        claims: &RefreshClaims,
        presented: &str,
    ) -> Result<RefreshToken, TokenError> {
        let record = self
            .tokens
            .find_by_id(&claims.jti)
            .await
            .map_err(store_unavailable)?
            .ok_or(TokenError::TokenNotFound)?;

        if record.user_id != claims.sub || record.token_hash != hash_token(presented) {
            return Err(TokenError::TokenNotFound);
        }

        Ok(record)
    }

    async fn persist(&self, user: &User, issued: &IssuedTokens) -> AppResult<()> {
        let mut record = RefreshToken::new(
            issued.token_id.clone(),
            user.id.clone(),
            hash_token(&issued.refresh_token),
            issued.refresh_expires_at,
        );
        record.issued_at = issued.issued_at;

        self.tokens.create(record).await?;
        Ok(())
    }

    async fn blacklist(&self, record: &RefreshToken, status: TokenStatus, now: DateTime<Utc>) {
        let Some(remaining) = record.remaining_lifetime(now) else {
            return;
        };
        let ttl_seconds = remaining.num_seconds().max(1) as u64;

        if let Err(e) = self.cache.set(&record.id, status, ttl_seconds).await {
            warn!("Failed to cache {} marker for token {}: {}", status, record.id, e);
        }
    }

    fn reject(&self, operation: &str, token_id: &str, err: TokenError) -> AppError {
        match &err {
            TokenError::StoreUnavailable(detail) => {
                log::error!("{} for token {} failed: {}", operation, token_id, detail)
            }
            other => warn!("Rejected {} for token {}: {}", operation, token_id, other),
        }
        err.into()
    }
}
