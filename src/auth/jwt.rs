use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret, SecretString};
use uuid::Uuid;

use crate::{
    auth::claims::{Claims, RefreshClaims, ACCESS_TOKEN_TYPE, REFRESH_TOKEN_TYPE},
    errors::{AppError, AppResult, TokenError},
    models::domain::user::User,
};

/// A freshly signed access/refresh pair. Persisting the refresh record
/// under `token_id` is the caller's job.
#[derive(Debug, Clone)]
pub struct IssuedTokens {
    pub access_token: String,
    pub refresh_token: String,
    pub token_id: String,
    pub issued_at: DateTime<Utc>,
    pub refresh_expires_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    access_expiration_minutes: i64,
    refresh_expiration_hours: i64,
}

impl JwtService {
    pub fn new(
        secret: &SecretString,
        access_expiration_minutes: i64,
        refresh_expiration_hours: i64,
    ) -> Self {
        let secret_bytes = secret.expose_secret().as_bytes();

        Self {
            encoding_key: EncodingKey::from_secret(secret_bytes),
            decoding_key: DecodingKey::from_secret(secret_bytes),
            validation: Validation::default(),
            access_expiration_minutes,
            refresh_expiration_hours,
        }
    }

    pub fn create_token(&self, user: &User) -> AppResult<String> {
        let claims = Claims::new(user, self.access_expiration_minutes);

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AppError::InternalError(format!("Failed to create JWT: {}", e)))
    }

    pub fn validate_token(&self, token: &str) -> AppResult<Claims> {
        let claims = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| AppError::Unauthorized(format!("Invalid token: {}", e)))?;

        if claims.token_type != ACCESS_TOKEN_TYPE {
            return Err(AppError::Unauthorized(
                "Token is not an access token".to_string(),
            ));
        }

        Ok(claims)
    }

    /// Sign a new access token and a refresh token bound to a new record id.
    pub fn issue_pair(&self, user: &User) -> AppResult<IssuedTokens> {
        let token_id = Uuid::new_v4().to_string();
        let issued_at = Utc::now();
        let refresh_expires_at = issued_at + Duration::hours(self.refresh_expiration_hours);

        let access_token = self.create_token(user)?;
        let refresh_claims = RefreshClaims::new(&user.id, &token_id, issued_at, refresh_expires_at);
        let refresh_token = encode(&Header::default(), &refresh_claims, &self.encoding_key)
            .map_err(|e| AppError::InternalError(format!("Failed to create refresh token: {}", e)))?;

        Ok(IssuedTokens {
            access_token,
            refresh_token,
            token_id,
            issued_at,
            refresh_expires_at,
        })
    }

    /// Verify signature, expiry and type of a presented refresh token.
    pub fn validate_refresh_token(&self, token: &str) -> Result<RefreshClaims, TokenError> {
        self.decode_refresh(token, &self.validation)
    }

    /// Like `validate_refresh_token` but accepts a lapsed `exp`, so a
    /// session can still be closed after its token expired.
    pub fn inspect_refresh_token(&self, token: &str) -> Result<RefreshClaims, TokenError> {
        let mut validation = self.validation.clone();
        validation.validate_exp = false;
        self.decode_refresh(token, &validation)
    }

    fn decode_refresh(&self, token: &str, validation: &Validation) -> Result<RefreshClaims, TokenError> {
        let token_data = decode::<RefreshClaims>(token, &self.decoding_key, validation)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::TokenExpired,
                _ => {
                    log::debug!("Refresh token rejected: {}", e);
                    TokenError::TokenNotFound
                }
            })?;

        if token_data.claims.token_type != REFRESH_TOKEN_TYPE {
            return Err(TokenError::TokenNotFound);
        }

        Ok(token_data.claims)
    }
}
