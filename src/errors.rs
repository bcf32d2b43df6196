use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Internal server error: {0}")]
    InternalError(String),
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u16,
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::AlreadyExists(_) => StatusCode::CONFLICT,
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::DatabaseError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        // Storage details stay in the logs
        let error = match self {
            AppError::DatabaseError(detail) | AppError::InternalError(detail) => {
                log::error!("{}", detail);
                "An unexpected error occurred".to_string()
            }
            AppError::Unauthorized(message) | AppError::Forbidden(message) => message.clone(),
            other => other.to_string(),
        };

        HttpResponse::build(self.status_code()).json(ErrorResponse {
            error,
            code: self.status_code().as_u16(),
        })
    }
}

impl From<mongodb::error::Error> for AppError {
    fn from(err: mongodb::error::Error) -> Self {
        AppError::DatabaseError(err.to_string())
    }
}
impl From<mongodb::bson::ser::Error> for AppError {
    fn from(err: mongodb::bson::ser::Error) -> Self {
        AppError::InternalError(format!("BSON serialization error: {}", err))
    }
}
impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::ValidationError(err.to_string())
    }
}
impl From<bcrypt::BcryptError> for AppError {
    fn from(err: bcrypt::BcryptError) -> Self {
        AppError::InternalError(format!("Password hashing failed: {}", err))
    }
}

pub type AppResult<T> = Result<T, AppError>;

pub const INVALID_REFRESH_TOKEN: &str = "Invalid or expired refresh token";

/// Refresh-token lifecycle failures. The first four collapse into one
/// outward message so callers cannot probe which case applied.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("refresh token not found")]
    TokenNotFound,

    #[error("refresh token is blacklisted")]
    TokenBlacklisted,

    #[error("refresh token has been revoked")]
    TokenRevoked,

    #[error("refresh token has expired")]
    TokenExpired,

    #[error("token store unavailable: {0}")]
    StoreUnavailable(String),
}

impl From<TokenError> for AppError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::StoreUnavailable(detail) => {
                AppError::InternalError(format!("Token store unavailable: {}", detail))
            }
            _ => AppError::Unauthorized(INVALID_REFRESH_TOKEN.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_codes() {
        assert_eq!(
            AppError::NotFound("test".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::AlreadyExists("test".into()).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::ValidationError("test".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::Forbidden("test".into()).status_code(),
            StatusCode::FORBIDDEN
        );
    }

    #[test]
    fn test_error_messages() {
        let err = AppError::NotFound("user".into());
        assert_eq!(err.to_string(), "Not found: user");
    }

    #[test]
    fn test_token_errors_are_indistinguishable() {
        let outward: Vec<String> = [
            TokenError::TokenNotFound,
            TokenError::TokenBlacklisted,
            TokenError::TokenRevoked,
            TokenError::TokenExpired,
        ]
        .into_iter()
        .map(|e| AppError::from(e).to_string())
        .collect();

        assert!(outward.iter().all(|m| m == "Unauthorized: Invalid or expired refresh token"));
    }

    #[test]
    fn test_store_unavailable_is_unexpected_error() {
        let err = AppError::from(TokenError::StoreUnavailable("timeout".into()));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[actix_web::test]
    async fn test_database_error_body_is_generic() {
        let resp = AppError::DatabaseError("connection refused on 10.0.0.3".into()).error_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = actix_web::body::to_bytes(resp.into_body()).await.unwrap();
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert!(!text.contains("10.0.0.3"));
        assert!(text.contains("An unexpected error occurred"));
    }

    #[actix_web::test]
    async fn test_invalid_refresh_token_body_is_the_bare_message() {
        let resp = AppError::from(TokenError::TokenRevoked).error_response();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let body = actix_web::body::to_bytes(resp.into_body()).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], INVALID_REFRESH_TOKEN);
        assert_eq!(json["code"], 401);
    }
}
