use std::sync::Arc;

use actix_web::{post, web, HttpResponse};
use actix_web_httpauth::extractors::bearer::BearerAuth;
use validator::Validate;

use crate::{
    app_state::AppState,
    errors::{AppError, INVALID_REFRESH_TOKEN},
    models::dto::{
        request::{ForgotPasswordRequest, LoginRequest, ResetPasswordRequest, TokenIdRequest},
        response::{MessageResponse, TokenPairResponse},
    },
};

/// The refresh JWT travels as a Bearer credential. A missing header is
/// reported like any other invalid refresh token.
fn presented_refresh_token(auth: Option<BearerAuth>) -> Result<String, AppError> {
    auth.map(|bearer| bearer.token().to_string())
        .ok_or_else(|| AppError::Unauthorized(INVALID_REFRESH_TOKEN.to_string()))
}

#[post("/login")]
pub async fn login(
    state: web::Data<Arc<AppState>>,
    request: web::Json<LoginRequest>,
) -> Result<HttpResponse, AppError> {
    let pair = state.user_service.login(request.into_inner()).await?;
    Ok(HttpResponse::Ok().json(TokenPairResponse::new("Logged in successfully", pair)))
}

#[post("/refresh-token")]
pub async fn refresh_token(
    state: web::Data<Arc<AppState>>,
    auth: Option<BearerAuth>,
    request: web::Json<TokenIdRequest>,
) -> Result<HttpResponse, AppError> {
    request.validate()?;
    let presented = presented_refresh_token(auth)?;

    let pair = state
        .token_service
        .rotate(&presented, &request.token_id)
        .await?;
    Ok(HttpResponse::Ok().json(TokenPairResponse::new("Token refreshed successfully", pair)))
}

#[post("/logout")]
pub async fn logout(
    state: web::Data<Arc<AppState>>,
    auth: Option<BearerAuth>,
    request: web::Json<TokenIdRequest>,
) -> Result<HttpResponse, AppError> {
    request.validate()?;
    let presented = presented_refresh_token(auth)?;

    state
        .token_service
        .logout(&presented, &request.token_id)
        .await?;
    Ok(HttpResponse::Ok().json(MessageResponse::new("Logged out successfully")))
}

#[post("/forgot-password")]
pub async fn forgot_password(
    state: web::Data<Arc<AppState>>,
    request: web::Json<ForgotPasswordRequest>,
) -> Result<HttpResponse, AppError> {
    state
        .user_service
        .forgot_password(request.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(MessageResponse::new(
        "An email has been sent with instructions to reset your password",
    )))
}

#[post("/reset-password/{token}")]
pub async fn reset_password(
    state: web::Data<Arc<AppState>>,
    token: web::Path<String>,
    request: web::Json<ResetPasswordRequest>,
) -> Result<HttpResponse, AppError> {
    state
        .user_service
        .reset_password(&token, request.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(MessageResponse::new("Password has been reset successfully")))
}
