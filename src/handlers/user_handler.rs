use std::sync::Arc;

use actix_web::{delete, get, post, put, web, HttpResponse};

use crate::{
    app_state::AppState,
    auth::AuthenticatedUser,
    db::HealthCheck,
    errors::AppError,
    models::dto::{
        request::{CreateUserRequest, UpdateUserRequest},
        response::{MessageResponse, UserDto, UserResponse},
    },
};

#[post("/users")]
pub async fn create_user(
    state: web::Data<Arc<AppState>>,
    request: web::Json<CreateUserRequest>,
) -> Result<HttpResponse, AppError> {
    let user = state.user_service.register(request.into_inner()).await?;
    Ok(HttpResponse::Created().json(UserResponse {
        message: "User created successfully".to_string(),
        user: UserDto::from(user),
    }))
}

#[get("/me")]
pub async fn get_me(
    state: web::Data<Arc<AppState>>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let user = state.user_service.get_user(&auth.0.sub).await?;
    Ok(HttpResponse::Ok().json(UserDto::from(user)))
}

#[put("/me")]
pub async fn update_me(
    state: web::Data<Arc<AppState>>,
    request: web::Json<UpdateUserRequest>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let user = state
        .user_service
        .update_user(&auth.0.sub, request.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(UserResponse {
        message: "User updated successfully".to_string(),
        user: UserDto::from(user),
    }))
}

#[delete("/me")]
pub async fn delete_me(
    state: web::Data<Arc<AppState>>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    state.user_service.delete_user(&auth.0.sub).await?;
    Ok(HttpResponse::Ok().json(MessageResponse::new("User deleted successfully")))
}

#[get("/status")]
pub async fn status() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "OK",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

#[get("/status/ready")]
pub async fn status_ready(state: web::Data<Arc<AppState>>) -> HttpResponse {
    let db_health = state.db.ping().await;
    if let Err(e) = &db_health {
        log::warn!("Readiness check failed: {}", e);
    }

    let response = serde_json::json!({
        "status": if db_health.is_ok() { "ready" } else { "not_ready" },
        "version": env!("CARGO_PKG_VERSION"),
        "dependencies": {
            "mongodb": if db_health.is_ok() { "ok" } else { "error" },
            "cache": state.token_service.cache_backend()
        }
    });

    if db_health.is_ok() {
        HttpResponse::Ok().json(response)
    } else {
        HttpResponse::ServiceUnavailable().json(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{test, App};

    #[actix_web::test]
    async fn test_status() {
        let app = test::init_service(App::new().service(status)).await;

        let req = test::TestRequest::get().uri("/status").to_request();
        let resp = test::call_service(&app, req).await;
        assert!(resp.status().is_success());

        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["status"], "OK");
    }
}
