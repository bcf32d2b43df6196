pub mod auth_handler;
pub mod user_handler;

use actix_web::web;

use crate::auth::AuthMiddleware;

pub use auth_handler::{forgot_password, login, logout, refresh_token, reset_password};
pub use user_handler::{create_user, delete_me, get_me, status, status_ready, update_me};

/// Mount every route under `/api/v1`. The `/users/me` scope requires an
/// access token; everything else is public.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .service(status)
            .service(status_ready)
            .service(login)
            .service(refresh_token)
            .service(logout)
            .service(forgot_password)
            .service(reset_password)
            .service(create_user)
            .service(
                web::scope("/users")
                    .wrap(AuthMiddleware)
                    .service(get_me)
                    .service(update_me)
                    .service(delete_me),
            ),
    );
}
