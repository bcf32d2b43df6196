pub mod refresh_token;
pub mod user;
pub use refresh_token::{hash_token, RefreshToken, TokenStatus};
pub use user::{User, UserRole};
