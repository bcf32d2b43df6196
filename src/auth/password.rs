use bcrypt::{hash, verify};

use crate::errors::{AppError, AppResult};

/// Hash a password with bcrypt. Runs on the blocking pool since a
/// production cost takes hundreds of milliseconds.
pub async fn hash_password(password: &str, cost: u32) -> AppResult<String> {
    let password = password.to_string();
    let hashed = tokio::task::spawn_blocking(move || hash(password, cost))
        .await
        .map_err(|e| AppError::InternalError(format!("Hashing task failed: {}", e)))??;
    Ok(hashed)
}

/// A malformed stored hash counts as a mismatch.
pub async fn verify_password(password: &str, password_hash: &str) -> bool {
    let password = password.to_string();
    let password_hash = password_hash.to_string();
    tokio::task::spawn_blocking(move || verify(password, &password_hash).unwrap_or(false))
        .await
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_hash_and_verify() {
        let hashed = hash_password("correct horse", 4).await.unwrap();

        assert_ne!(hashed, "correct horse");
        assert!(verify_password("correct horse", &hashed).await);
        assert!(!verify_password("battery staple", &hashed).await);
    }

    #[tokio::test]
    async fn test_verify_against_garbage_hash() {
        assert!(!verify_password("anything", "not-a-bcrypt-hash").await);
    }
}
