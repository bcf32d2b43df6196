use async_trait::async_trait;
use thiserror::Error;

use crate::models::domain::TokenStatus;

pub mod redis_cache;

pub use redis_cache::RedisTokenCache;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache backend error: {0}")]
    Backend(String),

    #[error("cache is unavailable")]
    Unavailable,

    #[error("unrecognised cache value '{0}'")]
    Corrupt(String),
}

impl From<redis::RedisError> for CacheError {
    fn from(err: redis::RedisError) -> Self {
        CacheError::Backend(err.to_string())
    }
}

/// Best-effort mirror of terminal token states, keyed by token id.
/// A miss means "ask the durable store", never "valid".
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TokenCache: Send + Sync {
    async fn get(&self, token_id: &str) -> Result<Option<TokenStatus>, CacheError>;
    async fn set(&self, token_id: &str, status: TokenStatus, ttl_seconds: u64) -> Result<(), CacheError>;
    async fn delete(&self, token_id: &str) -> Result<(), CacheError>;
    fn backend(&self) -> &'static str;
}

/// Stand-in used when Redis could not be reached at startup; every call
/// fails so the lifecycle falls back to store-only checks.
pub struct UnavailableTokenCache;

#[async_trait]
impl TokenCache for UnavailableTokenCache {
    async fn get(&self, _token_id: &str) -> Result<Option<TokenStatus>, CacheError> {
        Err(CacheError::Unavailable)
    }

    async fn set(&self, _token_id: &str, _status: TokenStatus, _ttl_seconds: u64) -> Result<(), CacheError> {
        Err(CacheError::Unavailable)
    }

    async fn delete(&self, _token_id: &str) -> Result<(), CacheError> {
        Err(CacheError::Unavailable)
    }

    fn backend(&self) -> &'static str {
        "unavailable"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unavailable_cache_errors_on_every_call() {
        let cache = UnavailableTokenCache;

        assert!(matches!(cache.get("12345").await, Err(CacheError::Unavailable)));
        assert!(cache.set("12345", TokenStatus::Revoked, 60).await.is_err());
        assert!(cache.delete("12345").await.is_err());
        assert_eq!(cache.backend(), "unavailable");
    }
}
