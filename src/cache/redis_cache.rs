use std::time::Duration;

use async_trait::async_trait;
use log::{debug, info, warn};
use redis::{aio::MultiplexedConnection, AsyncCommands, Client};

use crate::{
    cache::{CacheError, TokenCache},
    models::domain::TokenStatus,
};

const KEY_PREFIX: &str = "blacklist";
const CONNECT_ATTEMPTS: u32 = 3;
const CONNECT_RETRY_DELAY_MS: u64 = 100;

/// Redis-backed token cache. Each entry is `blacklist:{token_id}` holding
/// the token's terminal status with a TTL equal to its remaining lifetime.
#[derive(Clone)]
pub struct RedisTokenCache {
    connection: MultiplexedConnection,
}

impl RedisTokenCache {
    pub async fn connect(url: &str) -> Result<Self, CacheError> {
        let client = Client::open(url)?;
        let mut delay = CONNECT_RETRY_DELAY_MS;
        let mut attempt = 0;

        loop {
            attempt += 1;
            match client.get_multiplexed_async_connection().await {
                Ok(connection) => {
                    info!("Connected to Redis token cache");
                    return Ok(Self { connection });
                }
                Err(e) if attempt < CONNECT_ATTEMPTS => {
                    warn!(
                        "Redis connection attempt {}/{} failed: {}. Retrying in {}ms",
                        attempt, CONNECT_ATTEMPTS, e, delay
                    );
                    tokio::time::sleep(Duration::from_millis(delay)).await;
                    delay *= 2;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    pub fn key_for(token_id: &str) -> String {
        format!("{}:{}", KEY_PREFIX, token_id)
    }
}

#[async_trait]
impl TokenCache for RedisTokenCache {
    async fn get(&self, token_id: &str) -> Result<Option<TokenStatus>, CacheError> {
        let mut conn = self.connection.clone();
        let value: Option<String> = conn.get(Self::key_for(token_id)).await?;

        value
            .map(|v| v.parse::<TokenStatus>().map_err(|_| CacheError::Corrupt(v)))
            .transpose()
    }

    async fn set(&self, token_id: &str, status: TokenStatus, ttl_seconds: u64) -> Result<(), CacheError> {
        let mut conn = self.connection.clone();
        conn.set_ex::<_, _, ()>(Self::key_for(token_id), status.as_str(), ttl_seconds)
            .await?;
        debug!("Cached {} marker for token {} ({}s)", status, token_id, ttl_seconds);
        Ok(())
    }

    async fn delete(&self, token_id: &str) -> Result<(), CacheError> {
        let mut conn = self.connection.clone();
        conn.del::<_, ()>(Self::key_for(token_id)).await?;
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "redis"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_format() {
        assert_eq!(RedisTokenCache::key_for("12345"), "blacklist:12345");
    }

    #[tokio::test]
    async fn test_connect_rejects_malformed_url() {
        let result = RedisTokenCache::connect("not a redis url").await;
        assert!(matches!(result, Err(CacheError::Backend(_))));
    }
}
