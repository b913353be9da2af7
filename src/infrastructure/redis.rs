use crate::domain::CacheRepository;
use anyhow::Context;
use async_trait::async_trait;
use deadpool_redis::redis::AsyncCommands;
use deadpool_redis::{Config, Pool, Runtime};
use tracing::info;

/// Default connection string when `REDIS_URL` is not set
pub const DEFAULT_REDIS_URL: &str = "redis://127.0.0.1:6379";

/// Redis-backed report cache.
///
/// Unlike a best-effort cache, connection failures are reported to the
/// caller: an analysis that cannot read or write its cache entry fails.
pub struct RedisRepository {
    pool: Pool,
}

impl RedisRepository {
    /// Build the connection pool. Connections are opened lazily, so this
    /// only fails on a malformed URL.
    pub fn new(url: &str) -> anyhow::Result<Self> {
        let pool = Config::from_url(url)
            .create_pool(Some(Runtime::Tokio1))
            .context("Failed to create Redis connection pool")?;
        info!("Redis connection pool initialized");
        Ok(Self { pool })
    }
}

#[async_trait]
impl CacheRepository for RedisRepository {
    async fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        let mut conn = self
            .pool
            .get()
            .await
            .context("Failed to get Redis connection from pool")?;
        let result: Option<String> = conn
            .get(key)
            .await
            .with_context(|| format!("Redis GET {} failed", key))?;
        Ok(result)
    }

    async fn set(&self, key: &str, value: &str, ttl_seconds: u64) -> anyhow::Result<()> {
        let mut conn = self
            .pool
            .get()
            .await
            .context("Failed to get Redis connection from pool")?;
        let _: () = conn
            .set_ex(key, value, ttl_seconds)
            .await
            .with_context(|| format!("Redis SET {} failed", key))?;
        Ok(())
    }
}
