use deadpool_redis::{
    redis::{self, AsyncCommands},
    Runtime,
};
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{api::error, ENV};

pub async fn connect_database() -> Result<PgPool, error::SystemError> {
    let database_url = &ENV.database_url;
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .min_connections(1)
        .acquire_slow_threshold(std::time::Duration::from_secs(3))
        .connect(database_url)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;
    log::info!("Database connected and migrations applied");

    Ok(pool)
}

/// Key/value store behind the OTP, token, profile and rate-limit state.
#[async_trait::async_trait]
pub trait CacheStore: Send + Sync {
    async fn get_raw(&self, key: &str) -> Result<Option<Vec<u8>>, error::SystemError>;

    async fn set_raw(
        &self,
        key: &str,
        value: Vec<u8>,
        expiration: usize,
    ) -> Result<(), error::SystemError>;

    async fn delete(&self, key: &str) -> Result<(), error::SystemError>;

    /// Fixed-window counter: the first hit in a window starts its TTL.
    async fn incr_with_ttl(&self, key: &str, window: u64) -> Result<u64, error::SystemError>;

    async fn get<T>(&self, key: &str) -> Result<Option<T>, error::SystemError>
    where
        T: serde::de::DeserializeOwned + Send,
    {
        match self.get_raw(key).await? {
            Some(v) => Ok(Some(serde_json::from_slice(&v)?)),
            None => Ok(None),
        }
    }

    async fn set<T>(&self, key: &str, value: &T, expiration: usize) -> Result<(), error::SystemError>
    where
        T: serde::Serialize + Sync,
    {
        let serialized = serde_json::to_vec(value)?;
        self.set_raw(key, serialized, expiration).await
    }
}

#[derive(Clone)]
pub struct RedisCache {
    pool: deadpool_redis::Pool,
}

impl RedisCache {
    pub async fn new() -> Result<Self, error::SystemError> {
        let mut cfg = deadpool_redis::Config::from_url(&ENV.redis_url);
        cfg.pool = Some(deadpool_redis::PoolConfig { max_size: 16, ..Default::default() });
        let pool = cfg.create_pool(Some(Runtime::Tokio1))?;
        Ok(Self { pool })
    }
}

#[async_trait::async_trait]
impl CacheStore for RedisCache {
    async fn get_raw(&self, key: &str) -> Result<Option<Vec<u8>>, error::SystemError> {
        let mut conn = self.pool.get().await?;
        let value: Option<Vec<u8>> = conn.get(key).await?;
        Ok(value)
    }

    async fn set_raw(
        &self,
        key: &str,
        value: Vec<u8>,
        expiration: usize,
    ) -> Result<(), error::SystemError> {
        let mut conn = self.pool.get().await?;
        conn.set_ex::<_, _, ()>(key, value, expiration as u64).await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), error::SystemError> {
        let mut conn = self.pool.get().await?;
        conn.del::<_, ()>(key).await?;
        Ok(())
    }

    async fn incr_with_ttl(&self, key: &str, window: u64) -> Result<u64, error::SystemError> {
        let mut conn = self.pool.get().await?;
        // SET NX EX and INCR in one MULTI so a counter never outlives its window
        let (count,): (u64,) = redis::pipe()
            .atomic()
            .cmd("SET")
            .arg(key)
            .arg(0)
            .arg("EX")
            .arg(window)
            .arg("NX")
            .ignore()
            .incr(key, 1)
            .query_async(&mut conn)
            .await?;
        Ok(count)
    }
}
