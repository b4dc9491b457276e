use std::time::Duration;

use async_trait::async_trait;
use bb8_redis::{
    RedisConnectionManager, bb8,
    redis::{self, AsyncCommands},
};

use crate::Res;

use super::Cache;

/// Redis-backed [`Cache`] shared by every instance of the service.
pub struct RedisCache {
    pool: bb8::Pool<RedisConnectionManager>,
}

impl RedisCache {
    pub fn new(pool: bb8::Pool<RedisConnectionManager>) -> Self {
        Self { pool }
    }

    pub async fn connect(url: &str) -> Res<Self> {
        let manager = RedisConnectionManager::new(url)?;
        let pool = bb8::Pool::builder().build(manager).await?;
        Ok(Self::new(pool))
    }
}

#[async_trait]
impl Cache for RedisCache {
    async fn get(&self, key: &str) -> Res<Option<String>> {
        let mut conn = self.pool.get().await?;
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Res<()> {
        let mut conn = self.pool.get().await?;
        match ttl {
            Some(ttl) => {
                let _: () = conn.set_ex(key, value, ttl.as_secs().max(1)).await?;
            }
            None => {
                let _: () = conn.set(key, value).await?;
            }
        }
        Ok(())
    }

    async fn clear(&self, key: &str) -> Res<()> {
        let mut conn = self.pool.get().await?;
        let _: () = conn.del(key).await?;
        Ok(())
    }

    async fn take(&self, key: &str) -> Res<Option<String>> {
        let mut conn = self.pool.get().await?;
        // GETDEL keeps consumption single-use across instances
        let value: Option<String> = redis::cmd("GETDEL").arg(key).query_async(&mut *conn).await?;
        Ok(value)
    }
}
