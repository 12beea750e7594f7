use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use tracing::info;

use crate::persistence::slot_store::{SlotStore, StoreError};

/// Slots kept in Redis. Space is bounded by the server's `maxmemory`; an `OOM` reply
/// is surfaced as [`StoreError::QuotaExceeded`].
pub struct RedisStore {
    conn: MultiplexedConnection,
}

impl RedisStore {
    pub async fn connect(redis_url: &str) -> Result<Self, StoreError> {
        let client = redis::Client::open(redis_url)?;
        let conn = client.get_multiplexed_async_connection().await?;
        info!("Redis slot store connected");
        Ok(Self { conn })
    }
}

fn map_write_error(e: redis::RedisError, requested: usize) -> StoreError {
    if e.code() == Some("OOM") {
        StoreError::QuotaExceeded {
            requested,
            available: 0,
        }
    } else {
        StoreError::Redis(e)
    }
}

#[async_trait]
impl SlotStore for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut conn = self.conn.clone();
        Ok(conn.get::<_, Option<String>>(key).await?)
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        conn.set::<_, _, ()>(key, value)
            .await
            .map_err(|e| map_write_error(e, value.len()))
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        conn.del::<_, ()>(key).await?;
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "redis"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_oom_reply_maps_to_quota() {
        let err = redis::parse_redis_value(
            b"-OOM command not allowed when used memory > 'maxmemory'.\r\n",
        )
        .unwrap_err();
        assert_eq!(err.code(), Some("OOM"));
        assert!(map_write_error(err, 42).is_quota());
    }

    #[test]
    fn test_other_reply_stays_redis_error() {
        let err = redis::RedisError::from((redis::ErrorKind::IoError, "connection reset"));
        assert!(matches!(map_write_error(err, 42), StoreError::Redis(_)));
    }
}
