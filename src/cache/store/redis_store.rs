use std::time::Duration;

use async_trait::async_trait;
use redis::{AsyncCommands, aio::MultiplexedConnection};

use super::Store;
use crate::error::StoreError;

/// Redis 实现，多个服务进程共享同一份限流状态
#[derive(Clone)]
pub struct RedisStore {
    conn: MultiplexedConnection,
}

impl RedisStore {
    pub async fn connect(redis_url: &str) -> Result<Self, StoreError> {
        let client = redis::Client::open(redis_url)?;
        let conn = client.get_multiplexed_async_connection().await?;
        Ok(Self { conn })
    }
}

/// 整秒使用秒级精度，否则退化为毫秒级
fn is_precise(ttl: Duration) -> bool {
    ttl.subsec_nanos() != 0
}

fn expiry_arg(ttl: Duration) -> (&'static str, u128) {
    if is_precise(ttl) {
        ("PX", ttl.as_millis())
    } else {
        ("EX", u128::from(ttl.as_secs()))
    }
}

#[async_trait]
impl Store for RedisStore {
    async fn set_nx(&self, key: &str, ttl: Duration) -> Result<bool, StoreError> {
        let mut conn = self.conn.clone();
        let (unit, amount) = expiry_arg(ttl);
        // SET key 1 EX <ttl> NX，未写入时返回 nil
        let reply: Option<String> = redis::cmd("SET")
            .arg(key)
            .arg(1)
            .arg(unit)
            .arg(amount.to_string())
            .arg("NX")
            .query_async(&mut conn)
            .await?;
        Ok(reply.is_some())
    }

    async fn incr(&self, key: &str) -> Result<i64, StoreError> {
        let mut conn = self.conn.clone();
        let value: i64 = conn.incr(key, 1).await?;
        Ok(value)
    }

    async fn decr(&self, key: &str) -> Result<i64, StoreError> {
        let mut conn = self.conn.clone();
        let value: i64 = conn.decr(key, 1).await?;
        Ok(value)
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        if is_precise(ttl) {
            let _: () = conn
                .pexpire(key, i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX))
                .await?;
        } else {
            let _: () = conn
                .expire(key, i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX))
                .await?;
        }
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<i64>, StoreError> {
        let mut conn = self.conn.clone();
        // 非整数值会在这里转换失败，按读取失败处理
        let value: Option<i64> = conn.get(key).await?;
        Ok(value)
    }

    async fn del(&self, key: &str) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        let _: () = conn.del(key).await?;
        Ok(())
    }
}
