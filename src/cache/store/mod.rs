// 共享存储抽象
// 限流所需的最小命令集合，任何支持原子 create-if-absent、自增和 TTL 的 KV 存储都可以实现
use std::time::Duration;

use async_trait::async_trait;

use crate::error::StoreError;

mod memory;
mod redis_store;
#[cfg(test)]
pub(crate) mod testing;

pub use memory::MemoryStore;
pub use redis_store::RedisStore;

#[async_trait]
pub trait Store: Send + Sync {
    /// 仅当键不存在时写入并设置过期时间，返回是否由本次调用创建
    async fn set_nx(&self, key: &str, ttl: Duration) -> Result<bool, StoreError>;

    /// 原子自增，键不存在时从 0 开始，返回自增后的值
    async fn incr(&self, key: &str) -> Result<i64, StoreError>;

    async fn decr(&self, key: &str) -> Result<i64, StoreError>;

    /// 为已存在的键设置或刷新过期时间
    async fn expire(&self, key: &str, ttl: Duration) -> Result<(), StoreError>;

    /// 键不存在时返回 `None`
    async fn get(&self, key: &str) -> Result<Option<i64>, StoreError>;

    /// 无条件删除，幂等
    async fn del(&self, key: &str) -> Result<(), StoreError>;
}
