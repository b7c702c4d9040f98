use std::sync::Arc;
use std::time::Duration;

use tracing::warn;

use crate::cache::keys::lock_key;
use crate::cache::store::Store;
use crate::error::StoreError;

/// 基于共享存储的分布式锁
///
/// 锁只做争用检测，获取失败立即返回，不排队也不重试。
/// 锁记录不保存持有者标识，任何知道键的一方都可以释放。
#[derive(Clone)]
pub struct DistributedLock {
    store: Arc<dyn Store>,
    lease: Duration,
}

impl DistributedLock {
    pub fn new(store: Arc<dyn Store>, lease: Duration) -> Self {
        Self { store, lease }
    }

    pub fn lease(&self) -> Duration {
        self.lease
    }

    /// 尝试加锁，返回 `false` 表示锁已被其他请求持有
    pub async fn lock(&self, caller_key: &str) -> Result<bool, StoreError> {
        self.store.set_nx(&lock_key(caller_key), self.lease).await
    }

    /// 无条件删除锁记录
    pub async fn unlock(&self, caller_key: &str) -> Result<(), StoreError> {
        self.store.del(&lock_key(caller_key)).await
    }

    /// 加锁成功时返回守卫，守卫离开作用域时保证释放
    pub async fn acquire(&self, caller_key: &str) -> Result<Option<LockGuard>, StoreError> {
        if !self.lock(caller_key).await? {
            return Ok(None);
        }

        Ok(Some(LockGuard {
            store: Arc::clone(&self.store),
            key: lock_key(caller_key),
            held: true,
        }))
    }
}

/// 已持有的锁
///
/// 正常路径调用 [`LockGuard::release`]；若请求被取消或中途 panic，
/// `Drop` 会在后台补发一次删除。
pub struct LockGuard {
    store: Arc<dyn Store>,
    key: String,
    held: bool,
}

impl LockGuard {
    pub fn key(&self) -> &str {
        &self.key
    }

    pub async fn release(mut self) -> Result<(), StoreError> {
        let result = self.store.del(&self.key).await;
        self.held = false;
        result
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        if !self.held {
            return;
        }

        let key = std::mem::take(&mut self.key);
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let store = Arc::clone(&self.store);
                handle.spawn(async move {
                    if let Err(err) = store.del(&key).await {
                        warn!(lock_key = %key, error = %err, "failed to release abandoned lock");
                    }
                });
            }
            Err(_) => {
                warn!(lock_key = %key, "no runtime to release lock, waiting for lease expiry");
            }
        }
    }
}
