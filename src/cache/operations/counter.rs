use std::sync::Arc;
use std::time::Duration;

use tracing::warn;

use crate::cache::store::Store;
use crate::error::StoreError;

/// 固定窗口计数器
///
/// 窗口内第一次自增时设置过期时间，过期即进入下一个窗口。
#[derive(Clone)]
pub struct WindowCounter {
    store: Arc<dyn Store>,
    window: Duration,
}

impl WindowCounter {
    pub fn new(store: Arc<dyn Store>, window: Duration) -> Self {
        Self { store, window }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// 计数加一并返回新值
    ///
    /// 设置过期时间失败时回滚本次自增，返回的是过期设置的错误。
    /// 自增、设置过期和回滚在独立任务中执行，调用方被取消时仍会执行完毕，
    /// 否则计数器可能停留在没有过期时间的状态。
    pub async fn increment(&self, key: &str) -> Result<i64, StoreError> {
        let store = Arc::clone(&self.store);
        let key = key.to_string();
        let window = self.window;

        let task = tokio::spawn(async move {
            increment_with_expiry(store.as_ref(), &key, window).await
        });
        match task.await {
            Ok(result) => result,
            Err(err) if err.is_panic() => std::panic::resume_unwind(err.into_panic()),
            Err(_) => Err(StoreError::Interrupted),
        }
    }

    /// 当前计数是否低于限额
    ///
    /// 键不存在视为 0；读取失败时返回 `false`，宁可拒绝也不放行。
    pub async fn is_below(&self, key: &str, limit: u64) -> bool {
        match self.store.get(key).await {
            Ok(value) => is_below_limit(value.unwrap_or(0), limit),
            Err(err) => {
                warn!(key = %key, error = %err, "failed to read window counter");
                false
            }
        }
    }
}

async fn increment_with_expiry(
    store: &dyn Store,
    key: &str,
    window: Duration,
) -> Result<i64, StoreError> {
    let value = store.incr(key).await?;

    if value == 1 {
        if let Err(err) = store.expire(key, window).await {
            // 没有过期时间的计数器永远不会重置
            if let Err(rollback_err) = store.decr(key).await {
                warn!(
                    key = %key,
                    error = %err,
                    rollback_error = %rollback_err,
                    "failed to roll back window counter"
                );
            }
            return Err(err);
        }
    }

    Ok(value)
}

fn is_below_limit(value: i64, limit: u64) -> bool {
    i64::try_from(limit).map_or(true, |limit| value < limit)
}
