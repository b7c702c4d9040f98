use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use super::{MemoryStore, Store};
use crate::error::StoreError;

/// 记录调用并可注入失败的测试存储
#[derive(Default)]
pub(crate) struct ScriptedStore {
    pub inner: MemoryStore,
    calls: Mutex<Vec<String>>,
    failing: Mutex<HashSet<&'static str>>,
    stalled: Mutex<HashSet<&'static str>>,
    delayed: Mutex<HashMap<&'static str, Duration>>,
    panicking: Mutex<HashSet<&'static str>>,
}

impl ScriptedStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_on(&self, op: &'static str) {
        self.failing.lock().unwrap().insert(op);
    }

    /// 命令永远不返回，用于模拟请求被取消
    pub fn stall_on(&self, op: &'static str) {
        self.stalled.lock().unwrap().insert(op);
    }

    /// 命令在给定时长后才执行，用于模拟慢存储
    pub fn delay_on(&self, op: &'static str, delay: Duration) {
        self.delayed.lock().unwrap().insert(op, delay);
    }

    pub fn panic_on(&self, op: &'static str) {
        self.panicking.lock().unwrap().insert(op);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    async fn record(&self, op: &'static str, key: &str) -> Result<(), StoreError> {
        self.calls.lock().unwrap().push(format!("{op} {key}"));
        let stalled = self.stalled.lock().unwrap().contains(op);
        if stalled {
            std::future::pending::<()>().await;
        }
        let delay = self.delayed.lock().unwrap().get(op).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let panicking = self.panicking.lock().unwrap().contains(op);
        if panicking {
            panic!("injected panic on {op}");
        }
        let failing = self.failing.lock().unwrap().contains(op);
        if failing {
            let err = redis::RedisError::from((redis::ErrorKind::IoError, "injected failure"));
            return Err(err.into());
        }
        Ok(())
    }
}

#[async_trait]
impl Store for ScriptedStore {
    async fn set_nx(&self, key: &str, ttl: Duration) -> Result<bool, StoreError> {
        self.record("set_nx", key).await?;
        self.inner.set_nx(key, ttl).await
    }

    async fn incr(&self, key: &str) -> Result<i64, StoreError> {
        self.record("incr", key).await?;
        self.inner.incr(key).await
    }

    async fn decr(&self, key: &str) -> Result<i64, StoreError> {
        self.record("decr", key).await?;
        self.inner.decr(key).await
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<(), StoreError> {
        self.record("expire", key).await?;
        self.inner.expire(key, ttl).await
    }

    async fn get(&self, key: &str) -> Result<Option<i64>, StoreError> {
        self.record("get", key).await?;
        self.inner.get(key).await
    }

    async fn del(&self, key: &str) -> Result<(), StoreError> {
        self.record("del", key).await?;
        self.inner.del(key).await
    }
}
