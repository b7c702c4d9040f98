use std::time::Duration;

use async_trait::async_trait;
use dashmap::{DashMap, mapref::entry::Entry};
use tokio::time::Instant;

use super::Store;
use crate::error::StoreError;

#[derive(Debug, Clone, Copy)]
struct Slot {
    value: i64,
    expires_at: Option<Instant>,
}

impl Slot {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.is_none_or(|at| at > now)
    }
}

/// 单进程内存实现，仅适用于单实例部署和本地调试
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: DashMap<String, Slot>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 清理已过期的键
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, slot| slot.is_live(now));
        before.saturating_sub(self.entries.len())
    }

    fn add(&self, key: &str, delta: i64) -> i64 {
        let now = Instant::now();
        let mut slot = self.entries.entry(key.to_string()).or_insert(Slot {
            value: 0,
            expires_at: None,
        });
        if !slot.is_live(now) {
            *slot = Slot {
                value: 0,
                expires_at: None,
            };
        }
        // 和 Redis 一样，自增不改变已有的过期时间
        slot.value += delta;
        slot.value
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn set_nx(&self, key: &str, ttl: Duration) -> Result<bool, StoreError> {
        let now = Instant::now();
        let fresh = Slot {
            value: 1,
            expires_at: Some(now + ttl),
        };
        match self.entries.entry(key.to_string()) {
            Entry::Occupied(occupied) if occupied.get().is_live(now) => Ok(false),
            Entry::Occupied(mut occupied) => {
                occupied.insert(fresh);
                Ok(true)
            }
            Entry::Vacant(vacant) => {
                vacant.insert(fresh);
                Ok(true)
            }
        }
    }

    async fn incr(&self, key: &str) -> Result<i64, StoreError> {
        Ok(self.add(key, 1))
    }

    async fn decr(&self, key: &str) -> Result<i64, StoreError> {
        Ok(self.add(key, -1))
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<(), StoreError> {
        let now = Instant::now();
        if let Some(mut slot) = self.entries.get_mut(key) {
            if slot.is_live(now) {
                slot.expires_at = Some(now + ttl);
            }
        }
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<i64>, StoreError> {
        let now = Instant::now();
        Ok(self
            .entries
            .get(key)
            .filter(|slot| slot.is_live(now))
            .map(|slot| slot.value))
    }

    async fn del(&self, key: &str) -> Result<(), StoreError> {
        self.entries.remove(key);
        Ok(())
    }
}
