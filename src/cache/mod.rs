// 缓存模块
// 包含共享存储、缓存键和限流操作

pub mod keys;
pub mod operations;
pub mod store;

// 重新导出常用类型，方便其他模块使用
pub use operations::{DistributedLock, LockGuard, WindowCounter};
pub use store::{MemoryStore, RedisStore, Store};
