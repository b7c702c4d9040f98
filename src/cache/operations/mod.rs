/// 缓存操作
/// 基于共享存储的分布式锁和固定窗口计数器

// 分布式锁
pub mod lock;

// 窗口计数器
pub mod counter;

pub use counter::WindowCounter;
pub use lock::{DistributedLock, LockGuard};
