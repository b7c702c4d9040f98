/// 缓存键模块
/// 提供限流相关的键生成函数
pub mod limiter_keys;

pub use limiter_keys::{caller_key, lock_key};
