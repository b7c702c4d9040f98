/// 限流锁键后缀
const LOCK_SUFFIX: &str = "-lock";

/// 生成调用方键，同时作为窗口计数器的键
pub fn caller_key(api_key: &str, client_addr: &str) -> String {
    format!("{}:{}", api_key, client_addr)
}

/// 生成调用方的分布式锁键
pub fn lock_key(caller_key: &str) -> String {
    format!("{}{}", caller_key, LOCK_SUFFIX)
}
