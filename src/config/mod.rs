use std::env;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use axum::http::HeaderName;
use thiserror::Error;

mod quota;

pub use quota::QuotaConfig;

const DEFAULT_QUOTAS: &str = "1234=5,2345=10";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {name}: {value:?}")]
    InvalidValue { name: &'static str, value: String },
    #[error("invalid quota entry {0:?}, expected `key=limit`")]
    InvalidQuota(String),
}

/// 共享存储后端
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Redis,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "redis" => Ok(StoreBackend::Redis),
            "memory" => Ok(StoreBackend::Memory),
            _ => Err(ConfigError::InvalidValue {
                name: "STORE_BACKEND",
                value: s.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server_host: String,
    pub server_port: u16,
    pub store_backend: StoreBackend,
    pub redis_url: String,
    pub api_key_header: HeaderName,
    pub rate_limit_window_secs: u64,
    pub lock_lease_secs: u64,
    pub request_timeout_secs: u64,
    pub quotas: Arc<QuotaConfig>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// 从任意键值来源读取配置，缺省项使用默认值
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str, default: &str| lookup(name).unwrap_or_else(|| default.to_string());

        Ok(Config {
            server_host: var("SERVER_HOST", "0.0.0.0"),
            server_port: parse_var("SERVER_PORT", var("SERVER_PORT", "3000"))?,
            store_backend: parse_var("STORE_BACKEND", var("STORE_BACKEND", "redis"))?,
            redis_url: var("REDIS_URL", "redis://127.0.0.1:6379"),
            api_key_header: parse_var("API_KEY_HEADER", var("API_KEY_HEADER", "x-api-key"))?,
            rate_limit_window_secs: parse_secs(
                "RATE_LIMIT_WINDOW_SECS",
                var("RATE_LIMIT_WINDOW_SECS", "60"),
            )?,
            lock_lease_secs: parse_secs("LOCK_LEASE_SECS", var("LOCK_LEASE_SECS", "300"))?,
            request_timeout_secs: parse_secs(
                "REQUEST_TIMEOUT_SECS",
                var("REQUEST_TIMEOUT_SECS", "30"),
            )?,
            quotas: Arc::new(
                var("RATE_LIMIT_QUOTAS", DEFAULT_QUOTAS).parse::<QuotaConfig>()?,
            ),
        })
    }

    pub fn rate_limit_window(&self) -> Duration {
        Duration::from_secs(self.rate_limit_window_secs)
    }

    pub fn lock_lease(&self) -> Duration {
        Duration::from_secs(self.lock_lease_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn parse_var<T: FromStr>(name: &'static str, value: String) -> Result<T, ConfigError> {
    let parsed = value.trim().parse::<T>();
    parsed.map_err(|_| ConfigError::InvalidValue { name, value })
}

/// 时长必须为正数
fn parse_secs(name: &'static str, value: String) -> Result<u64, ConfigError> {
    match parse_var::<u64>(name, value.clone())? {
        0 => Err(ConfigError::InvalidValue { name, value }),
        secs => Ok(secs),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.server_port, 3000);
        assert_eq!(config.store_backend, StoreBackend::Redis);
        assert_eq!(config.redis_url, "redis://127.0.0.1:6379");
        assert_eq!(config.api_key_header, "x-api-key");
        assert_eq!(config.rate_limit_window(), Duration::from_secs(60));
        assert_eq!(config.lock_lease(), Duration::from_secs(300));
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert_eq!(config.quotas.limit_for("1234"), 5);
        assert_eq!(config.quotas.limit_for("2345"), 10);
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("SERVER_PORT", "8080"),
            ("STORE_BACKEND", "Memory"),
            ("API_KEY_HEADER", "X-Client-Key"),
            ("RATE_LIMIT_WINDOW_SECS", "10"),
            ("RATE_LIMIT_QUOTAS", "abc=1"),
        ])
        .unwrap();
        assert_eq!(config.server_port, 8080);
        assert_eq!(config.store_backend, StoreBackend::Memory);
        assert_eq!(config.api_key_header, "x-client-key");
        assert_eq!(config.rate_limit_window(), Duration::from_secs(10));
        assert_eq!(config.quotas.limit_for("abc"), 1);
        assert_eq!(config.quotas.limit_for("1234"), 0);
    }

    #[test]
    fn test_parse_store_backend() {
        assert_eq!(" REDIS ".parse::<StoreBackend>().unwrap(), StoreBackend::Redis);
        assert_eq!("memory".parse::<StoreBackend>().unwrap(), StoreBackend::Memory);

        let err = "etcd".parse::<StoreBackend>().unwrap_err();
        assert_eq!(err.to_string(), r#"invalid value for STORE_BACKEND: "etcd""#);
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(
            config_from(&[("SERVER_PORT", "http")]),
            Err(ConfigError::InvalidValue { name: "SERVER_PORT", .. })
        ));
        assert!(matches!(
            config_from(&[("STORE_BACKEND", "etcd")]),
            Err(ConfigError::InvalidValue { name: "STORE_BACKEND", .. })
        ));
        assert!(matches!(
            config_from(&[("LOCK_LEASE_SECS", "0")]),
            Err(ConfigError::InvalidValue { name: "LOCK_LEASE_SECS", .. })
        ));
        assert!(matches!(
            config_from(&[("API_KEY_HEADER", "bad header")]),
            Err(ConfigError::InvalidValue { name: "API_KEY_HEADER", .. })
        ));
        assert!(matches!(
            config_from(&[("RATE_LIMIT_QUOTAS", "1234:5")]),
            Err(ConfigError::InvalidQuota(_))
        ));
    }
}
