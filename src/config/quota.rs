use std::collections::HashMap;
use std::str::FromStr;

use super::ConfigError;

/// 每个 API key 在一个窗口内允许的最大请求数
///
/// 启动时构建一次，之后只读。未配置的 key 限额为 0，即始终拒绝。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuotaConfig {
    limits: HashMap<String, u64>,
}

impl QuotaConfig {
    pub fn limit_for(&self, api_key: &str) -> u64 {
        self.limits.get(api_key).copied().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.limits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.limits.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, u64)> for QuotaConfig {
    fn from_iter<I: IntoIterator<Item = (K, u64)>>(iter: I) -> Self {
        Self {
            limits: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

/// 解析 `key=limit,key=limit` 格式，重复的 key 以最后一项为准
impl FromStr for QuotaConfig {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut limits = HashMap::new();
        for entry in s.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let (key, limit) = entry
                .split_once('=')
                .ok_or_else(|| ConfigError::InvalidQuota(entry.to_string()))?;
            let limit = limit
                .trim()
                .parse::<u64>()
                .map_err(|_| ConfigError::InvalidQuota(entry.to_string()))?;
            limits.insert(key.trim().to_string(), limit);
        }
        Ok(Self { limits })
    }
}
