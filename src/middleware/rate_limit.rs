use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{HeaderName, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::{debug, error, warn};

use crate::{
    cache::{DistributedLock, Store, WindowCounter, keys::caller_key},
    config::{Config, QuotaConfig},
    error::Rejection,
    utils::client_ip,
};

/// 限流主体：API key 加客户端地址
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerIdentity {
    pub api_key: String,
    pub client_addr: String,
}

impl CallerIdentity {
    pub fn new(api_key: impl Into<String>, client_addr: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            client_addr: client_addr.into(),
        }
    }

    pub fn key(&self) -> String {
        caller_key(&self.api_key, &self.client_addr)
    }
}

/// 基于共享存储的固定窗口限流器
///
/// 同一调用方的“读计数 + 自增”在分布式锁内串行执行，
/// 不同调用方之间互不阻塞。
#[derive(Clone)]
pub struct RateLimiter {
    lock: DistributedLock,
    counter: WindowCounter,
    quotas: Arc<QuotaConfig>,
    api_key_header: HeaderName,
}

impl RateLimiter {
    pub fn new(store: Arc<dyn Store>, config: &Config) -> Self {
        Self {
            lock: DistributedLock::new(Arc::clone(&store), config.lock_lease()),
            counter: WindowCounter::new(store, config.rate_limit_window()),
            quotas: Arc::clone(&config.quotas),
            api_key_header: config.api_key_header.clone(),
        }
    }

    /// 从请求中提取调用方身份，缺少 API key 时使用空字符串
    pub fn identify<B>(&self, req: &Request<B>) -> CallerIdentity {
        let api_key = req
            .headers()
            .get(&self.api_key_header)
            .and_then(|h| h.to_str().ok())
            .unwrap_or_default();
        CallerIdentity::new(api_key, client_ip(req))
    }

    /// 判定一次请求是否放行
    ///
    /// 锁在返回前释放；如果这个 future 被中途丢弃，锁守卫会在后台释放。
    pub async fn admit(&self, caller: &CallerIdentity) -> Result<(), Rejection> {
        let caller_key = caller.key();

        let guard = match self.lock.acquire(&caller_key).await {
            Ok(Some(guard)) => guard,
            Ok(None) => {
                error!(
                    ip_address = %caller.client_addr,
                    api_key = %caller.api_key,
                    "failed to lock limiter key"
                );
                return Err(Rejection::LockContention);
            }
            Err(err) => {
                error!(
                    ip_address = %caller.client_addr,
                    api_key = %caller.api_key,
                    error = %err,
                    "can't lock limiter key"
                );
                return Err(Rejection::LockFailed(err));
            }
        };

        let outcome = self.check_and_count(caller, &caller_key).await;

        if let Err(err) = guard.release().await {
            warn!(
                ip_address = %caller.client_addr,
                api_key = %caller.api_key,
                error = %err,
                "can't unlock limiter key, waiting for lease expiry"
            );
        }

        outcome
    }

    async fn check_and_count(
        &self,
        caller: &CallerIdentity,
        caller_key: &str,
    ) -> Result<(), Rejection> {
        let limit = self.quotas.limit_for(&caller.api_key);

        if !self.counter.is_below(caller_key, limit).await {
            debug!(
                ip_address = %caller.client_addr,
                api_key = %caller.api_key,
                limit,
                "too many requests"
            );
            return Err(Rejection::QuotaExceeded);
        }

        let count = self.counter.increment(caller_key).await.map_err(|err| {
            error!(
                ip_address = %caller.client_addr,
                api_key = %caller.api_key,
                error = %err,
                "can't add limiter key"
            );
            Rejection::CounterFailed(err)
        })?;

        debug!(
            ip_address = %caller.client_addr,
            api_key = %caller.api_key,
            count,
            limit,
            "request admitted"
        );
        Ok(())
    }
}

pub async fn rate_limit(
    State(limiter): State<Arc<RateLimiter>>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let caller = limiter.identify(&req);

    match limiter.admit(&caller).await {
        Ok(()) => next.run(req).await,
        Err(rejection) => rejection.into_response(),
    }
}
