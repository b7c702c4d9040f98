use axum::Json;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

/// 共享存储访问失败
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),
    #[error("store command task was aborted")]
    Interrupted,
}

/// 限流网关拒绝请求的原因
#[derive(Debug, Error)]
pub enum Rejection {
    #[error("request quota exceeded for the current window")]
    QuotaExceeded,
    #[error("limiter key is locked by another request")]
    LockContention,
    #[error("failed to lock limiter key")]
    LockFailed(#[source] StoreError),
    #[error("failed to add to window counter")]
    CounterFailed(#[source] StoreError),
}

impl Rejection {
    pub fn status(&self) -> StatusCode {
        match self {
            Rejection::QuotaExceeded => StatusCode::TOO_MANY_REQUESTS,
            Rejection::LockContention | Rejection::LockFailed(_) | Rejection::CounterFailed(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    message: String,
}

impl IntoResponse for Rejection {
    fn into_response(self) -> Response {
        let status = self.status();
        // 存储层的错误细节不返回给客户端
        let message = match self {
            Rejection::QuotaExceeded => status
                .canonical_reason()
                .unwrap_or("Too Many Requests")
                .to_string(),
            _ => "cannot process this request".to_string(),
        };

        (status, Json(ErrorResponse { message })).into_response()
    }
}
