use axum::{Router, http::StatusCode, routing::get};
use tower_http::{catch_panic::CatchPanicLayer, timeout::TimeoutLayer};

use crate::{
    AppState, handlers,
    middleware::{log_errors, rate_limit},
};

// 创建主路由
pub fn create_router(state: AppState) -> Router {
    let router = Router::new()
        .route("/", get(handlers::index))
        // 限流中间件在业务处理之前执行
        .layer(axum::middleware::from_fn_with_state(
            state.limiter.clone(),
            rate_limit,
        ))
        .layer(axum::middleware::from_fn(log_errors))
        // 超时会丢弃进行中的限流判定，锁由守卫负责释放；按基础设施错误返回 500
        .layer(TimeoutLayer::with_status_code(
            StatusCode::INTERNAL_SERVER_ERROR,
            state.config.request_timeout(),
        ))
        .layer(CatchPanicLayer::new());

    // 根据编译模式决定是否添加CORS
    #[cfg(debug_assertions)]
    let router = {
        tracing::debug!("Adding CORS layer for development mode");
        router.layer(tower_http::cors::CorsLayer::permissive())
    };

    router
}
