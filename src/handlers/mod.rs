use axum::Json;
use serde::Serialize;

#[derive(Serialize)]
pub struct MessageResponse {
    message: &'static str,
}

/// 通过限流后的业务处理
pub async fn index() -> Json<MessageResponse> {
    tracing::debug!("handling request");
    Json(MessageResponse { message: "ok" })
}
