use crate::domain::transaction::err;
use axum::body::Body;
use axum::extract::State;
use axum::http::{Request, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use redis::AsyncCommands;

/// Fixed-window per-IP limiter in front of the payment endpoints. The
/// webhook path gets a higher ceiling so a gateway burst is not dropped.
#[derive(Clone)]
pub struct RateLimitState {
    pub redis_client: redis::Client,
    pub max_per_minute: i64,
    pub webhook_max_per_minute: i64,
}

pub async fn enforce(
    State(state): State<RateLimitState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let ip = request
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .split(',')
        .next()
        .unwrap_or("unknown")
        .trim()
        .to_string();

    let is_webhook = request.uri().path().ends_with("/callback");
    let limit = if is_webhook {
        state.webhook_max_per_minute
    } else {
        state.max_per_minute
    };

    let key = format!(
        "payments:rate:{}:{}",
        ip,
        chrono::Utc::now().format("%Y%m%d%H%M")
    );

    if let Ok(mut conn) = state.redis_client.get_multiplexed_async_connection().await {
        let count: i64 = conn.incr(&key, 1).await.unwrap_or(1);
        let _: bool = conn.expire(&key, 120).await.unwrap_or(false);
        if count > limit {
            return (
                StatusCode::TOO_MANY_REQUESTS,
                Json(err("RATE_LIMITED", "too many requests, slow down")),
            )
                .into_response();
        }
    }

    next.run(request).await
}
