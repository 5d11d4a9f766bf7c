use crate::domain::transaction::err;
use crate::AppState;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

pub async fn balance(State(state): State<AppState>) -> impl IntoResponse {
    match state.moncash.balance().await {
        Ok(balance) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "balance": balance.balance,
                "currency": balance.currency,
                "last_updated": chrono::Utc::now(),
            })),
        )
            .into_response(),
        Err(e) => (
            StatusCode::BAD_GATEWAY,
            Json(err("GATEWAY_ERROR", &format!("balance check failed: {e}"))),
        )
            .into_response(),
    }
}

pub async fn customer_status(
    State(state): State<AppState>,
    Path(account): Path<String>,
) -> impl IntoResponse {
    match state.moncash.customer_status(&account).await {
        Ok(status) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "account": status.account,
                "kyc_level": status.kyc_level,
                "active": status.active,
            })),
        )
            .into_response(),
        Err(e) => (
            StatusCode::BAD_GATEWAY,
            Json(err("GATEWAY_ERROR", &format!("customer status check failed: {e}"))),
        )
            .into_response(),
    }
}

pub async fn analytics(State(state): State<AppState>) -> impl IntoResponse {
    match state.payment_service.analytics().await {
        Ok(rollup) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "generated_at": chrono::Utc::now(),
                "rollup": rollup,
            })),
        )
            .into_response(),
        Err((status, body)) => (status, Json(body)).into_response(),
    }
}

#[derive(Debug, Deserialize)]
pub struct NotificationsQuery {
    pub limit: Option<i64>,
}

/// Unmatched webhook payloads awaiting manual inspection.
pub async fn unprocessed_notifications(
    State(state): State<AppState>,
    Query(query): Query<NotificationsQuery>,
) -> impl IntoResponse {
    let limit = query.limit.unwrap_or(50).clamp(1, 500);
    match state.notifications_repo.list_unprocessed(limit).await {
        Ok(rows) => (StatusCode::OK, Json(rows)).into_response(),
        Err(e) => {
            let (status, body) = crate::domain::transaction::internal(e);
            (status, Json(body)).into_response()
        }
    }
}
