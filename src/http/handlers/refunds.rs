use crate::domain::transaction::CreateRefundRequest;
use crate::AppState;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;

pub async fn create_refund(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<CreateRefundRequest>,
) -> impl IntoResponse {
    let operator = headers
        .get("X-Operator")
        .and_then(|h| h.to_str().ok())
        .filter(|s| !s.is_empty())
        .unwrap_or("admin")
        .to_string();

    match state.payment_service.create_refund(req, &operator).await {
        Ok(resp) => (StatusCode::CREATED, Json(resp)).into_response(),
        Err((status, body)) => (status, Json(body)).into_response(),
    }
}
