use crate::domain::transaction::CreatePayoutRequest;
use crate::AppState;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use uuid::Uuid;

fn operator(headers: &HeaderMap) -> String {
    headers
        .get("X-Operator")
        .and_then(|h| h.to_str().ok())
        .filter(|s| !s.is_empty())
        .unwrap_or("admin")
        .to_string()
}

pub async fn create_payout(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<CreatePayoutRequest>,
) -> impl IntoResponse {
    match state
        .payment_service
        .create_payout(req, &operator(&headers))
        .await
    {
        Ok(resp) => (StatusCode::CREATED, Json(resp)).into_response(),
        Err((status, body)) => (status, Json(body)).into_response(),
    }
}

pub async fn payout_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    match state.payment_service.payout_status(id).await {
        Ok(resp) => (StatusCode::OK, Json(resp)).into_response(),
        Err((status, body)) => (status, Json(body)).into_response(),
    }
}
