use crate::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

/// Public callback invoked by MonCash. The raw body is persisted before any
/// processing; failures leave the notification unprocessed for inspection.
pub async fn moncash_callback(
    State(state): State<AppState>,
    Json(payload): Json<serde_json::Value>,
) -> impl IntoResponse {
    match state.reconciler.process_webhook(payload).await {
        Ok(outcome) => (StatusCode::OK, Json(serde_json::json!({
            "processed": true,
            "transaction_id": outcome.transaction_id,
            "status": outcome.status,
        })))
            .into_response(),
        Err((status, body)) => (status, Json(body)).into_response(),
    }
}
