use crate::domain::transaction::{err, CreatePaymentRequest, ErrorEnvelope, StatusCheckRequest};
use crate::AppState;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

pub(crate) fn user_id(headers: &HeaderMap) -> Result<String, (StatusCode, ErrorEnvelope)> {
    headers
        .get("X-User-Id")
        .and_then(|h| h.to_str().ok())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .ok_or_else(|| {
            (
                StatusCode::UNAUTHORIZED,
                err("MISSING_USER_ID", "X-User-Id header is required"),
            )
        })
}

fn client_ip(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|h| h.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|s| s.trim().to_string())
}

pub async fn create_payment(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<CreatePaymentRequest>,
) -> impl IntoResponse {
    let user = match user_id(&headers) {
        Ok(u) => u,
        Err((status, body)) => return (status, Json(body)).into_response(),
    };
    let user_agent = headers
        .get(axum::http::header::USER_AGENT)
        .and_then(|h| h.to_str().ok())
        .unwrap_or_default()
        .to_string();

    match state
        .payment_service
        .create_payment(req, &user, user_agent, client_ip(&headers))
        .await
    {
        Ok(resp) => (StatusCode::CREATED, Json(resp)).into_response(),
        Err((status, body)) => (status, Json(body)).into_response(),
    }
}

pub async fn check_status(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<StatusCheckRequest>,
) -> impl IntoResponse {
    let user = match user_id(&headers) {
        Ok(u) => u,
        Err((status, body)) => return (status, Json(body)).into_response(),
    };

    match state.payment_service.check_status(req, &user).await {
        Ok(resp) => (StatusCode::OK, Json(resp)).into_response(),
        Err((status, body)) => (status, Json(body)).into_response(),
    }
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub status: Option<String>,
}

pub async fn list_transactions(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<ListQuery>,
) -> impl IntoResponse {
    let user = match user_id(&headers) {
        Ok(u) => u,
        Err((status, body)) => return (status, Json(body)).into_response(),
    };

    match state.payment_service.list_transactions(&user, query.status).await {
        Ok(resp) => (StatusCode::OK, Json(resp)).into_response(),
        Err((status, body)) => (status, Json(body)).into_response(),
    }
}

pub async fn get_transaction(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    let user = match user_id(&headers) {
        Ok(u) => u,
        Err((status, body)) => return (status, Json(body)).into_response(),
    };

    match state.payment_service.get_transaction(id, &user).await {
        Ok(resp) => (StatusCode::OK, Json(resp)).into_response(),
        Err((status, body)) => (status, Json(body)).into_response(),
    }
}

pub async fn get_transaction_history(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    let user = match user_id(&headers) {
        Ok(u) => u,
        Err((status, body)) => return (status, Json(body)).into_response(),
    };

    match state.payment_service.transaction_history(id, &user).await {
        Ok(resp) => (StatusCode::OK, Json(resp)).into_response(),
        Err((status, body)) => (status, Json(body)).into_response(),
    }
}

pub async fn retry_transaction(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    let user = match user_id(&headers) {
        Ok(u) => u,
        Err((status, body)) => return (status, Json(body)).into_response(),
    };

    match state.payment_service.retry(id, &user).await {
        Ok(resp) => (StatusCode::OK, Json(resp)).into_response(),
        Err((status, body)) => (status, Json(body)).into_response(),
    }
}

pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}
