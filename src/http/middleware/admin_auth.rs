use crate::domain::transaction::err;
use axum::body::Body;
use axum::extract::State;
use axum::http::{Request, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;

/// Guards the payout/refund/balance surface. The key is shared with the ERP
/// backoffice, not with marketplace customers.
pub async fn require_internal_api_key(
    State(expected): State<String>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let provided = request
        .headers()
        .get("X-Internal-Api-Key")
        .and_then(|h| h.to_str().ok())
        .unwrap_or("");

    if provided != expected {
        return (
            StatusCode::UNAUTHORIZED,
            Json(err("ADMIN_KEY_REQUIRED", "valid X-Internal-Api-Key header is required")),
        )
            .into_response();
    }

    next.run(request).await
}
