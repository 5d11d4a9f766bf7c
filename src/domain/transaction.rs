use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Initiated,
    Pending,
    Processing,
    Success,
    Failed,
    Cancelled,
    Expired,
    Refunded,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Initiated => "initiated",
            PaymentStatus::Pending => "pending",
            PaymentStatus::Processing => "processing",
            PaymentStatus::Success => "success",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Cancelled => "cancelled",
            PaymentStatus::Expired => "expired",
            PaymentStatus::Refunded => "refunded",
        }
    }

    pub fn parse(s: &str) -> Option<PaymentStatus> {
        match s {
            "initiated" => Some(PaymentStatus::Initiated),
            "pending" => Some(PaymentStatus::Pending),
            "processing" => Some(PaymentStatus::Processing),
            "success" => Some(PaymentStatus::Success),
            "failed" => Some(PaymentStatus::Failed),
            "cancelled" => Some(PaymentStatus::Cancelled),
            "expired" => Some(PaymentStatus::Expired),
            "refunded" => Some(PaymentStatus::Refunded),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentType {
    Payment,
    Payout,
    Refund,
}

impl PaymentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentType::Payment => "payment",
            PaymentType::Payout => "payout",
            PaymentType::Refund => "refund",
        }
    }

    pub fn parse(s: &str) -> Option<PaymentType> {
        match s {
            "payment" => Some(PaymentType::Payment),
            "payout" => Some(PaymentType::Payout),
            "refund" => Some(PaymentType::Refund),
            _ => None,
        }
    }
}

/// Order reference sent to MonCash, generated once per transaction.
pub fn generate_external_order_id() -> String {
    format!("ORD-{}", &Uuid::new_v4().simple().to_string()[..12].to_uppercase())
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreatePaymentRequest {
    pub order_id: Uuid,
    pub return_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatusCheckRequest {
    pub transaction_id: Option<String>,
    pub external_order_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreatePayoutRequest {
    pub receiver: String,
    pub amount: Decimal,
    pub description: String,
    pub reference: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateRefundRequest {
    pub transaction_id: Uuid,
    pub amount: Option<Decimal>,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TransactionView {
    pub id: Uuid,
    pub order_id: Option<Uuid>,
    pub payment_type: PaymentType,
    pub external_order_id: String,
    pub amount: Decimal,
    pub currency: String,
    pub status: PaymentStatus,
    pub gateway_transaction_id: String,
    pub gateway_reference: String,
    pub payer_phone: String,
    pub payment_initiated_at: chrono::DateTime<chrono::Utc>,
    pub payment_completed_at: Option<chrono::DateTime<chrono::Utc>>,
    pub payment_expires_at: Option<chrono::DateTime<chrono::Utc>>,
    pub retry_count: i32,
    pub max_retries: i32,
    pub response_message: String,
    pub response_code: String,
    pub gateway_url: Option<String>,
    pub is_expired: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreatePaymentResponse {
    pub transaction: TransactionView,
    pub payment_url: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusCheckResponse {
    pub transaction: TransactionView,
    pub gateway_message: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorEnvelope {
    pub error: ErrorPayload,
}

#[derive(Debug, Serialize)]
pub struct ErrorPayload {
    pub code: String,
    pub message: String,
    pub details: Option<String>,
}

pub fn err(code: &str, message: &str) -> ErrorEnvelope {
    ErrorEnvelope {
        error: ErrorPayload {
            code: code.to_string(),
            message: message.to_string(),
            details: None,
        },
    }
}

pub fn internal(e: anyhow::Error) -> (axum::http::StatusCode, ErrorEnvelope) {
    (
        axum::http::StatusCode::INTERNAL_SERVER_ERROR,
        err("INTERNAL_ERROR", &e.to_string()),
    )
}
