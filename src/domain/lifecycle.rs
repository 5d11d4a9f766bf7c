use crate::domain::transaction::PaymentStatus;
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;

/// MonCash payment links are valid for 10 minutes.
pub const PAYMENT_WINDOW_MINUTES: i64 = 10;

pub fn default_expiry(now: DateTime<Utc>) -> DateTime<Utc> {
    now + Duration::minutes(PAYMENT_WINDOW_MINUTES)
}

pub fn is_unsettled(status: PaymentStatus) -> bool {
    matches!(
        status,
        PaymentStatus::Initiated | PaymentStatus::Pending | PaymentStatus::Processing
    )
}

pub fn is_settled(status: PaymentStatus) -> bool {
    !is_unsettled(status)
}

pub fn can_retry(status: PaymentStatus, retry_count: i32, max_retries: i32) -> bool {
    matches!(status, PaymentStatus::Failed | PaymentStatus::Expired) && retry_count < max_retries
}

pub fn expiry_due(
    status: PaymentStatus,
    expires_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> bool {
    is_unsettled(status) && expires_at.is_some_and(|t| now > t)
}

/// Next status for a gateway-reported payment message, or None when the
/// report must not move the transaction. Settled transactions are immutable
/// here; `refunded` is only reachable through the refund flow.
pub fn transition_for_report(current: PaymentStatus, message: &str) -> Option<PaymentStatus> {
    if is_settled(current) {
        return None;
    }

    match message.to_ascii_lowercase().as_str() {
        "successful" => Some(PaymentStatus::Success),
        "failed" => Some(PaymentStatus::Failed),
        "cancelled" => Some(PaymentStatus::Cancelled),
        "pending" | "in progress" => {
            if current == PaymentStatus::Initiated {
                Some(PaymentStatus::Pending)
            } else {
                None
            }
        }
        _ => None,
    }
}

/// Remaining amount that may still be refunded against an original payment.
pub fn refundable_amount(original_amount: Decimal, already_refunded: Decimal) -> Decimal {
    let left = original_amount - already_refunded;
    if left < Decimal::ZERO {
        Decimal::ZERO
    } else {
        left
    }
}

pub fn refund_allowed(
    original_amount: Decimal,
    already_refunded: Decimal,
    requested: Decimal,
) -> bool {
    requested > Decimal::ZERO && requested <= refundable_amount(original_amount, already_refunded)
}
