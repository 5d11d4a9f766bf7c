use afepanou_payments::domain::lifecycle::{
    can_retry, default_expiry, expiry_due, is_settled, is_unsettled, transition_for_report,
};
use afepanou_payments::domain::transaction::{generate_external_order_id, PaymentStatus};

#[test]
fn successful_report_settles_pending_payment() {
    assert_eq!(
        transition_for_report(PaymentStatus::Pending, "successful"),
        Some(PaymentStatus::Success)
    );
    assert_eq!(
        transition_for_report(PaymentStatus::Initiated, "successful"),
        Some(PaymentStatus::Success)
    );
}

#[test]
fn report_casing_is_ignored() {
    assert_eq!(
        transition_for_report(PaymentStatus::Pending, "SUCCESSFUL"),
        Some(PaymentStatus::Success)
    );
}

#[test]
fn failed_report_moves_unsettled_to_failed() {
    assert_eq!(
        transition_for_report(PaymentStatus::Processing, "failed"),
        Some(PaymentStatus::Failed)
    );
}

#[test]
fn pending_report_only_moves_initiated() {
    assert_eq!(
        transition_for_report(PaymentStatus::Initiated, "pending"),
        Some(PaymentStatus::Pending)
    );
    assert_eq!(transition_for_report(PaymentStatus::Pending, "pending"), None);
}

#[test]
fn settled_statuses_never_move_on_reports() {
    for settled in [
        PaymentStatus::Success,
        PaymentStatus::Failed,
        PaymentStatus::Cancelled,
        PaymentStatus::Expired,
        PaymentStatus::Refunded,
    ] {
        assert_eq!(transition_for_report(settled, "successful"), None);
        assert_eq!(transition_for_report(settled, "failed"), None);
    }
}

#[test]
fn unknown_report_message_is_a_no_op() {
    assert_eq!(transition_for_report(PaymentStatus::Pending, "garbled"), None);
}

#[test]
fn retry_allowed_only_below_the_limit() {
    assert!(can_retry(PaymentStatus::Failed, 0, 3));
    assert!(can_retry(PaymentStatus::Expired, 2, 3));
    assert!(!can_retry(PaymentStatus::Failed, 3, 3));
    assert!(!can_retry(PaymentStatus::Expired, 5, 3));
}

#[test]
fn retry_requires_failed_or_expired() {
    assert!(!can_retry(PaymentStatus::Success, 0, 3));
    assert!(!can_retry(PaymentStatus::Pending, 0, 3));
    assert!(!can_retry(PaymentStatus::Cancelled, 0, 3));
    assert!(!can_retry(PaymentStatus::Refunded, 0, 3));
}

#[test]
fn payment_window_is_ten_minutes() {
    let now = chrono::Utc::now();
    assert_eq!(default_expiry(now) - now, chrono::Duration::minutes(10));
}

#[test]
fn expiry_applies_to_unsettled_past_the_window() {
    let now = chrono::Utc::now();
    let past = Some(now - chrono::Duration::minutes(1));
    let future = Some(now + chrono::Duration::minutes(1));

    assert!(expiry_due(PaymentStatus::Pending, past, now));
    assert!(expiry_due(PaymentStatus::Initiated, past, now));
    assert!(!expiry_due(PaymentStatus::Pending, future, now));
    assert!(!expiry_due(PaymentStatus::Pending, None, now));
}

#[test]
fn expiry_never_touches_settled_statuses() {
    let now = chrono::Utc::now();
    let past = Some(now - chrono::Duration::minutes(1));

    assert!(!expiry_due(PaymentStatus::Success, past, now));
    assert!(!expiry_due(PaymentStatus::Failed, past, now));
    assert!(!expiry_due(PaymentStatus::Cancelled, past, now));
}

#[test]
fn external_order_ids_have_the_moncash_shape() {
    let id = generate_external_order_id();
    assert!(id.starts_with("ORD-"));
    assert_eq!(id.len(), 16);
    assert!(id[4..].chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_lowercase()));

    // two draws never collide in practice
    assert_ne!(id, generate_external_order_id());
}

#[test]
fn status_partition_is_consistent() {
    for status in [
        PaymentStatus::Initiated,
        PaymentStatus::Pending,
        PaymentStatus::Processing,
        PaymentStatus::Success,
        PaymentStatus::Failed,
        PaymentStatus::Cancelled,
        PaymentStatus::Expired,
        PaymentStatus::Refunded,
    ] {
        assert_ne!(is_settled(status), is_unsettled(status));
        assert_eq!(PaymentStatus::parse(status.as_str()), Some(status));
    }
}
