use afepanou_payments::service::reconciliation::{extract_match_key, MatchKey};
use serde_json::json;

#[test]
fn transaction_id_wins_over_order_id() {
    let payload = json!({"transactionId": "txn-123", "orderId": "ORD-AAAA"});
    assert_eq!(
        extract_match_key(&payload),
        Some(MatchKey::TransactionId("txn-123".to_string()))
    );
}

#[test]
fn falls_back_to_order_id() {
    let payload = json!({"orderId": "ORD-AAAA", "message": "successful"});
    assert_eq!(
        extract_match_key(&payload),
        Some(MatchKey::OrderId("ORD-AAAA".to_string()))
    );
}

#[test]
fn empty_transaction_id_falls_back() {
    let payload = json!({"transactionId": "", "orderId": "ORD-AAAA"});
    assert_eq!(
        extract_match_key(&payload),
        Some(MatchKey::OrderId("ORD-AAAA".to_string()))
    );
}

#[test]
fn missing_both_keys_is_unmatchable() {
    assert_eq!(extract_match_key(&json!({"message": "successful"})), None);
    assert_eq!(extract_match_key(&json!({})), None);
}

#[test]
fn non_string_keys_are_ignored() {
    let payload = json!({"transactionId": 42, "orderId": {"nested": true}});
    assert_eq!(extract_match_key(&payload), None);
}
