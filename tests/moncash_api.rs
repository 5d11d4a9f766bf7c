use afepanou_payments::moncash::mock::MockMoncash;
use afepanou_payments::moncash::token::{needs_refresh, RENEW_BUFFER_SECS};
use afepanou_payments::moncash::{
    parse_balance, parse_customer_status, parse_payment_details, parse_payment_token,
    parse_transfer_details, redirect_url, MoncashApi, MoncashError,
};
use rust_decimal::Decimal;
use serde_json::json;

#[test]
fn redirect_url_embeds_the_token() {
    let url = redirect_url("https://sandbox.moncashbutton.digicelgroup.com/Moncash-middleware", "tok-1");
    assert_eq!(
        url,
        "https://sandbox.moncashbutton.digicelgroup.com/Moncash-middleware/Payment/Redirect?token=tok-1"
    );

    // trailing slash must not double up
    let url = redirect_url("https://host/base/", "tok-2");
    assert_eq!(url, "https://host/base/Payment/Redirect?token=tok-2");
}

#[test]
fn token_renews_inside_the_buffer() {
    // 59s tokens renew once 10s from expiry
    assert!(!needs_refresh(0, 59));
    assert!(!needs_refresh(48, 59));
    assert!(needs_refresh(49, 59));
    assert!(needs_refresh(59, 59));
    assert_eq!(RENEW_BUFFER_SECS, 10);
}

#[test]
fn create_payment_response_parses() {
    let raw = json!({
        "path": "/v1/CreatePayment",
        "payment_token": {
            "expired": "2024-01-01T00:10:00",
            "created": "2024-01-01T00:00:00",
            "token": "9ae6cb1..."
        },
        "timestamp": 1704067200,
        "status": 202
    });
    assert_eq!(parse_payment_token(&raw).unwrap(), "9ae6cb1...");
}

#[test]
fn create_payment_without_token_is_malformed() {
    let raw = json!({"status": 202});
    assert!(matches!(
        parse_payment_token(&raw),
        Err(MoncashError::Malformed("payment_token.token"))
    ));
}

#[test]
fn retrieve_payment_response_parses() {
    let raw = json!({
        "path": "/v1/RetrieveTransactionPayment",
        "payment": {
            "reference": "ref-001",
            "transaction_id": "2021450",
            "cost": 1500,
            "message": "successful",
            "payer": "50937000001"
        },
        "timestamp": 1704067200,
        "status": 200
    });

    let details = parse_payment_details(&raw).unwrap();
    assert_eq!(details.transaction_id, "2021450");
    assert_eq!(details.reference, "ref-001");
    assert_eq!(details.message, "successful");
    assert_eq!(details.payer, "50937000001");
    assert_eq!(details.cost, Some(Decimal::from(1500)));
}

#[test]
fn payment_cost_accepts_string_amounts() {
    let raw = json!({"payment": {"message": "successful", "cost": "1500.50"}});
    let details = parse_payment_details(&raw).unwrap();
    assert_eq!(details.cost, Some(Decimal::new(150050, 2)));
}

#[test]
fn payment_without_message_is_malformed() {
    let raw = json!({"payment": {"transaction_id": "2021450"}});
    assert!(matches!(
        parse_payment_details(&raw),
        Err(MoncashError::Malformed("payment.message"))
    ));
}

#[test]
fn transfer_response_parses() {
    let raw = json!({
        "transfer": {
            "transaction_id": "7000123",
            "amount": "500",
            "receiver": "50937000002",
            "message": "successful",
            "desc": "vendor payout"
        },
        "status": 200
    });

    let transfer = parse_transfer_details(&raw).unwrap();
    assert_eq!(transfer.transaction_id, "7000123");
    assert_eq!(transfer.receiver, "50937000002");
    assert_eq!(transfer.message, "successful");
}

#[test]
fn balance_parses_string_and_number() {
    let b = parse_balance(&json!({"balance": "12500.75", "currency": "HTG"})).unwrap();
    assert_eq!(b.balance, Decimal::new(1250075, 2));
    assert_eq!(b.currency, "HTG");

    let b = parse_balance(&json!({"balance": 300})).unwrap();
    assert_eq!(b.balance, Decimal::from(300));
    assert_eq!(b.currency, "HTG");
}

#[test]
fn customer_status_parses() {
    let s = parse_customer_status(&json!({"account": "50937000001", "kyc_level": "full", "active": true}))
        .unwrap();
    assert_eq!(s.account, "50937000001");
    assert_eq!(s.kyc_level, "full");
    assert!(s.active);
}

#[tokio::test]
async fn mock_gateway_round_trip() {
    let gateway = MockMoncash::success();

    let created = gateway
        .create_payment("ORD-ABCDEF123456", Decimal::from(1500))
        .await
        .unwrap();
    assert!(!created.token.is_empty());
    assert!(created.redirect_url.contains(&created.token));

    let details = gateway
        .payment_by_order_id("ORD-ABCDEF123456")
        .await
        .unwrap();
    assert_eq!(details.message, "successful");
}

#[tokio::test]
async fn mock_gateway_api_down_surfaces_api_error() {
    let gateway = MockMoncash {
        behavior: "API_DOWN".to_string(),
    };

    let err = gateway
        .create_payment("ORD-ABCDEF123456", Decimal::from(1500))
        .await
        .unwrap_err();
    assert!(matches!(err, MoncashError::Api { status: 503, .. }));
}
