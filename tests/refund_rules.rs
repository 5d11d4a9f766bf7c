use afepanou_payments::domain::lifecycle::{refund_allowed, refundable_amount};
use rust_decimal::Decimal;

#[test]
fn refund_above_original_amount_is_rejected() {
    // 2000 HTG against a 1500 HTG payment
    assert!(!refund_allowed(
        Decimal::from(1500),
        Decimal::ZERO,
        Decimal::from(2000)
    ));
}

#[test]
fn full_refund_of_original_amount_is_allowed() {
    assert!(refund_allowed(
        Decimal::from(1500),
        Decimal::ZERO,
        Decimal::from(1500)
    ));
}

#[test]
fn cumulative_refunds_never_exceed_original() {
    let original = Decimal::from(1500);
    let already = Decimal::from(1000);

    assert!(refund_allowed(original, already, Decimal::from(500)));
    assert!(!refund_allowed(original, already, Decimal::from(501)));
}

#[test]
fn zero_and_negative_refunds_are_rejected() {
    assert!(!refund_allowed(Decimal::from(1500), Decimal::ZERO, Decimal::ZERO));
    assert!(!refund_allowed(
        Decimal::from(1500),
        Decimal::ZERO,
        Decimal::from(-10)
    ));
}

#[test]
fn refundable_amount_tracks_prior_refunds() {
    let original = Decimal::from(1500);
    assert_eq!(refundable_amount(original, Decimal::ZERO), Decimal::from(1500));
    assert_eq!(
        refundable_amount(original, Decimal::from(600)),
        Decimal::from(900)
    );
    assert_eq!(refundable_amount(original, Decimal::from(1500)), Decimal::ZERO);
}

#[test]
fn overdrawn_history_clamps_to_zero() {
    assert_eq!(
        refundable_amount(Decimal::from(1500), Decimal::from(2000)),
        Decimal::ZERO
    );
}

#[test]
fn fractional_gourde_amounts_are_exact() {
    let original = Decimal::new(150050, 2); // 1500.50
    let already = Decimal::new(50, 2); // 0.50
    assert!(refund_allowed(original, already, Decimal::from(1500)));
    assert!(!refund_allowed(original, already, Decimal::new(150001, 2)));
}
