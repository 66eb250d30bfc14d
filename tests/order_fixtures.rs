//! Integration tests replaying the scripted orders under `fixtures/`.
//!
//! With the default pricing (₹10.50 base delivery up to 1 km, ₹7.50 per started km after,
//! ₹6 platform fee, 5% GST):
//!
//! - `biryani-night`: ₹300 subtotal, 0.86 km, SAVE10 takes ₹30, ₹20 tip, total ₹321.50
//! - `chai-break`: ₹80 subtotal, 1.08 km, FLAT20 rejected below its ₹200 minimum, total ₹108
//! - `free-feast` with the festive coupons: DIWALI500 exceeds the ₹79.50 bill, total floored at 0

use rand::SeedableRng;
use rust_decimal::Decimal;
use rusty_money::{Money, iso::INR};
use testresult::TestResult;

use thali::{
    delivery::QuoteSource,
    fixtures::{Fixture, FixtureError},
    receipt::Receipt,
};

fn fixture() -> Fixture<'static> {
    Fixture::with_base_path(concat!(env!("CARGO_MANIFEST_DIR"), "/fixtures"))
}

fn inr(minor: i64) -> Money<'static, rusty_money::iso::Currency> {
    Money::from_minor(minor, INR)
}

#[test]
fn biryani_night_is_priced_end_to_end() -> TestResult {
    let mut fixture = fixture();
    fixture.load_pricing("default")?.load_coupons("standard")?;

    let session = fixture.order_session("biryani-night")?;
    let breakdown = session.breakdown()?;

    assert_eq!(session.delivery().source, QuoteSource::Computed);
    assert_eq!(breakdown.subtotal, inr(30_000));
    assert_eq!(breakdown.delivery, inr(1_050));
    assert_eq!(breakdown.platform_fee, inr(600));
    assert_eq!(breakdown.taxes_and_charges, inr(1_500));
    assert_eq!(breakdown.tip, inr(2_000));
    assert_eq!(breakdown.discount, inr(3_000));
    assert_eq!(breakdown.total, inr(32_150));
    assert!(!breakdown.clamped);

    Ok(())
}

#[test]
fn chai_break_keeps_the_rejected_coupon_message() -> TestResult {
    let session = fixture().order_session("chai-break")?;
    let breakdown = session.breakdown()?;

    let message = session.cart().coupon().and_then(|coupon| coupon.error_message());

    assert_eq!(
        message.as_deref(),
        Some("Minimum order of ₹200 required for FLAT20")
    );
    assert_eq!(breakdown.delivery, inr(1_800));
    assert_eq!(breakdown.discount, inr(0));
    assert_eq!(breakdown.total, inr(10_800));
    assert!(!session.cart().instructions().send_cutlery);

    Ok(())
}

#[test]
fn oversized_discount_floors_the_total() -> TestResult {
    let mut fixture = fixture();
    fixture.load_coupons("festive")?;

    let mut session = fixture.order_session("free-feast")?;
    let breakdown = session.breakdown()?;

    assert_eq!(breakdown.discount, inr(50_000));
    assert_eq!(breakdown.total, inr(0));
    assert!(breakdown.clamped);

    let mut out = Vec::new();
    Receipt::from_session(&session)?.write_to(&mut out)?;

    assert!(String::from_utf8(out)?.contains("total floored at zero"));

    let record = session.checkout(
        jiff::Timestamp::UNIX_EPOCH,
        &mut rand::rngs::StdRng::seed_from_u64(1),
    )?;

    assert_eq!(record.total, Decimal::ZERO);
    assert!(record.clamped);

    Ok(())
}

#[test]
fn weekend_pricing_changes_fees() -> TestResult {
    let mut fixture = fixture();
    fixture.load_pricing("weekend")?;

    let session = fixture.order_session("chai-break")?;
    let breakdown = session.breakdown()?;

    assert_eq!(breakdown.delivery, inr(2_500));
    assert_eq!(breakdown.platform_fee, inr(1_000));

    Ok(())
}

#[test]
fn missing_order_is_reported() {
    assert!(matches!(
        fixture().order_session("does-not-exist"),
        Err(FixtureError::Io(_))
    ));
}
