//! Pricing policy for bid negotiation.
//!
//! Pure functions: the state machine uses them to validate proposals, the
//! query service uses them for display. Only discounts are negotiated, never
//! premiums, so the listed price is always the ceiling.

use crate::Amount;

/// Lowest fraction of the base price a student may propose, in percent.
///
/// Single source of truth for the bid floor; every call site must go through
/// [`minimum_bid`] rather than repeat the ratio.
pub const MIN_BID_PERCENT: i64 = 40;

/// The lowest admissible student proposal: `ceil(base * MIN_BID_PERCENT%)`,
/// with the ceiling taken at the fixed-point resolution.
pub fn minimum_bid(base_price: Amount) -> Amount {
    let base = base_price.scaled().max(0);
    let num = base as i128 * MIN_BID_PERCENT as i128;
    Amount::from_scaled((num as u128).div_ceil(100) as i64)
}

/// The highest admissible proposal: the listed price itself.
pub fn maximum_bid(base_price: Amount) -> Amount {
    base_price
}

/// Discount of `price` relative to `base_price`, rounded to the nearest
/// percent and clamped to `0..=100`. Zero when the base price is not positive.
pub fn discount_percent(base_price: Amount, price: Amount) -> u8 {
    let base = base_price.scaled();
    if base <= 0 {
        return 0;
    }
    let num = (base as i128 - price.scaled() as i128) * 100;
    if num <= 0 {
        return 0;
    }
    // round half up
    let pct = (num * 2 + base as i128) / (2 * base as i128);
    pct.clamp(0, 100) as u8
}

/// Whether a student proposal falls inside `[minimum_bid, maximum_bid]`,
/// both ends inclusive.
pub fn is_within_bounds(base_price: Amount, price: Amount) -> bool {
    price >= minimum_bid(base_price) && price <= maximum_bid(base_price)
}
