//! Rounding rules and shared constants.
//!
//! Every monetary sub-total is rounded where it is produced so that a
//! recalculation on unchanged inputs reproduces every stored value exactly.

use rust_decimal::{Decimal, RoundingStrategy};

/// Decimal places kept for monetary amounts (whole currency units).
pub const MONEY_DECIMALS: u32 = 0;

/// Decimal places kept for hourly rates.
pub const RATE_DECIMALS: u32 = 2;

/// Share of pay applied to probation work (85%).
pub const PROBATION_FACTOR: Decimal = Decimal::from_parts(85, 0, 0, false, 2);

/// Hours in a standard working day.
pub const STANDARD_HOURS_PER_DAY: Decimal = Decimal::from_parts(8, 0, 0, false, 0);

/// Rounds a monetary amount to whole currency units, half away from zero.
///
/// # Examples
///
/// ```
/// use payroll_engine::calculation::round_money;
/// use rust_decimal::Decimal;
/// use std::str::FromStr;
///
/// assert_eq!(round_money(Decimal::from_str("1234.5").unwrap()), Decimal::from(1235));
/// assert_eq!(round_money(Decimal::from_str("-1234.5").unwrap()), Decimal::from(-1235));
/// ```
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(MONEY_DECIMALS, RoundingStrategy::MidpointAwayFromZero)
}

/// Rounds a rate to two decimal places, half away from zero.
pub fn round_rate(rate: Decimal) -> Decimal {
    rate.round_dp_with_strategy(RATE_DECIMALS, RoundingStrategy::MidpointAwayFromZero)
}
