//! Small numeric helpers shared by every calculator.

use rust_decimal::{Decimal, RoundingStrategy};

/// Rounds to cents, with exact half-cents rounded away from zero.
///
/// Every amount the engine reports passes through this, so two runs over the
/// same inputs agree to the cent.
///
/// # Examples
///
/// ```
/// use rust_decimal_macros::dec;
/// use tax_core::calculations::common::round_half_up;
///
/// assert_eq!(round_half_up(dec!(2678.1499)), dec!(2678.15));
/// assert_eq!(round_half_up(dec!(7064.775)), dec!(7064.78));
/// assert_eq!(round_half_up(dec!(-0.005)), dec!(-0.01));
/// ```
pub fn round_half_up(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Clamps negative amounts to zero.
///
/// # Examples
///
/// ```
/// use rust_decimal_macros::dec;
/// use tax_core::calculations::common::non_negative;
///
/// assert_eq!(non_negative(dec!(-12.50)), dec!(0));
/// assert_eq!(non_negative(dec!(12.50)), dec!(12.50));
/// ```
pub fn non_negative(value: Decimal) -> Decimal {
    value.max(Decimal::ZERO)
}

/// Number of started `step`s contained in `amount`, i.e. `ceil(amount / step)`.
///
/// Zero when either side is not positive.
pub fn started_steps(
    amount: Decimal,
    step: Decimal,
) -> Decimal {
    if amount <= Decimal::ZERO || step <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    (amount / step).ceil()
}
