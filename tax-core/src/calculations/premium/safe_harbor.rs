//! Prior-year safe harbor for estimated payments.
//!
//! Paying the prior year's tax (110% of it for higher-income filers) in four
//! equal installments avoids the underpayment penalty regardless of what the
//! current year turns out to owe.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::calculations::common::{non_negative, round_half_up};
use crate::models::{FilingStatus, SafeHarborConstants};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SafeHarborResult {
    pub multiplier: Decimal,
    pub annual_required: Decimal,
    pub quarterly_required: Decimal,
}

/// # Example
///
/// ```
/// use rust_decimal_macros::dec;
/// use tax_core::calculations::premium::safe_harbor::compute_safe_harbor;
/// use tax_core::models::{FilingStatus, SafeHarborConstants};
///
/// let result = compute_safe_harbor(
///     dec!(20000),
///     dec!(180000),
///     FilingStatus::Single,
///     &SafeHarborConstants::default(),
/// );
///
/// assert_eq!(result.annual_required, dec!(22000.00));
/// assert_eq!(result.quarterly_required, dec!(5500.00));
/// ```
pub fn compute_safe_harbor(
    prior_year_tax: Decimal,
    prior_year_agi: Decimal,
    filing_status: FilingStatus,
    constants: &SafeHarborConstants,
) -> SafeHarborResult {
    let threshold = if filing_status == FilingStatus::MarriedFilingSeparately {
        constants.high_income_threshold_separate
    } else {
        constants.high_income_threshold
    };
    let multiplier = if prior_year_agi > threshold {
        constants.high_income_multiplier
    } else {
        Decimal::ONE
    };

    let annual_required = round_half_up(non_negative(prior_year_tax) * multiplier);
    SafeHarborResult {
        multiplier,
        annual_required,
        quarterly_required: round_half_up(annual_required / Decimal::from(4)),
    }
}
