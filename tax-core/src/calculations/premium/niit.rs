//! Net investment income tax.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::calculations::common::{non_negative, round_half_up};
use crate::calculations::diagnostics::{Diagnostics, Outcome, Warning};
use crate::models::{FilingStatus, NiitConstants};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NiitResult {
    pub tax: Decimal,
    /// MAGI above the filing-status threshold.
    pub excess_magi: Decimal,
    /// The smaller of investment income and the excess, the amount taxed.
    pub taxed_amount: Decimal,
}

impl NiitResult {
    fn zero() -> Self {
        Self {
            tax: Decimal::ZERO,
            excess_magi: Decimal::ZERO,
            taxed_amount: Decimal::ZERO,
        }
    }
}

/// `rate × min(net investment income, MAGI − threshold)`.
///
/// ```
/// use rust_decimal_macros::dec;
/// use tax_core::calculations::premium::niit::compute_niit;
/// use tax_core::models::{FilingStatus, FilingStatusTable, NiitConstants};
///
/// let constants = NiitConstants {
///     rate: dec!(0.038),
///     threshold: FilingStatusTable::uniform(dec!(200000)),
/// };
///
/// let outcome = compute_niit(dec!(30000), dec!(210000), FilingStatus::Single, Some(&constants));
///
/// assert_eq!(outcome.value.tax, dec!(380.00));
/// ```
pub fn compute_niit(
    net_investment_income: Decimal,
    magi: Decimal,
    filing_status: FilingStatus,
    constants: Option<&NiitConstants>,
) -> Outcome<NiitResult> {
    let mut diagnostics = Diagnostics::new();
    let Some(constants) = constants else {
        diagnostics.warn(Warning::MissingConstants {
            block: "niit".to_string(),
        });
        return Outcome::new(NiitResult::zero(), diagnostics);
    };
    let Some(threshold) = constants.threshold.get(filing_status).copied() else {
        diagnostics.warn(Warning::MissingConstants {
            block: format!("niit threshold for {filing_status}"),
        });
        return Outcome::new(NiitResult::zero(), diagnostics);
    };

    let excess_magi = non_negative(magi - threshold);
    let taxed_amount = non_negative(net_investment_income).min(excess_magi);

    Outcome::new(
        NiitResult {
            tax: round_half_up(taxed_amount * constants.rate),
            excess_magi,
            taxed_amount,
        },
        diagnostics,
    )
}
