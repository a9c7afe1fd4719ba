//! Child tax credit and credit for other dependents.
//!
//! The combined credit is phased out in whole steps of income above the
//! threshold, then split into a non-refundable part limited by tax liability
//! and a refundable part limited per qualifying child.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::calculations::common::{non_negative, round_half_up, started_steps};
use crate::calculations::diagnostics::{Diagnostics, Outcome, Warning};
use crate::models::{ChildCreditConstants, FilingStatus};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChildCreditInput {
    pub filing_status: FilingStatus,
    pub qualifying_children: u32,
    pub other_dependents: u32,
    pub magi: Decimal,
    pub earned_income: Decimal,
    /// Federal income tax the non-refundable part can offset.
    pub tax_liability: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChildCreditResult {
    pub base_credit: Decimal,
    pub phaseout_reduction: Decimal,
    pub non_refundable: Decimal,
    pub refundable: Decimal,
}

impl ChildCreditResult {
    fn zero() -> Self {
        Self {
            base_credit: Decimal::ZERO,
            phaseout_reduction: Decimal::ZERO,
            non_refundable: Decimal::ZERO,
            refundable: Decimal::ZERO,
        }
    }

    pub fn total(&self) -> Decimal {
        self.non_refundable + self.refundable
    }
}

/// # Example
///
/// ```
/// use rust_decimal_macros::dec;
/// use tax_core::calculations::premium::child_credits::{ChildCreditInput, compute_child_credits};
/// use tax_core::models::{ChildCreditConstants, FilingStatus, FilingStatusTable};
///
/// let constants = ChildCreditConstants {
///     per_child: dec!(2000),
///     per_other_dependent: dec!(500),
///     phaseout_threshold: FilingStatusTable::uniform(dec!(200000)),
///     phaseout_step: dec!(1000),
///     phaseout_amount_per_step: dec!(50),
///     max_refundable_per_child: dec!(1700),
///     refundable_earned_income_threshold: None,
///     refundable_rate: None,
/// };
/// let input = ChildCreditInput {
///     filing_status: FilingStatus::Single,
///     qualifying_children: 2,
///     other_dependents: 0,
///     magi: dec!(60000),
///     earned_income: dec!(60000),
///     tax_liability: dec!(1500),
/// };
///
/// let credit = compute_child_credits(&input, Some(&constants)).value;
///
/// assert_eq!(credit.non_refundable, dec!(1500));
/// assert_eq!(credit.refundable, dec!(2500));
/// ```
pub fn compute_child_credits(
    input: &ChildCreditInput,
    constants: Option<&ChildCreditConstants>,
) -> Outcome<ChildCreditResult> {
    let mut diagnostics = Diagnostics::new();
    let Some(constants) = constants else {
        diagnostics.warn(Warning::MissingConstants {
            block: "child_credits".to_string(),
        });
        return Outcome::new(ChildCreditResult::zero(), diagnostics);
    };
    let Some(threshold) = constants
        .phaseout_threshold
        .get(input.filing_status)
        .copied()
    else {
        diagnostics.warn(Warning::MissingConstants {
            block: format!("child credit phase-out threshold for {}", input.filing_status),
        });
        return Outcome::new(ChildCreditResult::zero(), diagnostics);
    };

    let children = Decimal::from(input.qualifying_children);
    let others = Decimal::from(input.other_dependents);
    let base_credit = children * constants.per_child + others * constants.per_other_dependent;

    let excess = non_negative(input.magi - threshold);
    let phaseout_reduction =
        started_steps(excess, constants.phaseout_step) * constants.phaseout_amount_per_step;
    let after_phaseout = non_negative(base_credit - phaseout_reduction);

    let non_refundable = after_phaseout.min(non_negative(input.tax_liability));
    let mut refundable_cap = children * constants.max_refundable_per_child;
    if let (Some(floor), Some(rate)) = (
        constants.refundable_earned_income_threshold,
        constants.refundable_rate,
    ) {
        refundable_cap = refundable_cap.min(rate * non_negative(input.earned_income - floor));
    }
    let refundable = (after_phaseout - non_refundable).min(refundable_cap);

    Outcome::new(
        ChildCreditResult {
            base_credit,
            phaseout_reduction: phaseout_reduction.min(base_credit),
            non_refundable: round_half_up(non_refundable),
            refundable: round_half_up(non_negative(refundable)),
        },
        diagnostics,
    )
}
