//! Federal itemized deductions from scenario facts.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::calculations::common::{non_negative, round_half_up};
use crate::calculations::diagnostics::{Diagnostics, Outcome, Warning};
use crate::models::{Fact, FilingStatus, ItemizedCaps, ScenarioFacts};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ItemizedResult {
    pub state_and_local_taxes: Decimal,
    pub medical: Decimal,
    pub mortgage_interest: Decimal,
    pub charitable: Decimal,
    pub total: Decimal,
}

/// SALT up to the cap, medical above the AGI floor, mortgage interest and
/// charitable contributions. Absent facts contribute zero.
///
/// Returns `None` (with a warning) when the year has no itemized caps; the
/// caller then falls back to the standard deduction.
pub fn compute_itemized(
    facts: &ScenarioFacts,
    agi: Decimal,
    filing_status: FilingStatus,
    caps: Option<&ItemizedCaps>,
) -> Outcome<Option<ItemizedResult>> {
    let mut diagnostics = Diagnostics::new();
    let Some(caps) = caps else {
        diagnostics.warn(Warning::MissingConstants {
            block: "itemized".to_string(),
        });
        return Outcome::new(None, diagnostics);
    };

    let salt_paid = facts.amount(Fact::StateAndLocalTaxes);
    let state_and_local_taxes = match caps.salt_cap.get(filing_status) {
        Some(cap) => salt_paid.min(*cap),
        None => salt_paid,
    };
    let medical = non_negative(facts.amount(Fact::MedicalExpenses) - agi * caps.medical_agi_floor);
    let mortgage_interest = facts.amount(Fact::MortgageInterest);
    let charitable = facts.amount(Fact::CharitableContributions);

    let total = round_half_up(state_and_local_taxes + medical + mortgage_interest + charitable);
    Outcome::new(
        Some(ItemizedResult {
            state_and_local_taxes,
            medical: round_half_up(medical),
            mortgage_interest,
            charitable,
            total,
        }),
        diagnostics,
    )
}
