//! State-specific refundable credits applied after state bracket tax.
//!
//! Only the state whose code matches the scenario contributes anything. The
//! earned income credit uses the same phase shape as the federal EITC with
//! its own table and a hard earned-income ceiling. The young-child credit is
//! a per-return amount that phases out linearly with earned income.

use rust_decimal::Decimal;
use serde::Serialize;

use super::eitc::{phased_credit, row_for};
use crate::calculations::common::{non_negative, round_half_up};
use crate::calculations::diagnostics::{Diagnostics, Outcome};
use crate::models::{Fact, StateCreditConstants, StateEarnedIncomeCredit, YoungChildCredit};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateCreditInput {
    pub earned_income: Decimal,
    pub agi: Decimal,
    pub qualifying_children: u32,
    /// `None` when the scenario did not say; the young-child credit is then
    /// skipped and the fact reported as missing.
    pub children_under_six: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StateCreditResult {
    pub earned_income_credit: Decimal,
    pub young_child_credit: Decimal,
}

impl StateCreditResult {
    pub fn total(&self) -> Decimal {
        self.earned_income_credit + self.young_child_credit
    }
}

fn earned_income_credit(
    credit: &StateEarnedIncomeCredit,
    input: &StateCreditInput,
) -> Decimal {
    if input.earned_income <= Decimal::ZERO || input.earned_income > credit.earned_income_limit {
        return Decimal::ZERO;
    }
    row_for(&credit.by_children, input.qualifying_children)
        .map_or(Decimal::ZERO, |params| {
            phased_credit(params, input.earned_income, input.agi)
        })
}

fn young_child_credit(
    credit: &YoungChildCredit,
    earned_income: Decimal,
) -> Decimal {
    let reduction = non_negative(earned_income - credit.phase_out_start) * credit.phase_out_rate;
    round_half_up(non_negative(credit.amount - reduction))
}

/// Both credits for one state. `constants` is the state's block, if the
/// tax year defines one; a state without a block simply earns nothing.
pub fn compute_state_credits(
    input: &StateCreditInput,
    constants: Option<&StateCreditConstants>,
) -> Outcome<StateCreditResult> {
    let mut diagnostics = Diagnostics::new();
    let Some(constants) = constants else {
        return Outcome::new(StateCreditResult::default(), diagnostics);
    };

    let earned_income_credit = constants
        .earned_income
        .as_ref()
        .map_or(Decimal::ZERO, |credit| earned_income_credit(credit, input));

    let young_child_credit = match (&constants.young_child, input.children_under_six) {
        (None, _) => Decimal::ZERO,
        (Some(_), None) => {
            diagnostics.missing(Fact::ChildrenUnderSix.as_str());
            Decimal::ZERO
        }
        (Some(credit), Some(children)) if children > 0 && input.earned_income > Decimal::ZERO => {
            young_child_credit(credit, input.earned_income)
        }
        (Some(_), Some(_)) => Decimal::ZERO,
    };

    Outcome::new(
        StateCreditResult {
            earned_income_credit,
            young_child_credit,
        },
        diagnostics,
    )
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::test_support::constants_2024;

    fn input(
        earned: Decimal,
        children: u32,
        under_six: Option<u32>,
    ) -> StateCreditInput {
        StateCreditInput {
            earned_income: earned,
            agi: earned,
            qualifying_children: children,
            children_under_six: under_six,
        }
    }

    fn california(input: &StateCreditInput) -> Outcome<StateCreditResult> {
        let constants = constants_2024();
        compute_state_credits(input, constants.state_credits.get("CA"))
    }

    #[test]
    fn earned_income_credit_phases_in() {
        // min(1,900, 0.34 × 4,000) with no phase-out yet
        let outcome = california(&input(dec!(4000), 1, Some(0)));

        assert_eq!(outcome.value.earned_income_credit, dec!(1360.00));
        assert_eq!(outcome.value.young_child_credit, dec!(0));
    }

    #[test]
    fn earned_income_above_limit_earns_nothing() {
        let outcome = california(&input(dec!(40000), 1, Some(1)));

        assert_eq!(outcome.value.earned_income_credit, dec!(0));
    }

    #[test]
    fn young_child_credit_phases_out() {
        // 1,154 − (27,000 − 25,000) × 0.1946
        let outcome = california(&input(dec!(27000), 1, Some(1)));

        assert_eq!(outcome.value.young_child_credit, dec!(764.80));
    }

    #[test]
    fn young_child_credit_requires_earned_income() {
        let outcome = california(&input(dec!(0), 1, Some(1)));

        assert_eq!(outcome.value.total(), dec!(0));
    }

    #[test]
    fn unknown_young_children_reported_missing() {
        let outcome = california(&input(dec!(15000), 1, None));

        assert_eq!(outcome.value.young_child_credit, dec!(0));
        assert_eq!(outcome.missing_inputs(), ["childrenUnderSix"]);
    }

    #[test]
    fn state_without_credits_earns_nothing() {
        let outcome = compute_state_credits(&input(dec!(15000), 2, Some(1)), None);

        assert_eq!(outcome.value, StateCreditResult::default());
        assert!(outcome.diagnostics.is_empty());
    }
}
