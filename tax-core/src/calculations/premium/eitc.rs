//! Federal earned income tax credit.
//!
//! The credit phases in up to the row maximum, then phases out above the
//! row's start. Both phases run on the smaller of earned income and AGI.
//! Rows are picked by the number of qualifying children, with the last row
//! covering "or more".

use rust_decimal::Decimal;
use serde::Serialize;
use tracing::debug;

use crate::calculations::common::{non_negative, round_half_up};
use crate::calculations::diagnostics::{Diagnostics, Outcome, Warning};
use crate::models::{EitcConstants, EitcParams, FilingStatus};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EitcInput {
    pub filing_status: FilingStatus,
    pub earned_income: Decimal,
    pub agi: Decimal,
    pub investment_income: Decimal,
    pub qualifying_children: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EitcResult {
    pub credit: Decimal,
    /// Investment income above the limit disqualifies the return.
    pub disqualified: bool,
}

/// Phase-in / phase-out credit shape shared with state earned income
/// credits.
///
/// `min(max, rate_in × base) − rate_out × (base − start)` with
/// `base = min(earned, agi)`, never below zero.
pub(crate) fn phased_credit(
    params: &EitcParams,
    earned_income: Decimal,
    agi: Decimal,
) -> Decimal {
    let base = non_negative(earned_income.min(agi));
    let phased_in = params.max_credit.min(base * params.phase_in_rate);
    let reduction = non_negative(base - params.phase_out_start) * params.phase_out_rate;
    round_half_up(non_negative(phased_in - reduction))
}

/// Row for `children`, clamped to the last row of the table.
pub(crate) fn row_for(
    rows: &[EitcParams],
    children: u32,
) -> Option<&EitcParams> {
    let index = usize::try_from(children).unwrap_or(usize::MAX);
    rows.get(index).or_else(|| rows.last())
}

/// # Example
///
/// ```
/// use rust_decimal_macros::dec;
/// use tax_core::calculations::premium::eitc::{EitcInput, compute_eitc};
/// use tax_core::models::{EitcConstants, EitcParams, FilingStatus, FilingStatusTable};
///
/// let constants = EitcConstants {
///     investment_income_limit: dec!(11600),
///     by_children: FilingStatusTable::uniform(vec![EitcParams {
///         max_credit: dec!(632),
///         phase_in_rate: dec!(0.0765),
///         phase_out_start: dec!(10330),
///         phase_out_rate: dec!(0.0765),
///     }]),
/// };
/// let input = EitcInput {
///     filing_status: FilingStatus::Single,
///     earned_income: dec!(5000),
///     agi: dec!(5000),
///     investment_income: dec!(0),
///     qualifying_children: 0,
/// };
///
/// assert_eq!(compute_eitc(&input, Some(&constants)).value.credit, dec!(382.50));
/// ```
pub fn compute_eitc(
    input: &EitcInput,
    constants: Option<&EitcConstants>,
) -> Outcome<EitcResult> {
    let mut diagnostics = Diagnostics::new();
    let zero = EitcResult {
        credit: Decimal::ZERO,
        disqualified: false,
    };
    let Some(constants) = constants else {
        diagnostics.warn(Warning::MissingConstants {
            block: "eitc".to_string(),
        });
        return Outcome::new(zero, diagnostics);
    };
    let Some(params) = constants
        .by_children
        .get(input.filing_status)
        .and_then(|rows| row_for(rows, input.qualifying_children))
    else {
        diagnostics.warn(Warning::EitcIneligibleFilingStatus {
            filing_status: input.filing_status,
        });
        return Outcome::new(zero, diagnostics);
    };

    if input.investment_income > constants.investment_income_limit {
        debug!(
            investment_income = %input.investment_income,
            limit = %constants.investment_income_limit,
            "EITC disqualified by investment income"
        );
        return Outcome::new(
            EitcResult {
                credit: Decimal::ZERO,
                disqualified: true,
            },
            diagnostics,
        );
    }

    let credit = phased_credit(params, input.earned_income, input.agi);
    Outcome::new(
        EitcResult {
            credit,
            disqualified: false,
        },
        diagnostics,
    )
}
