//! Quarterly underpayment penalty exposure.
//!
//! | Quarter | Due date | Cumulative share of the required annual payment |
//! |---------|----------|------------------------------------------------|
//! | 1 | April 15 | 25% |
//! | 2 | June 15 | 50% |
//! | 3 | September 15 | 75% |
//! | 4 | January 15 of the next year | 100% |
//!
//! Withholding counts as paid evenly across all four quarters. A quarter is
//! only judged once its due date has passed (as of the given date, or all
//! four when no date is given).

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::debug;

use crate::calculations::common::{non_negative, round_half_up};
use crate::error::EngineError;

/// Tolerance below which a shortfall does not count as underpayment.
const CENT: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EstimatedPayments {
    None,
    /// Amount paid in each of the four installment periods.
    ByQuarter([Decimal; 4]),
    /// Total paid so far, spread evenly over the quarters already due.
    YearToDate(Decimal),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PenaltyRiskInput {
    pub tax_year: i32,
    pub required_annual_payment: Decimal,
    pub withholding: Decimal,
    pub payments: EstimatedPayments,
    pub as_of: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuarterStatus {
    pub quarter: u8,
    pub due_date: NaiveDate,
    pub due: bool,
    pub required_to_date: Decimal,
    pub paid_to_date: Decimal,
    pub shortfall: Decimal,
    pub underpaid: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PenaltyRiskResult {
    pub quarters: Vec<QuarterStatus>,
    /// No quarter that is already due has been underpaid.
    pub protected: bool,
}

/// The four 1040-ES due dates for `tax_year`.
pub fn due_dates(tax_year: i32) -> Result<[NaiveDate; 4], EngineError> {
    let date = |year: i32, month: u32| {
        NaiveDate::from_ymd_opt(year, month, 15).ok_or(EngineError::InvalidTaxYear(tax_year))
    };
    Ok([
        date(tax_year, 4)?,
        date(tax_year, 6)?,
        date(tax_year, 9)?,
        date(tax_year + 1, 1)?,
    ])
}

fn per_quarter_payments(
    payments: &EstimatedPayments,
    due_count: usize,
) -> [Decimal; 4] {
    match payments {
        EstimatedPayments::None => [Decimal::ZERO; 4],
        EstimatedPayments::ByQuarter(amounts) => amounts.map(non_negative),
        EstimatedPayments::YearToDate(total) => {
            let spread_over = due_count.max(1);
            let share = non_negative(*total) / Decimal::from(spread_over);
            let mut amounts = [Decimal::ZERO; 4];
            for amount in amounts.iter_mut().take(spread_over) {
                *amount = share;
            }
            amounts
        }
    }
}

/// Walks the four installments and flags every due quarter whose
/// cumulative payments fall short of the cumulative requirement.
///
/// # Errors
///
/// Only a tax year outside the calendar range `chrono` can represent.
pub fn compute_penalty_risk(input: &PenaltyRiskInput) -> Result<PenaltyRiskResult, EngineError> {
    let dates = due_dates(input.tax_year)?;
    let due = dates.map(|date| input.as_of.is_none_or(|as_of| as_of >= date));
    let due_count = due.iter().filter(|due| **due).count();

    let payments = per_quarter_payments(&input.payments, due_count);
    let withholding_share = non_negative(input.withholding) / Decimal::from(4);
    let quarter_share = non_negative(input.required_annual_payment) / Decimal::from(4);

    let mut paid = Decimal::ZERO;
    let mut quarters = Vec::with_capacity(4);
    for (index, (due_date, due)) in dates.into_iter().zip(due).enumerate() {
        paid += payments[index] + withholding_share;
        let periods = Decimal::from(index + 1);
        let required_to_date = round_half_up(quarter_share * periods);
        let paid_to_date = round_half_up(paid);
        let shortfall = non_negative(required_to_date - paid_to_date);

        quarters.push(QuarterStatus {
            quarter: (index + 1) as u8,
            due_date,
            due,
            required_to_date,
            paid_to_date,
            shortfall,
            underpaid: due && paid_to_date < required_to_date - CENT,
        });
    }

    let protected = !quarters.iter().any(|quarter| quarter.underpaid);
    debug!(
        tax_year = input.tax_year,
        due_quarters = due_count,
        protected,
        "Penalty risk computed"
    );

    Ok(PenaltyRiskResult {
        quarters,
        protected,
    })
}
