//! Form 1040-ES estimated tax worksheet, from tax after credits onwards.
//!
//! The regular tax lines (AGI, deductions, bracket tax) come from
//! [`compute_federal_tax`](super::federal::compute_federal_tax); this
//! worksheet picks up at line 6.
//!
//! | Line | Description |
//! |------|-------------|
//! | 6    | Tax before credits |
//! | 7    | Non-refundable credits |
//! | 8    | Tax after credits (Line 6 − Line 7, minimum 0) |
//! | 9    | Self-employment tax |
//! | 10   | Other taxes (NIIT, Additional Medicare) |
//! | 11a  | Total tax (Line 8 + Line 9 + Line 10) |
//! | 11b  | Refundable credits |
//! | 11c  | Total estimated tax (Line 11a − Line 11b, minimum 0) |
//! | 12a  | Line 11c × 90% (66⅔% for farmers and fishers) |
//! | 12b  | Prior-year safe harbor amount, when known |
//! | 12c  | Required annual payment (smaller of 12a and 12b) |
//! | 13   | Withholding |
//! | 14a  | Line 12c − Line 13 (if ≤ 0, no estimated payments required) |
//! | 14b  | Line 11c − Line 13 (if below the threshold, none required) |
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! use tax_core::calculations::estimated_payments::{
//!     EstimatedPaymentInput, EstimatedPaymentWorksheet,
//! };
//! use tax_core::models::EstimatedPaymentConstants;
//!
//! let constants = EstimatedPaymentConstants::default();
//! let input = EstimatedPaymentInput {
//!     tax_before_credits: dec!(13614),
//!     prior_year_safe_harbor: Some(dec!(12000)),
//!     ..EstimatedPaymentInput::default()
//! };
//!
//! let result = EstimatedPaymentWorksheet::new(&constants).calculate(&input);
//!
//! assert_eq!(result.total_estimated_tax, dec!(13614.00));
//! assert_eq!(result.required_annual_payment, dec!(12000.00));
//! assert_eq!(result.quarterly_installment, dec!(3000.00));
//! assert!(result.estimated_payments_required);
//! ```

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::common::{non_negative, round_half_up};
use crate::models::EstimatedPaymentConstants;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EstimatedPaymentInput {
    /// Regular income tax before credits (line 6).
    pub tax_before_credits: Decimal,

    /// Non-refundable credits such as the child tax credit (line 7).
    pub credits: Decimal,

    /// Self-employment tax from the SE calculator (line 9).
    pub self_employment_tax: Decimal,

    /// NIIT and similar (line 10).
    pub other_taxes: Decimal,

    /// EITC, refundable child credit (line 11b).
    pub refundable_credits: Decimal,

    /// Prior-year tax already scaled by the safe-harbor multiplier. `None`
    /// when the prior year is unknown; the current-year amount then applies.
    pub prior_year_safe_harbor: Option<Decimal>,

    pub withholding: Decimal,

    pub is_farmer_or_fisher: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EstimatedPaymentResult {
    pub tax_after_credits: Decimal,
    pub total_tax: Decimal,
    pub total_estimated_tax: Decimal,
    /// Line 12a.
    pub current_year_requirement: Decimal,
    pub required_annual_payment: Decimal,
    /// What must be paid in estimates after withholding (line 14a).
    pub underpayment: Decimal,
    pub quarterly_installment: Decimal,
    pub estimated_payments_required: bool,
}

#[derive(Debug, Clone)]
pub struct EstimatedPaymentWorksheet<'a> {
    constants: &'a EstimatedPaymentConstants,
}

impl<'a> EstimatedPaymentWorksheet<'a> {
    pub fn new(constants: &'a EstimatedPaymentConstants) -> Self {
        Self { constants }
    }

    pub fn calculate(
        &self,
        input: &EstimatedPaymentInput,
    ) -> EstimatedPaymentResult {
        let tax_after_credits = self.tax_after_credits(input.tax_before_credits, input.credits);
        let total_tax = self.total_tax(
            tax_after_credits,
            input.self_employment_tax,
            input.other_taxes,
        );
        let total_estimated_tax = self.total_estimated_tax(total_tax, input.refundable_credits);

        let current_year_requirement =
            self.current_year_requirement(total_estimated_tax, input.is_farmer_or_fisher);
        let required_annual_payment =
            self.required_annual_payment(current_year_requirement, input.prior_year_safe_harbor);

        let underpayment = self.underpayment(required_annual_payment, input.withholding);
        let threshold_amount = self.threshold_amount(total_estimated_tax, input.withholding);
        let estimated_payments_required =
            self.are_estimated_payments_required(underpayment, threshold_amount);

        EstimatedPaymentResult {
            tax_after_credits,
            total_tax,
            total_estimated_tax,
            current_year_requirement,
            required_annual_payment,
            underpayment,
            quarterly_installment: round_half_up(underpayment / Decimal::from(4)),
            estimated_payments_required,
        }
    }

    fn tax_after_credits(
        &self,
        tax_before_credits: Decimal,
        credits: Decimal,
    ) -> Decimal {
        non_negative(round_half_up(tax_before_credits - credits))
    }

    fn total_tax(
        &self,
        tax_after_credits: Decimal,
        se_tax: Decimal,
        other_taxes: Decimal,
    ) -> Decimal {
        round_half_up(tax_after_credits + se_tax + other_taxes)
    }

    fn total_estimated_tax(
        &self,
        total_tax: Decimal,
        refundable_credits: Decimal,
    ) -> Decimal {
        non_negative(round_half_up(total_tax - refundable_credits))
    }

    fn current_year_requirement(
        &self,
        total_estimated_tax: Decimal,
        is_farmer_or_fisher: bool,
    ) -> Decimal {
        let factor = if is_farmer_or_fisher {
            self.constants.farmer_current_year_factor
        } else {
            self.constants.current_year_factor
        };
        round_half_up(total_estimated_tax * factor)
    }

    fn required_annual_payment(
        &self,
        current_year_requirement: Decimal,
        prior_year_safe_harbor: Option<Decimal>,
    ) -> Decimal {
        match prior_year_safe_harbor {
            Some(prior) => current_year_requirement.min(round_half_up(non_negative(prior))),
            None => current_year_requirement,
        }
    }

    fn underpayment(
        &self,
        required_annual_payment: Decimal,
        withholding: Decimal,
    ) -> Decimal {
        non_negative(round_half_up(required_annual_payment - withholding))
    }

    fn threshold_amount(
        &self,
        total_estimated_tax: Decimal,
        withholding: Decimal,
    ) -> Decimal {
        non_negative(round_half_up(total_estimated_tax - withholding))
    }

    fn are_estimated_payments_required(
        &self,
        underpayment: Decimal,
        threshold_amount: Decimal,
    ) -> bool {
        underpayment > Decimal::ZERO
            && threshold_amount >= self.constants.required_payment_threshold
    }
}
