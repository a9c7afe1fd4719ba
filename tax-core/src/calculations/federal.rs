//! Federal income tax: deduction, taxable income, bracket tax.

use rust_decimal::Decimal;
use serde::Serialize;
use tracing::debug;

use super::brackets::{BracketSlice, compute_tax};
use super::common::non_negative;
use crate::error::ConfigError;
use crate::models::{FilingStatus, TaxSchedule, TaxYearConstants};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FederalTaxResult {
    pub agi: Decimal,
    pub standard_deduction: Decimal,
    pub itemized_deduction: Decimal,
    /// The larger of the standard and itemized deductions.
    pub deduction: Decimal,
    pub used_itemized: bool,
    pub qbi_deduction: Decimal,
    pub taxable_income: Decimal,
    /// Regular tax before credits.
    pub tax: Decimal,
    pub effective_rate: Decimal,
    pub marginal_rate: Decimal,
    pub breakdown: Vec<BracketSlice>,
}

/// The deduction taken below AGI and whether it was itemized.
///
/// Itemizing only wins when it beats the standard deduction.
pub fn select_deduction(
    filing_status: FilingStatus,
    itemized: Option<Decimal>,
    constants: &TaxYearConstants,
) -> Result<(Decimal, bool), ConfigError> {
    let standard = standard_deduction(filing_status, constants)?;
    match itemized {
        Some(itemized) if itemized > standard => Ok((itemized, true)),
        _ => Ok((standard, false)),
    }
}

fn standard_deduction(
    filing_status: FilingStatus,
    constants: &TaxYearConstants,
) -> Result<Decimal, ConfigError> {
    constants
        .federal
        .standard_deduction
        .get(filing_status)
        .copied()
        .ok_or_else(|| ConfigError::MissingFilingStatusValue {
            context: format!("federal {} standard deduction", constants.tax_year),
            filing_status,
        })
}

/// Computes regular federal income tax on
/// `agi − max(standard, itemized) − qbi_deduction`.
///
/// # Errors
///
/// Missing brackets or standard deduction for the filing status are fatal.
pub fn compute_federal_tax(
    agi: Decimal,
    filing_status: FilingStatus,
    qbi_deduction: Decimal,
    itemized: Option<Decimal>,
    constants: &TaxYearConstants,
) -> Result<FederalTaxResult, ConfigError> {
    let jurisdiction = format!("federal {}", constants.tax_year);
    let brackets = constants
        .federal
        .brackets
        .get(filing_status)
        .ok_or_else(|| ConfigError::MissingBrackets {
            jurisdiction: jurisdiction.clone(),
            filing_status,
        })?;

    let agi = non_negative(agi);
    let standard = standard_deduction(filing_status, constants)?;
    let (deduction, used_itemized) = select_deduction(filing_status, itemized, constants)?;
    let qbi_deduction = non_negative(qbi_deduction);
    let taxable_income = non_negative(agi - deduction - qbi_deduction);

    let schedule = TaxSchedule::Progressive {
        brackets: brackets.clone(),
    };
    let bracket_tax = compute_tax(taxable_income, &schedule, &jurisdiction)?;
    debug!(
        agi = %agi,
        deduction = %deduction,
        taxable_income = %taxable_income,
        tax = %bracket_tax.tax,
        "Federal tax computed"
    );

    Ok(FederalTaxResult {
        agi,
        standard_deduction: standard,
        itemized_deduction: itemized.map_or(Decimal::ZERO, non_negative),
        deduction,
        used_itemized,
        qbi_deduction,
        taxable_income,
        tax: bracket_tax.tax,
        effective_rate: bracket_tax.effective_rate,
        marginal_rate: bracket_tax.marginal_rate(),
        breakdown: bracket_tax.breakdown,
    })
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::test_support::constants_2024;

    #[test]
    fn compute_federal_tax_single_standard_deduction() {
        let result = compute_federal_tax(
            dec!(64600),
            FilingStatus::Single,
            dec!(0),
            None,
            &constants_2024(),
        )
        .unwrap();

        assert_eq!(result.taxable_income, dec!(50000));
        assert_eq!(result.tax, dec!(6053.00));
        assert_eq!(result.marginal_rate, dec!(0.22));
        assert!(!result.used_itemized);
    }

    #[test]
    fn compute_federal_tax_subtracts_qbi() {
        let result = compute_federal_tax(
            dec!(74600),
            FilingStatus::Single,
            dec!(10000),
            None,
            &constants_2024(),
        )
        .unwrap();

        assert_eq!(result.taxable_income, dec!(50000));
    }

    #[test]
    fn compute_federal_tax_prefers_larger_itemized() {
        let result = compute_federal_tax(
            dec!(100000),
            FilingStatus::Single,
            dec!(0),
            Some(dec!(20000)),
            &constants_2024(),
        )
        .unwrap();

        assert!(result.used_itemized);
        assert_eq!(result.deduction, dec!(20000));
        assert_eq!(result.taxable_income, dec!(80000));
    }

    #[test]
    fn compute_federal_tax_ignores_smaller_itemized() {
        let result = compute_federal_tax(
            dec!(100000),
            FilingStatus::MarriedFilingJointly,
            dec!(0),
            Some(dec!(20000)),
            &constants_2024(),
        )
        .unwrap();

        assert!(!result.used_itemized);
        assert_eq!(result.deduction, dec!(29200));
    }

    #[test]
    fn compute_federal_tax_surviving_spouse_uses_joint_table() {
        let joint = compute_federal_tax(
            dec!(150000),
            FilingStatus::MarriedFilingJointly,
            dec!(0),
            None,
            &constants_2024(),
        )
        .unwrap();
        let surviving = compute_federal_tax(
            dec!(150000),
            FilingStatus::QualifyingSurvivingSpouse,
            dec!(0),
            None,
            &constants_2024(),
        )
        .unwrap();

        assert_eq!(joint.tax, surviving.tax);
    }

    #[test]
    fn compute_federal_tax_income_below_deduction_is_zero() {
        let result = compute_federal_tax(
            dec!(10000),
            FilingStatus::Single,
            dec!(0),
            None,
            &constants_2024(),
        )
        .unwrap();

        assert_eq!(result.taxable_income, dec!(0));
        assert_eq!(result.tax, dec!(0));
    }

    #[test]
    fn compute_federal_tax_missing_brackets_is_fatal() {
        let mut constants = constants_2024();
        constants.federal.brackets.head_of_household = None;

        assert!(matches!(
            compute_federal_tax(
                dec!(50000),
                FilingStatus::HeadOfHousehold,
                dec!(0),
                None,
                &constants
            ),
            Err(ConfigError::MissingBrackets {
                filing_status: FilingStatus::HeadOfHousehold,
                ..
            })
        ));
    }
}
