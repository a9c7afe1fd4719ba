//! Employee-side payroll tax on W-2 salary.

use rust_decimal::Decimal;
use serde::Serialize;

use super::common::{non_negative, round_half_up};
use crate::error::ConfigError;
use crate::models::{FilingStatus, PayrollConstants};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FicaResult {
    pub social_security_tax: Decimal,
    pub medicare_tax: Decimal,
    pub additional_medicare_tax: Decimal,
    pub total: Decimal,
}

/// Social security up to the wage base, Medicare on everything, and
/// Additional Medicare above the filing-status threshold.
///
/// # Example
///
/// ```
/// use rust_decimal_macros::dec;
/// use tax_core::calculations::fica::compute_fica;
/// use tax_core::models::{FilingStatus, FilingStatusTable, PayrollConstants};
///
/// let payroll = PayrollConstants {
///     ss_wage_base: dec!(168600),
///     se_social_security_rate: dec!(0.124),
///     se_medicare_rate: dec!(0.029),
///     employee_social_security_rate: dec!(0.062),
///     employee_medicare_rate: dec!(0.0145),
///     additional_medicare_rate: dec!(0.009),
///     additional_medicare_threshold: FilingStatusTable::uniform(dec!(200000)),
///     se_net_earnings_factor: dec!(0.9235),
///     se_deduction_factor: dec!(0.5),
/// };
///
/// let fica = compute_fica(dec!(100000), FilingStatus::Single, &payroll).unwrap();
///
/// assert_eq!(fica.total, dec!(7650.00));
/// ```
pub fn compute_fica(
    salary: Decimal,
    filing_status: FilingStatus,
    payroll: &PayrollConstants,
) -> Result<FicaResult, ConfigError> {
    let threshold = payroll
        .additional_medicare_threshold
        .get(filing_status)
        .copied()
        .ok_or_else(|| ConfigError::MissingFilingStatusValue {
            context: "additional Medicare threshold".to_string(),
            filing_status,
        })?;

    let salary = non_negative(salary);
    let social_security_tax =
        round_half_up(salary.min(payroll.ss_wage_base) * payroll.employee_social_security_rate);
    let medicare_tax = round_half_up(salary * payroll.employee_medicare_rate);
    let additional_medicare_tax =
        round_half_up(non_negative(salary - threshold) * payroll.additional_medicare_rate);

    Ok(FicaResult {
        social_security_tax,
        medicare_tax,
        additional_medicare_tax,
        total: social_security_tax + medicare_tax + additional_medicare_tax,
    })
}
