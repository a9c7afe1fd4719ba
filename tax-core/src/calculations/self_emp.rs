//! Self-employment tax.
//!
//! Follows the SE tax lines of Form 1040-ES and Schedule SE, extended with
//! the Additional Medicare Tax on combined wage and SE earnings.
//!
//! | Step | Description |
//! |------|-------------|
//! | 1 | Net earnings: net profit × 92.35% (net earnings factor) |
//! | 2 | Remaining SS wage base: wage base − W-2 wages (not below zero) |
//! | 3 | SS taxable earnings: smaller of step 1 or step 2 |
//! | 4 | Social security tax: step 3 × 12.4% |
//! | 5 | Medicare tax: step 1 × 2.9% (uncapped) |
//! | 6 | Additional Medicare: (W-2 wages + step 1 − threshold) × 0.9% |
//! | 7 | Total: steps 4 + 5 + 6 |
//! | 8 | Deductible half: (steps 4 + 5) × 50% |
//!
//! There is no minimum: any positive net profit owes SE tax. The deductible
//! half leaves the Additional Medicare Tax out.
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! use tax_core::calculations::self_emp::{SeTaxCalculator, SeTaxConfig};
//!
//! let config = SeTaxConfig {
//!     ss_wage_base: dec!(168600),
//!     ss_tax_rate: dec!(0.124),
//!     medicare_tax_rate: dec!(0.029),
//!     additional_medicare_rate: dec!(0.009),
//!     additional_medicare_threshold: dec!(200000),
//!     net_earnings_factor: dec!(0.9235),
//!     deduction_factor: dec!(0.50),
//! };
//!
//! let result = SeTaxCalculator::new(config)
//!     .calculate(dec!(100000), dec!(0))
//!     .unwrap();
//!
//! assert_eq!(result.net_earnings, dec!(92350.00));
//! assert_eq!(result.social_security_tax, dec!(11451.40));
//! assert_eq!(result.medicare_tax, dec!(2678.15));
//! assert_eq!(result.additional_medicare_tax, dec!(0));
//! assert_eq!(result.total, dec!(14129.55));
//! ```

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::calculations::common::{non_negative, round_half_up};
use crate::models::{FilingStatus, PayrollConstants};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SeTaxError {
    #[error("net earnings factor must be between 0 and 1, got {0}")]
    InvalidNetEarningsFactor(Decimal),

    #[error("social security tax rate must be between 0 and 1, got {0}")]
    InvalidSocialSecurityRate(Decimal),

    #[error("medicare tax rate must be between 0 and 1, got {0}")]
    InvalidMedicareRate(Decimal),

    #[error("additional medicare rate must be between 0 and 1, got {0}")]
    InvalidAdditionalMedicareRate(Decimal),

    #[error("deduction factor must be between 0 and 1, got {0}")]
    InvalidDeductionFactor(Decimal),

    #[error("social security wage base must be positive, got {0}")]
    InvalidSsWageBase(Decimal),

    #[error("no additional medicare threshold for {0}")]
    MissingAdditionalMedicareThreshold(FilingStatus),
}

/// Rates and limits for one tax year and filing status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeTaxConfig {
    /// Maximum combined earnings subject to social security tax.
    pub ss_wage_base: Decimal,
    /// Employer + employee social security rate, typically 12.4%.
    pub ss_tax_rate: Decimal,
    /// Employer + employee Medicare rate, typically 2.9%.
    pub medicare_tax_rate: Decimal,
    pub additional_medicare_rate: Decimal,
    /// Combined wage and SE earnings above which Additional Medicare applies.
    pub additional_medicare_threshold: Decimal,
    /// Typically 92.35%.
    pub net_earnings_factor: Decimal,
    /// Typically 50%.
    pub deduction_factor: Decimal,
}

impl SeTaxConfig {
    /// Picks the rates out of a year's payroll constants for one filing
    /// status.
    pub fn from_payroll(
        payroll: &PayrollConstants,
        filing_status: FilingStatus,
    ) -> Result<Self, SeTaxError> {
        let additional_medicare_threshold = payroll
            .additional_medicare_threshold
            .get(filing_status)
            .copied()
            .ok_or(SeTaxError::MissingAdditionalMedicareThreshold(
                filing_status,
            ))?;

        Ok(Self {
            ss_wage_base: payroll.ss_wage_base,
            ss_tax_rate: payroll.se_social_security_rate,
            medicare_tax_rate: payroll.se_medicare_rate,
            additional_medicare_rate: payroll.additional_medicare_rate,
            additional_medicare_threshold,
            net_earnings_factor: payroll.se_net_earnings_factor,
            deduction_factor: payroll.se_deduction_factor,
        })
    }

    /// # Errors
    ///
    /// Returns [`SeTaxError`] when:
    /// - `net_earnings_factor` is not in (0, 1]
    /// - any rate or the deduction factor is not in [0, 1]
    /// - `ss_wage_base` is not positive
    pub fn validate(&self) -> Result<(), SeTaxError> {
        if self.net_earnings_factor <= Decimal::ZERO || self.net_earnings_factor > Decimal::ONE {
            return Err(SeTaxError::InvalidNetEarningsFactor(
                self.net_earnings_factor,
            ));
        }
        if !is_unit_rate(self.ss_tax_rate) {
            return Err(SeTaxError::InvalidSocialSecurityRate(self.ss_tax_rate));
        }
        if !is_unit_rate(self.medicare_tax_rate) {
            return Err(SeTaxError::InvalidMedicareRate(self.medicare_tax_rate));
        }
        if !is_unit_rate(self.additional_medicare_rate) {
            return Err(SeTaxError::InvalidAdditionalMedicareRate(
                self.additional_medicare_rate,
            ));
        }
        if !is_unit_rate(self.deduction_factor) {
            return Err(SeTaxError::InvalidDeductionFactor(self.deduction_factor));
        }
        if self.ss_wage_base <= Decimal::ZERO {
            return Err(SeTaxError::InvalidSsWageBase(self.ss_wage_base));
        }
        Ok(())
    }
}

fn is_unit_rate(rate: Decimal) -> bool {
    rate >= Decimal::ZERO && rate <= Decimal::ONE
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeTaxResult {
    pub net_profit: Decimal,
    pub net_earnings: Decimal,
    /// Never more than the wage base left after W-2 wages.
    pub ss_taxable_earnings: Decimal,
    pub social_security_tax: Decimal,
    pub medicare_tax: Decimal,
    pub additional_medicare_tax: Decimal,
    pub total: Decimal,
    /// Above-the-line deduction; excludes the Additional Medicare Tax.
    pub deductible_half: Decimal,
}

#[derive(Debug, Clone)]
pub struct SeTaxCalculator {
    config: SeTaxConfig,
}

impl SeTaxCalculator {
    pub fn new(config: SeTaxConfig) -> Self {
        Self { config }
    }

    /// Computes SE tax on `net_profit` for a filer who also earned `w2_wages`.
    ///
    /// Negative inputs are treated as zero.
    ///
    /// # Errors
    ///
    /// Returns [`SeTaxError`] if the configuration is invalid.
    ///
    /// # Example: W-2 wages use up the wage base
    ///
    /// ```
    /// use rust_decimal_macros::dec;
    /// use tax_core::calculations::self_emp::{SeTaxCalculator, SeTaxConfig};
    ///
    /// let config = SeTaxConfig {
    ///     ss_wage_base: dec!(168600),
    ///     ss_tax_rate: dec!(0.124),
    ///     medicare_tax_rate: dec!(0.029),
    ///     additional_medicare_rate: dec!(0.009),
    ///     additional_medicare_threshold: dec!(200000),
    ///     net_earnings_factor: dec!(0.9235),
    ///     deduction_factor: dec!(0.50),
    /// };
    ///
    /// let result = SeTaxCalculator::new(config)
    ///     .calculate(dec!(50000), dec!(180000))
    ///     .unwrap();
    ///
    /// assert_eq!(result.ss_taxable_earnings, dec!(0));
    /// // (180,000 + 46,175 − 200,000) × 0.9%
    /// assert_eq!(result.additional_medicare_tax, dec!(235.58));
    /// ```
    pub fn calculate(
        &self,
        net_profit: Decimal,
        w2_wages: Decimal,
    ) -> Result<SeTaxResult, SeTaxError> {
        self.config.validate()?;

        let net_profit = self.clamped("net_profit", net_profit);
        let w2_wages = self.clamped("w2_wages", w2_wages);

        let net_earnings = self.net_earnings(net_profit);
        let remaining_base = self.remaining_ss_wage_base(w2_wages);
        let ss_taxable_earnings = net_earnings.min(remaining_base);
        let social_security_tax = round_half_up(ss_taxable_earnings * self.config.ss_tax_rate);
        let medicare_tax = round_half_up(net_earnings * self.config.medicare_tax_rate);
        let additional_medicare_tax = self.additional_medicare_tax(w2_wages, net_earnings);

        let total = social_security_tax + medicare_tax + additional_medicare_tax;
        let deductible_half =
            round_half_up((social_security_tax + medicare_tax) * self.config.deduction_factor);

        Ok(SeTaxResult {
            net_profit,
            net_earnings,
            ss_taxable_earnings,
            social_security_tax,
            medicare_tax,
            additional_medicare_tax,
            total,
            deductible_half,
        })
    }

    fn clamped(
        &self,
        field: &'static str,
        value: Decimal,
    ) -> Decimal {
        if value < Decimal::ZERO {
            warn!(field, value = %value, "Negative SE input treated as zero");
        }
        non_negative(value)
    }

    fn net_earnings(
        &self,
        net_profit: Decimal,
    ) -> Decimal {
        round_half_up(net_profit * self.config.net_earnings_factor)
    }

    fn remaining_ss_wage_base(
        &self,
        w2_wages: Decimal,
    ) -> Decimal {
        let remaining = self.config.ss_wage_base - w2_wages;
        if remaining <= Decimal::ZERO {
            warn!(
                ss_wage_base = %self.config.ss_wage_base,
                w2_wages = %w2_wages,
                "W-2 wages reach the SS wage base; no SS tax on SE earnings"
            );
            return Decimal::ZERO;
        }
        remaining
    }

    fn additional_medicare_tax(
        &self,
        w2_wages: Decimal,
        net_earnings: Decimal,
    ) -> Decimal {
        let excess =
            non_negative(w2_wages + net_earnings - self.config.additional_medicare_threshold);
        round_half_up(excess * self.config.additional_medicare_rate)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::test_support::{constants_2024, init_test_tracing};

    fn test_config() -> SeTaxConfig {
        SeTaxConfig {
            ss_wage_base: dec!(168600),
            ss_tax_rate: dec!(0.124),
            medicare_tax_rate: dec!(0.029),
            additional_medicare_rate: dec!(0.009),
            additional_medicare_threshold: dec!(200000),
            net_earnings_factor: dec!(0.9235),
            deduction_factor: dec!(0.50),
        }
    }

    fn calculate(
        net_profit: Decimal,
        w2_wages: Decimal,
    ) -> SeTaxResult {
        SeTaxCalculator::new(test_config())
            .calculate(net_profit, w2_wages)
            .unwrap()
    }

    // =========================================================================
    // SeTaxConfig tests
    // =========================================================================

    #[test]
    fn validate_accepts_valid_config() {
        assert_eq!(test_config().validate(), Ok(()));
    }

    #[test]
    fn validate_rejects_zero_net_earnings_factor() {
        let config = SeTaxConfig {
            net_earnings_factor: dec!(0),
            ..test_config()
        };

        assert_eq!(
            config.validate(),
            Err(SeTaxError::InvalidNetEarningsFactor(dec!(0)))
        );
    }

    #[test]
    fn validate_rejects_additional_medicare_rate_above_one() {
        let config = SeTaxConfig {
            additional_medicare_rate: dec!(1.5),
            ..test_config()
        };

        assert_eq!(
            config.validate(),
            Err(SeTaxError::InvalidAdditionalMedicareRate(dec!(1.5)))
        );
    }

    #[test]
    fn validate_rejects_non_positive_wage_base() {
        let config = SeTaxConfig {
            ss_wage_base: dec!(0),
            ..test_config()
        };

        assert_eq!(
            config.validate(),
            Err(SeTaxError::InvalidSsWageBase(dec!(0)))
        );
    }

    #[test]
    fn from_payroll_resolves_threshold_for_filing_status() {
        let payroll = constants_2024().payroll;

        let config =
            SeTaxConfig::from_payroll(&payroll, FilingStatus::MarriedFilingJointly).unwrap();

        assert_eq!(config.additional_medicare_threshold, dec!(250000));
        assert_eq!(config.ss_wage_base, dec!(168600));
    }

    #[test]
    fn from_payroll_reports_missing_threshold() {
        let mut payroll = constants_2024().payroll;
        payroll.additional_medicare_threshold.head_of_household = None;

        assert_eq!(
            SeTaxConfig::from_payroll(&payroll, FilingStatus::HeadOfHousehold),
            Err(SeTaxError::MissingAdditionalMedicareThreshold(
                FilingStatus::HeadOfHousehold
            ))
        );
    }

    // =========================================================================
    // calculate tests
    // =========================================================================

    #[test]
    fn calculate_standard_case() {
        let result = calculate(dec!(100000), dec!(0));

        assert_eq!(
            result,
            SeTaxResult {
                net_profit: dec!(100000),
                net_earnings: dec!(92350.00),
                ss_taxable_earnings: dec!(92350.00),
                social_security_tax: dec!(11451.40),
                medicare_tax: dec!(2678.15),
                additional_medicare_tax: dec!(0),
                total: dec!(14129.55),
                deductible_half: dec!(7064.78),
            }
        );
    }

    #[test]
    fn calculate_caps_ss_at_remaining_wage_base() {
        let result = calculate(dec!(100000), dec!(120000));

        assert_eq!(result.ss_taxable_earnings, dec!(48600));
        assert_eq!(result.social_security_tax, dec!(6026.40));
    }

    #[test]
    fn calculate_no_ss_when_wages_exceed_base() {
        let _guard = init_test_tracing();

        let result = calculate(dec!(50000), dec!(200000));

        assert_eq!(result.social_security_tax, dec!(0));
        assert_eq!(result.medicare_tax, dec!(1339.08));
    }

    #[test]
    fn calculate_additional_medicare_on_combined_earnings() {
        let result = calculate(dec!(300000), dec!(0));

        // 277,050 − 200,000 = 77,050 × 0.9%
        assert_eq!(result.additional_medicare_tax, dec!(693.45));
        assert_eq!(
            result.total,
            result.social_security_tax + result.medicare_tax + dec!(693.45)
        );
    }

    #[test]
    fn calculate_deductible_half_excludes_additional_medicare() {
        let result = calculate(dec!(300000), dec!(0));

        assert_eq!(
            result.deductible_half,
            round_half_up((result.social_security_tax + result.medicare_tax) * dec!(0.5))
        );
    }

    #[test]
    fn calculate_small_profit_still_owes_tax() {
        let result = calculate(dec!(400), dec!(0));

        // 369.40 × 12.4% = 45.81, 369.40 × 2.9% = 10.71
        assert_eq!(result.net_earnings, dec!(369.40));
        assert_eq!(result.social_security_tax, dec!(45.81));
        assert_eq!(result.medicare_tax, dec!(10.71));
        assert_eq!(result.total, dec!(56.52));
    }

    #[test]
    fn calculate_from_2024_payroll_has_no_minimum() {
        let config =
            SeTaxConfig::from_payroll(&constants_2024().payroll, FilingStatus::Single).unwrap();

        let result = SeTaxCalculator::new(config)
            .calculate(dec!(400), dec!(0))
            .unwrap();

        assert_eq!(result.total, dec!(56.52));
        assert_eq!(result.deductible_half, dec!(28.26));
    }

    #[test]
    fn calculate_treats_negative_profit_as_zero() {
        let _guard = init_test_tracing();

        let result = calculate(dec!(-5000), dec!(0));

        assert_eq!(result.net_profit, dec!(0));
        assert_eq!(result.total, dec!(0));
    }

    #[test]
    fn calculate_returns_error_for_invalid_config() {
        let calculator = SeTaxCalculator::new(SeTaxConfig {
            ss_tax_rate: dec!(2),
            ..test_config()
        });

        assert_eq!(
            calculator.calculate(dec!(1000), dec!(0)),
            Err(SeTaxError::InvalidSocialSecurityRate(dec!(2)))
        );
    }

    proptest! {
        #[test]
        fn ss_taxable_never_exceeds_remaining_base(
            profit in 0i64..50_000_000,
            wages in 0i64..50_000_000,
        ) {
            let wages = Decimal::new(wages, 2);
            let result = calculate(Decimal::new(profit, 2), wages);
            let remaining = (dec!(168600) - wages).max(Decimal::ZERO);

            prop_assert!(result.ss_taxable_earnings <= remaining);
            prop_assert!(result.total >= Decimal::ZERO);
            prop_assert!(result.deductible_half >= Decimal::ZERO);
        }
    }
}
