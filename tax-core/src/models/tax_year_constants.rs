use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{FilingStatus, FilingStatusTable, TaxBracket, validate_brackets};
use crate::error::ConfigError;

/// Everything the engine needs to know about one federal tax year.
///
/// Loaded once per year and never mutated afterwards. The premium blocks are
/// optional: a year without, say, an `eitc` table still produces a valid
/// baseline result and the earned income credit simply reports zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxYearConstants {
    pub tax_year: i32,
    pub federal: FederalConstants,
    pub payroll: PayrollConstants,
    #[serde(default)]
    pub qbi: Option<QbiConstants>,
    #[serde(default)]
    pub niit: Option<NiitConstants>,
    #[serde(default)]
    pub child_credits: Option<ChildCreditConstants>,
    #[serde(default)]
    pub eitc: Option<EitcConstants>,
    #[serde(default)]
    pub itemized: Option<ItemizedCaps>,
    #[serde(default)]
    pub safe_harbor: SafeHarborConstants,
    #[serde(default)]
    pub estimated_payments: EstimatedPaymentConstants,
    /// Keyed by two-letter state code.
    #[serde(default)]
    pub state_credits: BTreeMap<String, StateCreditConstants>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FederalConstants {
    #[serde(default)]
    pub brackets: FilingStatusTable<Vec<TaxBracket>>,
    pub standard_deduction: FilingStatusTable<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayrollConstants {
    /// Maximum earnings subject to social security tax.
    pub ss_wage_base: Decimal,
    /// Combined employer + employee social security rate on SE earnings.
    pub se_social_security_rate: Decimal,
    /// Combined employer + employee Medicare rate on SE earnings.
    pub se_medicare_rate: Decimal,
    pub employee_social_security_rate: Decimal,
    pub employee_medicare_rate: Decimal,
    pub additional_medicare_rate: Decimal,
    pub additional_medicare_threshold: FilingStatusTable<Decimal>,
    /// Share of net profit treated as net earnings from self-employment.
    pub se_net_earnings_factor: Decimal,
    /// Share of SE tax deductible above the line.
    pub se_deduction_factor: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QbiConstants {
    pub rate: Decimal,
    pub threshold: FilingStatusTable<Decimal>,
    pub phaseout_range: FilingStatusTable<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NiitConstants {
    pub rate: Decimal,
    pub threshold: FilingStatusTable<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChildCreditConstants {
    pub per_child: Decimal,
    pub per_other_dependent: Decimal,
    pub phaseout_threshold: FilingStatusTable<Decimal>,
    /// Each started step of income above the threshold costs
    /// `phaseout_amount_per_step`.
    pub phaseout_step: Decimal,
    pub phaseout_amount_per_step: Decimal,
    pub max_refundable_per_child: Decimal,
    /// When both are present the refundable part is also limited to
    /// `refundable_rate × (earned income − refundable_earned_income_threshold)`.
    #[serde(default)]
    pub refundable_earned_income_threshold: Option<Decimal>,
    #[serde(default)]
    pub refundable_rate: Option<Decimal>,
}

/// Phase-in / phase-out parameters shared by federal and state earned income
/// credits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EitcParams {
    pub max_credit: Decimal,
    pub phase_in_rate: Decimal,
    pub phase_out_start: Decimal,
    pub phase_out_rate: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EitcConstants {
    pub investment_income_limit: Decimal,
    /// Indexed by number of qualifying children, capped at the last entry
    /// (normally index 3, "three or more").
    pub by_children: FilingStatusTable<Vec<EitcParams>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemizedCaps {
    pub salt_cap: FilingStatusTable<Decimal>,
    /// Medical expenses are deductible only above this share of AGI.
    pub medical_agi_floor: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafeHarborConstants {
    pub high_income_threshold: Decimal,
    pub high_income_threshold_separate: Decimal,
    pub high_income_multiplier: Decimal,
}

impl Default for SafeHarborConstants {
    fn default() -> Self {
        Self {
            high_income_threshold: Decimal::new(150_000, 0),
            high_income_threshold_separate: Decimal::new(75_000, 0),
            high_income_multiplier: Decimal::new(110, 2),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EstimatedPaymentConstants {
    pub current_year_factor: Decimal,
    pub farmer_current_year_factor: Decimal,
    pub required_payment_threshold: Decimal,
}

impl Default for EstimatedPaymentConstants {
    fn default() -> Self {
        Self {
            current_year_factor: Decimal::new(90, 2),
            farmer_current_year_factor: Decimal::TWO / Decimal::from(3),
            required_payment_threshold: Decimal::new(1_000, 0),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateCreditConstants {
    #[serde(default)]
    pub earned_income: Option<StateEarnedIncomeCredit>,
    #[serde(default)]
    pub young_child: Option<YoungChildCredit>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateEarnedIncomeCredit {
    /// Earned income above this amount disqualifies the return entirely.
    pub earned_income_limit: Decimal,
    pub by_children: Vec<EitcParams>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct YoungChildCredit {
    /// Per-return credit before the phase-out.
    pub amount: Decimal,
    pub phase_out_start: Decimal,
    pub phase_out_rate: Decimal,
}

impl TaxYearConstants {
    /// Checks the tables the engine cannot run without.
    ///
    /// Premium blocks are only checked when present.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let jurisdiction = format!("federal {}", self.tax_year);

        for status in FilingStatus::ALL {
            let brackets = self.federal.brackets.get(status).ok_or_else(|| {
                ConfigError::MissingBrackets {
                    jurisdiction: jurisdiction.clone(),
                    filing_status: status,
                }
            })?;
            validate_brackets(&jurisdiction, brackets)?;
        }

        require_all(
            &self.federal.standard_deduction,
            "federal standard deduction",
        )?;
        require_all(
            &self.payroll.additional_medicare_threshold,
            "additional Medicare threshold",
        )?;

        let payroll = &self.payroll;
        for (name, rate) in [
            ("se_social_security_rate", payroll.se_social_security_rate),
            ("se_medicare_rate", payroll.se_medicare_rate),
            ("employee_social_security_rate", payroll.employee_social_security_rate),
            ("employee_medicare_rate", payroll.employee_medicare_rate),
            ("additional_medicare_rate", payroll.additional_medicare_rate),
            ("se_net_earnings_factor", payroll.se_net_earnings_factor),
            ("se_deduction_factor", payroll.se_deduction_factor),
        ] {
            if rate < Decimal::ZERO || rate > Decimal::ONE {
                return Err(ConfigError::InvalidRate {
                    context: format!("payroll.{name}"),
                    rate,
                });
            }
        }

        if let Some(eitc) = &self.eitc {
            for status in FilingStatus::ALL {
                if let Some(rows) = eitc.by_children.get(status) {
                    if rows.is_empty() {
                        return Err(ConfigError::EmptyTable {
                            context: format!("eitc.by_children.{}", status.key()),
                        });
                    }
                }
            }
        }

        for (state, credits) in &self.state_credits {
            if let Some(earned) = &credits.earned_income {
                if earned.by_children.is_empty() {
                    return Err(ConfigError::EmptyTable {
                        context: format!("state_credits.{state}.earned_income"),
                    });
                }
            }
        }

        Ok(())
    }
}

fn require_all<T>(
    table: &FilingStatusTable<T>,
    context: &str,
) -> Result<(), ConfigError> {
    match table.missing().first() {
        Some(status) => Err(ConfigError::MissingFilingStatusValue {
            context: context.to_string(),
            filing_status: *status,
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::test_support::constants_2024;

    #[test]
    fn validate_accepts_complete_year() {
        assert_eq!(constants_2024().validate(), Ok(()));
    }

    #[test]
    fn validate_requires_every_bracket_schedule() {
        let mut constants = constants_2024();
        constants.federal.brackets.head_of_household = None;

        assert_eq!(
            constants.validate(),
            Err(ConfigError::MissingBrackets {
                jurisdiction: "federal 2024".to_string(),
                filing_status: FilingStatus::HeadOfHousehold,
            })
        );
    }

    #[test]
    fn validate_rejects_rate_above_one() {
        let mut constants = constants_2024();
        constants.payroll.se_medicare_rate = dec!(2.9);

        assert_eq!(
            constants.validate(),
            Err(ConfigError::InvalidRate {
                context: "payroll.se_medicare_rate".to_string(),
                rate: dec!(2.9),
            })
        );
    }

    #[test]
    fn validate_requires_standard_deduction_per_status() {
        let mut constants = constants_2024();
        constants.federal.standard_deduction.married_filing_separately = None;

        assert!(matches!(
            constants.validate(),
            Err(ConfigError::MissingFilingStatusValue {
                filing_status: FilingStatus::MarriedFilingSeparately,
                ..
            })
        ));
    }
}
