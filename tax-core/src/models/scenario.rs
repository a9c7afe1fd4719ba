use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{FilingStatus, ScenarioFacts, StateCode};
use crate::error::EngineError;

/// One W-2 vs 1099 comparison request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioInput {
    pub tax_year: i32,
    pub filing_status: FilingStatus,
    pub state: StateCode,
    /// Gross salary on the W-2 path.
    pub w2_salary: Decimal,
    /// Gross contract income on the 1099 path.
    pub income_1099: Decimal,
    /// Deductible business expenses on the 1099 path.
    #[serde(default)]
    pub business_expenses: Decimal,
    #[serde(default)]
    pub itemize_state_deductions: bool,
    /// Entitlement flag: premium adjustments and the planning block only run
    /// when this is set.
    #[serde(default)]
    pub premium: bool,
    #[serde(default)]
    pub estimated_payments_by_quarter: Option<[Decimal; 4]>,
    /// Date the penalty-risk tracker treats as "today". Absent means every
    /// quarter is already due.
    #[serde(default)]
    pub as_of: Option<NaiveDate>,
    #[serde(default)]
    pub farmer_or_fisher: bool,
    #[serde(default)]
    pub facts: ScenarioFacts,
}

impl ScenarioInput {
    pub fn new(
        tax_year: i32,
        filing_status: FilingStatus,
        state: StateCode,
        w2_salary: Decimal,
        income_1099: Decimal,
    ) -> Self {
        Self {
            tax_year,
            filing_status,
            state,
            w2_salary,
            income_1099,
            business_expenses: Decimal::ZERO,
            itemize_state_deductions: false,
            premium: false,
            estimated_payments_by_quarter: None,
            as_of: None,
            farmer_or_fisher: false,
            facts: ScenarioFacts::default(),
        }
    }

    /// Rejects negative money anywhere in the input.
    ///
    /// Run once at the boundary; the calculators downstream assume it held.
    pub fn validate(&self) -> Result<(), EngineError> {
        for (field, value) in [
            ("w2_salary", self.w2_salary),
            ("income_1099", self.income_1099),
            ("business_expenses", self.business_expenses),
        ] {
            if value < Decimal::ZERO {
                return Err(EngineError::NegativeInput { field, value });
            }
        }

        if let Some(quarters) = &self.estimated_payments_by_quarter {
            if let Some(value) = quarters.iter().copied().find(|q| *q < Decimal::ZERO) {
                return Err(EngineError::NegativeInput {
                    field: "estimated_payments_by_quarter",
                    value,
                });
            }
        }

        if let Some((fact, value)) = self.facts.negative_amounts().into_iter().next() {
            return Err(EngineError::NegativeInput {
                field: fact.as_str(),
                value,
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    fn input() -> ScenarioInput {
        ScenarioInput::new(
            2024,
            FilingStatus::Single,
            StateCode::parse("CA").unwrap(),
            dec!(100000),
            dec!(120000),
        )
    }

    #[test]
    fn validate_accepts_non_negative_input() {
        assert_eq!(input().validate(), Ok(()));
    }

    #[test]
    fn validate_names_the_negative_field() {
        let scenario = ScenarioInput {
            business_expenses: dec!(-1),
            ..input()
        };

        assert_eq!(
            scenario.validate(),
            Err(EngineError::NegativeInput {
                field: "business_expenses",
                value: dec!(-1),
            })
        );
    }

    #[test]
    fn validate_checks_quarterly_payments() {
        let scenario = ScenarioInput {
            estimated_payments_by_quarter: Some([dec!(100), dec!(-5), dec!(0), dec!(0)]),
            ..input()
        };

        assert!(matches!(
            scenario.validate(),
            Err(EngineError::NegativeInput {
                field: "estimated_payments_by_quarter",
                ..
            })
        ));
    }

    #[test]
    fn validate_checks_fact_amounts() {
        let mut scenario = input();
        scenario.facts.withholding = Some(dec!(-200));

        assert_eq!(
            scenario.validate(),
            Err(EngineError::NegativeInput {
                field: "withholding",
                value: dec!(-200),
            })
        );
    }

    #[test]
    fn deserializes_with_defaults() {
        let scenario: ScenarioInput = serde_json::from_str(
            r#"{
                "tax_year": 2024,
                "filing_status": "single",
                "state": "tx",
                "w2_salary": "90000",
                "income_1099": "110000",
                "facts": { "qualifyingChildren": 2 }
            }"#,
        )
        .unwrap();

        assert_eq!(scenario.state.as_str(), "TX");
        assert_eq!(scenario.business_expenses, dec!(0));
        assert!(!scenario.premium);
        assert_eq!(scenario.facts.qualifying_children, Some(2));
    }
}
