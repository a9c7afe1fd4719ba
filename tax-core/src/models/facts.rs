//! Typed schema for the optional facts a scenario can carry.
//!
//! Rules reference facts by name (`value(path)`), but the names are resolved
//! to a [`Fact`] once, and values are read through [`ScenarioFacts::get`]
//! instead of free-form lookups into an arbitrary map.

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Fact {
    W2Wages,
    NetInvestmentIncome,
    NetCapitalGains,
    QualifyingChildren,
    ChildrenUnderSix,
    OtherDependents,
    Dependents,
    PriorYearTax,
    PriorYearAgi,
    Withholding,
    EstimatedPaymentsYtd,
    BusinessW2Wages,
    Ubia,
    IsSstb,
    HsaContributions,
    UsTreasuryInterest,
    MortgageInterest,
    CharitableContributions,
    StateAndLocalTaxes,
    MedicalExpenses,
}

impl Fact {
    pub const ALL: [Fact; 20] = [
        Self::W2Wages,
        Self::NetInvestmentIncome,
        Self::NetCapitalGains,
        Self::QualifyingChildren,
        Self::ChildrenUnderSix,
        Self::OtherDependents,
        Self::Dependents,
        Self::PriorYearTax,
        Self::PriorYearAgi,
        Self::Withholding,
        Self::EstimatedPaymentsYtd,
        Self::BusinessW2Wages,
        Self::Ubia,
        Self::IsSstb,
        Self::HsaContributions,
        Self::UsTreasuryInterest,
        Self::MortgageInterest,
        Self::CharitableContributions,
        Self::StateAndLocalTaxes,
        Self::MedicalExpenses,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::W2Wages => "w2Wages",
            Self::NetInvestmentIncome => "netInvestmentIncome",
            Self::NetCapitalGains => "netCapitalGains",
            Self::QualifyingChildren => "qualifyingChildren",
            Self::ChildrenUnderSix => "childrenUnderSix",
            Self::OtherDependents => "otherDependents",
            Self::Dependents => "dependents",
            Self::PriorYearTax => "priorYearTax",
            Self::PriorYearAgi => "priorYearAgi",
            Self::Withholding => "withholding",
            Self::EstimatedPaymentsYtd => "estimatedPaymentsYtd",
            Self::BusinessW2Wages => "businessW2Wages",
            Self::Ubia => "ubia",
            Self::IsSstb => "isSstb",
            Self::HsaContributions => "hsaContributions",
            Self::UsTreasuryInterest => "usTreasuryInterest",
            Self::MortgageInterest => "mortgageInterest",
            Self::CharitableContributions => "charitableContributions",
            Self::StateAndLocalTaxes => "stateAndLocalTaxes",
            Self::MedicalExpenses => "medicalExpenses",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|fact| fact.as_str() == name)
    }

    fn kind(&self) -> FactKind {
        match self {
            Self::QualifyingChildren
            | Self::ChildrenUnderSix
            | Self::OtherDependents
            | Self::Dependents => FactKind::Count,
            Self::IsSstb => FactKind::Flag,
            _ => FactKind::Amount,
        }
    }
}

impl fmt::Display for Fact {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

enum FactKind {
    Amount,
    Count,
    Flag,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FactError {
    #[error("unknown fact '{0}'")]
    UnknownFact(String),

    #[error("fact '{fact}' expects {expected}, got '{raw}'")]
    InvalidValue {
        fact: Fact,
        expected: &'static str,
        raw: String,
    },

    #[error("fact '{fact}' must be non-negative, got {value}")]
    Negative { fact: Fact, value: Decimal },
}

/// Optional per-scenario facts. Absent means "not supplied", which rules
/// report as a missing input rather than treating as zero silently.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScenarioFacts {
    pub w2_wages: Option<Decimal>,
    pub net_investment_income: Option<Decimal>,
    pub net_capital_gains: Option<Decimal>,
    pub qualifying_children: Option<u32>,
    pub children_under_six: Option<u32>,
    pub other_dependents: Option<u32>,
    pub dependents: Option<u32>,
    pub prior_year_tax: Option<Decimal>,
    pub prior_year_agi: Option<Decimal>,
    pub withholding: Option<Decimal>,
    pub estimated_payments_ytd: Option<Decimal>,
    pub business_w2_wages: Option<Decimal>,
    pub ubia: Option<Decimal>,
    pub is_sstb: Option<bool>,
    pub hsa_contributions: Option<Decimal>,
    pub us_treasury_interest: Option<Decimal>,
    pub mortgage_interest: Option<Decimal>,
    pub charitable_contributions: Option<Decimal>,
    pub state_and_local_taxes: Option<Decimal>,
    pub medical_expenses: Option<Decimal>,
}

impl ScenarioFacts {
    pub fn get(
        &self,
        fact: Fact,
    ) -> Option<Value> {
        match fact {
            Fact::W2Wages => self.w2_wages.map(Value::Number),
            Fact::NetInvestmentIncome => self.net_investment_income.map(Value::Number),
            Fact::NetCapitalGains => self.net_capital_gains.map(Value::Number),
            Fact::QualifyingChildren => self.qualifying_children.map(count),
            Fact::ChildrenUnderSix => self.children_under_six.map(count),
            Fact::OtherDependents => self.other_dependents.map(count),
            Fact::Dependents => self.dependents.map(count),
            Fact::PriorYearTax => self.prior_year_tax.map(Value::Number),
            Fact::PriorYearAgi => self.prior_year_agi.map(Value::Number),
            Fact::Withholding => self.withholding.map(Value::Number),
            Fact::EstimatedPaymentsYtd => self.estimated_payments_ytd.map(Value::Number),
            Fact::BusinessW2Wages => self.business_w2_wages.map(Value::Number),
            Fact::Ubia => self.ubia.map(Value::Number),
            Fact::IsSstb => self.is_sstb.map(Value::Bool),
            Fact::HsaContributions => self.hsa_contributions.map(Value::Number),
            Fact::UsTreasuryInterest => self.us_treasury_interest.map(Value::Number),
            Fact::MortgageInterest => self.mortgage_interest.map(Value::Number),
            Fact::CharitableContributions => self.charitable_contributions.map(Value::Number),
            Fact::StateAndLocalTaxes => self.state_and_local_taxes.map(Value::Number),
            Fact::MedicalExpenses => self.medical_expenses.map(Value::Number),
        }
    }

    /// Parses `raw` according to the fact's type and stores it.
    pub fn set(
        &mut self,
        fact: Fact,
        raw: &str,
    ) -> Result<(), FactError> {
        let raw = raw.trim();
        match fact.kind() {
            FactKind::Flag => {
                let flag = match raw {
                    "true" | "yes" | "1" => true,
                    "false" | "no" | "0" => false,
                    _ => {
                        return Err(FactError::InvalidValue {
                            fact,
                            expected: "true or false",
                            raw: raw.to_string(),
                        });
                    }
                };
                self.is_sstb = Some(flag);
            }
            FactKind::Count => {
                let n: u32 = raw.parse().map_err(|_| FactError::InvalidValue {
                    fact,
                    expected: "a whole number",
                    raw: raw.to_string(),
                })?;
                *self.count_slot(fact) = Some(n);
            }
            FactKind::Amount => {
                let amount = Decimal::from_str(raw).map_err(|_| FactError::InvalidValue {
                    fact,
                    expected: "a decimal amount",
                    raw: raw.to_string(),
                })?;
                if amount < Decimal::ZERO {
                    return Err(FactError::Negative {
                        fact,
                        value: amount,
                    });
                }
                *self.amount_slot(fact) = Some(amount);
            }
        }
        Ok(())
    }

    /// Parses a `name=value` assignment, as given on the command line.
    pub fn assign(
        &mut self,
        assignment: &str,
    ) -> Result<(), FactError> {
        let (name, raw) = assignment
            .split_once('=')
            .ok_or_else(|| FactError::UnknownFact(assignment.to_string()))?;
        let fact =
            Fact::parse(name.trim()).ok_or_else(|| FactError::UnknownFact(name.to_string()))?;
        self.set(fact, raw)
    }

    /// Amount facts that are present but negative, in schema order.
    pub fn negative_amounts(&self) -> Vec<(Fact, Decimal)> {
        Fact::ALL
            .into_iter()
            .filter_map(|fact| match self.get(fact) {
                Some(Value::Number(n)) if n < Decimal::ZERO => Some((fact, n)),
                _ => None,
            })
            .collect()
    }

    pub fn amount(
        &self,
        fact: Fact,
    ) -> Decimal {
        match self.get(fact) {
            Some(Value::Number(n)) => n,
            Some(Value::Bool(true)) => Decimal::ONE,
            _ => Decimal::ZERO,
        }
    }

    fn count_slot(
        &mut self,
        fact: Fact,
    ) -> &mut Option<u32> {
        match fact {
            Fact::QualifyingChildren => &mut self.qualifying_children,
            Fact::ChildrenUnderSix => &mut self.children_under_six,
            Fact::OtherDependents => &mut self.other_dependents,
            _ => &mut self.dependents,
        }
    }

    fn amount_slot(
        &mut self,
        fact: Fact,
    ) -> &mut Option<Decimal> {
        match fact {
            Fact::W2Wages => &mut self.w2_wages,
            Fact::NetInvestmentIncome => &mut self.net_investment_income,
            Fact::NetCapitalGains => &mut self.net_capital_gains,
            Fact::PriorYearTax => &mut self.prior_year_tax,
            Fact::PriorYearAgi => &mut self.prior_year_agi,
            Fact::Withholding => &mut self.withholding,
            Fact::EstimatedPaymentsYtd => &mut self.estimated_payments_ytd,
            Fact::BusinessW2Wages => &mut self.business_w2_wages,
            Fact::Ubia => &mut self.ubia,
            Fact::HsaContributions => &mut self.hsa_contributions,
            Fact::UsTreasuryInterest => &mut self.us_treasury_interest,
            Fact::MortgageInterest => &mut self.mortgage_interest,
            Fact::CharitableContributions => &mut self.charitable_contributions,
            Fact::StateAndLocalTaxes => &mut self.state_and_local_taxes,
            _ => &mut self.medical_expenses,
        }
    }
}

fn count(n: u32) -> Value {
    Value::Number(Decimal::from(n))
}
