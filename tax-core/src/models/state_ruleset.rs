use std::collections::HashSet;
use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{Expr, FilingStatus, FilingStatusTable, StateCode, TaxSchedule, validate_brackets};
use crate::error::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    Addition,
    Subtraction,
    Deduction,
    Credit,
}

impl fmt::Display for RuleKind {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(match self {
            Self::Addition => "addition",
            Self::Subtraction => "subtraction",
            Self::Deduction => "deduction",
            Self::Credit => "credit",
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleStatus {
    #[default]
    Ok,
    /// The rule is known to exist but its mechanics are not modelled yet.
    NeedsDetail,
}

/// What a rule's amount feeds into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleTarget {
    StateAgi,
    StateTaxableIncome,
    Itemized,
    StateTax,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    pub id: String,
    pub kind: RuleKind,
    pub affects: RuleTarget,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
    #[serde(default)]
    pub status: RuleStatus,
    #[serde(default)]
    pub when: Option<Expr>,
    #[serde(default)]
    pub amount: Option<Expr>,
    #[serde(default)]
    pub requires: Vec<String>,
}

fn enabled_by_default() -> bool {
    true
}

impl Rule {
    pub fn new(
        id: impl Into<String>,
        kind: RuleKind,
        affects: RuleTarget,
    ) -> Self {
        Self {
            id: id.into(),
            kind,
            affects,
            description: None,
            enabled: true,
            status: RuleStatus::Ok,
            when: None,
            amount: None,
            requires: Vec::new(),
        }
    }

    pub fn with_amount(
        mut self,
        amount: Expr,
    ) -> Self {
        self.amount = Some(amount);
        self
    }

    pub fn with_when(
        mut self,
        when: Expr,
    ) -> Self {
        self.when = Some(when);
        self
    }

    pub fn with_requires(
        mut self,
        requires: &[&str],
    ) -> Self {
        self.requires = requires.iter().map(|r| r.to_string()).collect();
        self
    }

    pub fn with_description(
        mut self,
        description: impl Into<String>,
    ) -> Self {
        self.description = Some(description.into());
        self
    }

    fn contains_unsupported(&self) -> bool {
        self.when.as_ref().is_some_and(Expr::contains_unsupported)
            || self.amount.as_ref().is_some_and(Expr::contains_unsupported)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StartingPoint {
    #[default]
    FederalAgi,
    FederalTaxableIncome,
    /// The state computes its own base; not modelled, so the pipeline falls
    /// back to federal AGI and says so.
    StateDefined,
}

/// A standard deduction or personal exemption: a flat default, optionally
/// overridden per filing status.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeductionAmount {
    #[serde(default)]
    pub default: Option<Decimal>,
    #[serde(default)]
    pub by_filing_status: FilingStatusTable<Decimal>,
}

impl DeductionAmount {
    pub fn flat(amount: Decimal) -> Self {
        Self {
            default: Some(amount),
            by_filing_status: FilingStatusTable::default(),
        }
    }

    /// Per-status override, then the default, then zero.
    pub fn resolve(
        &self,
        status: FilingStatus,
    ) -> Decimal {
        self.by_filing_status
            .get(status)
            .copied()
            .or(self.default)
            .unwrap_or(Decimal::ZERO)
    }
}

/// How a state taxes its taxable base.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StateIncomeTax {
    None,
    Flat {
        rate: Decimal,
    },
    Progressive {
        brackets: FilingStatusTable<Vec<super::TaxBracket>>,
    },
}

impl StateIncomeTax {
    /// The schedule for one filing status. `None` when a progressive state
    /// has no table for that status.
    pub fn schedule_for(
        &self,
        status: FilingStatus,
    ) -> Option<TaxSchedule> {
        match self {
            Self::None => Some(TaxSchedule::None),
            Self::Flat { rate } => Some(TaxSchedule::Flat { rate: *rate }),
            Self::Progressive { brackets } => brackets.get(status).map(|b| TaxSchedule::Progressive {
                brackets: b.clone(),
            }),
        }
    }
}

/// Conformity, deduction and credit rules for one state in one tax year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateRuleSet {
    pub tax_year: i32,
    pub state: StateCode,
    #[serde(default)]
    pub name: Option<String>,
    pub income_tax: StateIncomeTax,
    #[serde(default)]
    pub starting_point: StartingPoint,
    #[serde(default)]
    pub additions: Vec<Rule>,
    #[serde(default)]
    pub subtractions: Vec<Rule>,
    #[serde(default)]
    pub deductions: Vec<Rule>,
    #[serde(default)]
    pub credits: Vec<Rule>,
    #[serde(default)]
    pub standard_deduction: DeductionAmount,
    #[serde(default)]
    pub personal_exemption: DeductionAmount,
}

impl StateRuleSet {
    /// A state with no income tax and no rules.
    pub fn untaxed(
        tax_year: i32,
        state: StateCode,
    ) -> Self {
        Self {
            tax_year,
            state,
            name: None,
            income_tax: StateIncomeTax::None,
            starting_point: StartingPoint::FederalAgi,
            additions: Vec::new(),
            subtractions: Vec::new(),
            deductions: Vec::new(),
            credits: Vec::new(),
            standard_deduction: DeductionAmount::default(),
            personal_exemption: DeductionAmount::default(),
        }
    }

    pub fn rules(&self) -> impl Iterator<Item = (RuleKind, &Rule)> {
        self.additions
            .iter()
            .map(|r| (RuleKind::Addition, r))
            .chain(self.subtractions.iter().map(|r| (RuleKind::Subtraction, r)))
            .chain(self.deductions.iter().map(|r| (RuleKind::Deduction, r)))
            .chain(self.credits.iter().map(|r| (RuleKind::Credit, r)))
    }

    /// Structural checks run once at load time.
    ///
    /// With `allow_unsupported` set, rules containing unknown expression
    /// nodes are kept and will evaluate to zero with a warning.
    pub fn validate(
        &self,
        allow_unsupported: bool,
    ) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();
        for (list, rule) in self.rules() {
            if rule.kind != list {
                return Err(ConfigError::RuleKindMismatch {
                    rule: rule.id.clone(),
                    kind: rule.kind,
                    list,
                });
            }
            if !seen.insert(rule.id.as_str()) {
                return Err(ConfigError::DuplicateRuleId(rule.id.clone()));
            }
            if !allow_unsupported && rule.contains_unsupported() {
                return Err(ConfigError::UnsupportedExpression {
                    rule: rule.id.clone(),
                });
            }
        }

        match &self.income_tax {
            StateIncomeTax::None => {}
            StateIncomeTax::Flat { rate } => {
                if *rate < Decimal::ZERO || *rate > Decimal::ONE {
                    return Err(ConfigError::InvalidRate {
                        context: format!("{} {} flat rate", self.state, self.tax_year),
                        rate: *rate,
                    });
                }
            }
            StateIncomeTax::Progressive { brackets } => {
                let jurisdiction = format!("{} {}", self.state, self.tax_year);
                for status in FilingStatus::ALL {
                    let table = brackets.get(status).ok_or_else(|| ConfigError::MissingBrackets {
                        jurisdiction: jurisdiction.clone(),
                        filing_status: status,
                    })?;
                    validate_brackets(&jurisdiction, table)?;
                }
            }
        }

        Ok(())
    }
}
