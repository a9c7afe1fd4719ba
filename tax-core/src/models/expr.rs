//! Declarative expression tree used by state conformity, deduction and credit
//! rules.
//!
//! Rulesets are data, so the tree is deserialised straight from
//! configuration. The node set is closed: an unrecognised `op` becomes
//! [`Expr::Unsupported`], which strict loading rejects and lenient loading
//! keeps so the evaluator can report it and contribute zero.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::Fact;

/// Result of evaluating an expression.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Bool(bool),
    Number(Decimal),
    Text(String),
}

impl Value {
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Bool(b) => *b,
            Self::Number(n) => !n.is_zero(),
            Self::Text(s) => !s.is_empty(),
        }
    }

    /// Numeric view of the value; booleans count as 1 or 0, text has none.
    pub fn as_number(&self) -> Option<Decimal> {
        match self {
            Self::Bool(true) => Some(Decimal::ONE),
            Self::Bool(false) => Some(Decimal::ZERO),
            Self::Number(n) => Some(*n),
            Self::Text(_) => None,
        }
    }
}

impl From<Decimal> for Value {
    fn from(n: Decimal) -> Self {
        Self::Number(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompareOp {
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = ">=")]
    Ge,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "<=")]
    Le,
    #[serde(rename = "==")]
    Eq,
    #[serde(rename = "!=")]
    Ne,
}

impl CompareOp {
    pub fn apply<T: PartialOrd>(
        &self,
        left: &T,
        right: &T,
    ) -> bool {
        match self {
            Self::Gt => left > right,
            Self::Ge => left >= right,
            Self::Lt => left < right,
            Self::Le => left <= right,
            Self::Eq => left == right,
            Self::Ne => left != right,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gt => ">",
            Self::Ge => ">=",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Eq => "==",
            Self::Ne => "!=",
        }
    }
}

/// A `value(path)` reference, resolved from its string form once at load.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FactPath {
    FederalAgi,
    FederalTaxableIncome,
    StateAgi,
    FilingStatus,
    Fact(Fact),
    /// A name outside the schema. Evaluates to zero with a warning.
    Unknown(String),
}

impl FactPath {
    pub fn parse(path: &str) -> Self {
        match path {
            "federalAGI" => Self::FederalAgi,
            "federalTaxableIncome" => Self::FederalTaxableIncome,
            "stateAGI" => Self::StateAgi,
            "filingStatus" => Self::FilingStatus,
            other => match Fact::parse(other) {
                Some(fact) => Self::Fact(fact),
                None => Self::Unknown(other.to_string()),
            },
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::FederalAgi => "federalAGI",
            Self::FederalTaxableIncome => "federalTaxableIncome",
            Self::StateAgi => "stateAGI",
            Self::FilingStatus => "filingStatus",
            Self::Fact(fact) => fact.as_str(),
            Self::Unknown(name) => name,
        }
    }
}

impl From<String> for FactPath {
    fn from(path: String) -> Self {
        Self::parse(&path)
    }
}

impl From<FactPath> for String {
    fn from(path: FactPath) -> Self {
        path.name().to_string()
    }
}

impl fmt::Display for FactPath {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseBranch {
    pub when: Expr,
    pub then: Expr,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Expr {
    Constant {
        value: Value,
    },
    #[serde(rename = "value")]
    Lookup {
        path: FactPath,
    },
    Compare {
        cmp: CompareOp,
        path: FactPath,
        value: Value,
    },
    Mul {
        #[serde(default)]
        args: Vec<Expr>,
    },
    Min {
        #[serde(default)]
        args: Vec<Expr>,
    },
    Max {
        #[serde(default)]
        args: Vec<Expr>,
    },
    Case {
        branches: Vec<CaseBranch>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        default: Option<Box<Expr>>,
    },
    #[serde(other)]
    Unsupported,
}

impl Expr {
    pub fn constant(value: impl Into<Value>) -> Self {
        Self::Constant {
            value: value.into(),
        }
    }

    pub fn lookup(path: &str) -> Self {
        Self::Lookup {
            path: FactPath::parse(path),
        }
    }

    pub fn compare(
        cmp: CompareOp,
        path: &str,
        value: impl Into<Value>,
    ) -> Self {
        Self::Compare {
            cmp,
            path: FactPath::parse(path),
            value: value.into(),
        }
    }

    /// True when this node or any node beneath it is [`Expr::Unsupported`].
    pub fn contains_unsupported(&self) -> bool {
        match self {
            Self::Unsupported => true,
            Self::Constant { .. } | Self::Lookup { .. } | Self::Compare { .. } => false,
            Self::Mul { args } | Self::Min { args } | Self::Max { args } => {
                args.iter().any(Expr::contains_unsupported)
            }
            Self::Case { branches, default } => {
                branches
                    .iter()
                    .any(|b| b.when.contains_unsupported() || b.then.contains_unsupported())
                    || default.as_deref().is_some_and(Expr::contains_unsupported)
            }
        }
    }
}
