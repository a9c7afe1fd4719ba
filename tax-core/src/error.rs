//! Fatal error types.
//!
//! Anything in here stops a computation. Problems that only make a rule or a
//! premium adjustment contribute zero are reported as
//! [`Warning`](crate::calculations::diagnostics::Warning)s instead.

use rust_decimal::Decimal;
use thiserror::Error;

use crate::calculations::self_emp::SeTaxError;
use crate::models::{FilingStatus, RuleKind};
use crate::repository::RepositoryError;

/// A constants table or ruleset that cannot be used as loaded.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{jurisdiction}: no tax brackets for {filing_status}")]
    MissingBrackets {
        jurisdiction: String,
        filing_status: FilingStatus,
    },

    #[error("{jurisdiction}: bracket table is empty")]
    EmptyBrackets { jurisdiction: String },

    #[error("{jurisdiction}: bracket {index} does not raise the upper bound")]
    UnorderedBrackets { jurisdiction: String, index: usize },

    #[error("{jurisdiction}: bracket {index} is unbounded but is not the last bracket")]
    UnboundedBeforeLast { jurisdiction: String, index: usize },

    #[error("{jurisdiction}: the top bracket must be unbounded")]
    BoundedTopBracket { jurisdiction: String },

    #[error("{context}: rate must be between 0 and 1, got {rate}")]
    InvalidRate { context: String, rate: Decimal },

    #[error("{context}: no value for {filing_status}")]
    MissingFilingStatusValue {
        context: String,
        filing_status: FilingStatus,
    },

    #[error("{context}: table is empty")]
    EmptyTable { context: String },

    #[error("rule '{rule}' is a {kind} rule but is listed under {list}")]
    RuleKindMismatch {
        rule: String,
        kind: RuleKind,
        list: RuleKind,
    },

    #[error("rule '{rule}' uses an expression node this engine does not understand")]
    UnsupportedExpression { rule: String },

    #[error("duplicate rule id '{0}'")]
    DuplicateRuleId(String),

    #[error("invalid state code '{0}'")]
    InvalidStateCode(String),
}

/// Errors surfaced by [`TaxEngine`](crate::engine::TaxEngine) operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EngineError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    SelfEmployment(#[from] SeTaxError),

    #[error("{field} must be non-negative, got {value}")]
    NegativeInput { field: &'static str, value: Decimal },

    #[error("tax year {0} is outside the supported calendar range")]
    InvalidTaxYear(i32),
}
