//! Non-fatal findings carried alongside a numeric result.
//!
//! Optional rule content and premium adjustments never block a computation.
//! When one of them cannot be evaluated it contributes zero and the reason is
//! recorded here so callers can disclose it.

use serde::Serialize;
use thiserror::Error;

use crate::models::FilingStatus;

#[derive(Debug, Clone, Error, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Warning {
    #[error("rule '{rule}' is disabled and was skipped")]
    RuleDisabled { rule: String },

    #[error("rule '{rule}' needs more detail before it can be applied and was skipped")]
    RuleNeedsDetail { rule: String },

    #[error("{context}: unsupported expression node evaluated as 0")]
    UnsupportedExpression { context: String },

    #[error("{context}: unknown fact '{path}' evaluated as 0")]
    UnknownFact { context: String, path: String },

    #[error("{context}: {detail}")]
    NonNumericOperand { context: String, detail: String },

    #[error("{context}: '{op}' with no arguments evaluated as 0")]
    EmptyAggregate { context: String, op: &'static str },

    #[error("starting point '{requested}' is unavailable; using federal AGI")]
    StartingPointFallback { requested: &'static str },

    #[error("no {block} constants for this tax year; adjustment is 0")]
    MissingConstants { block: String },

    #[error("no earned income credit table for {filing_status}; credit is 0")]
    EitcIneligibleFilingStatus { filing_status: FilingStatus },

    #[error("break-even search did not bracket the target below {upper_bound}")]
    BreakEvenNotConverged { upper_bound: String },
}

/// Warnings and missing inputs accumulated by one computation.
///
/// Both lists keep first-seen order and never hold duplicates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Diagnostics {
    pub warnings: Vec<Warning>,
    pub missing_inputs: Vec<String>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn warn(
        &mut self,
        warning: Warning,
    ) {
        if !self.warnings.contains(&warning) {
            self.warnings.push(warning);
        }
    }

    pub fn missing(
        &mut self,
        input: impl Into<String>,
    ) {
        let input = input.into();
        if !self.missing_inputs.contains(&input) {
            self.missing_inputs.push(input);
        }
    }

    /// Folds another set of findings into this one, keeping order and
    /// dropping duplicates.
    pub fn merge(
        &mut self,
        other: Diagnostics,
    ) {
        for warning in other.warnings {
            self.warn(warning);
        }
        for input in other.missing_inputs {
            self.missing(input);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.warnings.is_empty() && self.missing_inputs.is_empty()
    }
}

/// A value plus the findings produced while computing it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Outcome<T> {
    pub value: T,
    #[serde(flatten)]
    pub diagnostics: Diagnostics,
}

impl<T> Outcome<T> {
    pub fn new(
        value: T,
        diagnostics: Diagnostics,
    ) -> Self {
        Self { value, diagnostics }
    }

    /// A value with nothing to report.
    pub fn clean(value: T) -> Self {
        Self::new(value, Diagnostics::new())
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.diagnostics.warnings
    }

    pub fn missing_inputs(&self) -> &[String] {
        &self.diagnostics.missing_inputs
    }

    /// Moves the findings into `sink` and returns the bare value.
    pub fn drain_into(
        self,
        sink: &mut Diagnostics,
    ) -> T {
        sink.merge(self.diagnostics);
        self.value
    }
}
