//! Pure tax calculators.
//!
//! Nothing in here touches the repository: every function takes the
//! constants or ruleset it needs as an argument. [`TaxEngine`](crate::engine::TaxEngine)
//! and the [`scenario`](crate::scenario) orchestrator do the lookups and
//! wire these together.

pub mod brackets;
pub mod common;
pub mod diagnostics;
pub mod estimated_payments;
pub mod federal;
pub mod fica;
pub mod premium;
pub mod rules;
pub mod self_emp;
pub mod state_pipeline;
pub mod state_tax;

pub use brackets::{BracketSlice, BracketTax, compute_tax};
pub use diagnostics::{Diagnostics, Outcome, Warning};
pub use estimated_payments::{
    EstimatedPaymentInput, EstimatedPaymentResult, EstimatedPaymentWorksheet,
};
pub use federal::{FederalTaxResult, compute_federal_tax, select_deduction};
pub use fica::{FicaResult, compute_fica};
pub use rules::{EvaluationContext, RuleOutcome, apply_rule, evaluate};
pub use self_emp::{SeTaxCalculator, SeTaxConfig, SeTaxError, SeTaxResult};
pub use state_pipeline::{
    AppliedRule, ConformityResult, DeductionResult, apply_conformity, apply_deductions,
};
pub use state_tax::{StateTaxInput, StateTaxResult, compute_state_tax};
