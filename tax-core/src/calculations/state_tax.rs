//! State income tax for one scenario path.
//!
//! Conformity and deductions produce the taxable base, the state's schedule
//! turns it into tax, and credits come off last: first the ruleset's credit
//! rules in list order, then any state-specific premium credits. Tax never
//! drops below zero.

use rust_decimal::Decimal;
use serde::Serialize;
use tracing::debug;

use super::brackets::{BracketSlice, compute_tax};
use super::common::{non_negative, round_half_up};
use super::diagnostics::{Diagnostics, Outcome};
use super::premium::state_credits::{StateCreditInput, StateCreditResult, compute_state_credits};
use super::rules::EvaluationContext;
use super::state_pipeline::{
    AppliedRule, ConformityResult, DeductionResult, apply_conformity, apply_deductions, apply_rules,
};
use crate::error::{ConfigError, EngineError};
use crate::models::{FilingStatus, ScenarioFacts, StateCode, StateCreditConstants, StateRuleSet};

#[derive(Debug, Clone)]
pub struct StateTaxInput<'a> {
    pub filing_status: FilingStatus,
    pub federal_agi: Decimal,
    pub federal_taxable_income: Option<Decimal>,
    pub facts: &'a ScenarioFacts,
    pub itemize: bool,
    /// Present only when premium adjustments are enabled.
    pub premium_credits: Option<StateCreditInput>,
    pub credit_constants: Option<&'a StateCreditConstants>,
}

impl<'a> StateTaxInput<'a> {
    pub fn new(
        filing_status: FilingStatus,
        federal_agi: Decimal,
        facts: &'a ScenarioFacts,
    ) -> Self {
        Self {
            filing_status,
            federal_agi,
            federal_taxable_income: None,
            facts,
            itemize: false,
            premium_credits: None,
            credit_constants: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StateTaxResult {
    pub state: StateCode,
    pub conformity: ConformityResult,
    pub deductions: DeductionResult,
    pub tax_before_credits: Decimal,
    pub rule_credits: Decimal,
    pub credits_applied: Vec<AppliedRule>,
    pub premium_credits: Option<StateCreditResult>,
    /// Final state tax after every credit.
    pub tax: Decimal,
    pub effective_rate: Decimal,
    pub marginal_rate: Decimal,
    pub breakdown: Vec<BracketSlice>,
}

impl StateTaxResult {
    pub fn state_agi(&self) -> Decimal {
        self.conformity.value
    }

    pub fn taxable_income(&self) -> Decimal {
        self.deductions.value
    }
}

/// Runs the full state computation for one path.
///
/// # Errors
///
/// A progressive state without brackets for the filing status, or a bracket
/// table the calculator cannot use.
pub fn compute_state_tax(
    input: &StateTaxInput<'_>,
    ruleset: &StateRuleSet,
) -> Result<Outcome<StateTaxResult>, EngineError> {
    let mut diagnostics = Diagnostics::new();
    let jurisdiction = format!("{} {}", ruleset.state, ruleset.tax_year);
    let ctx = EvaluationContext::new(
        ruleset.tax_year,
        &ruleset.state,
        input.filing_status,
        input.federal_agi,
        input.facts,
    )
    .with_federal_taxable_income(input.federal_taxable_income);

    let conformity = apply_conformity(input.federal_agi, ruleset, &ctx).drain_into(&mut diagnostics);
    let deductions = apply_deductions(conformity.value, ruleset, &ctx, input.itemize)
        .drain_into(&mut diagnostics);

    let schedule = ruleset
        .income_tax
        .schedule_for(input.filing_status)
        .ok_or_else(|| ConfigError::MissingBrackets {
            jurisdiction: jurisdiction.clone(),
            filing_status: input.filing_status,
        })?;
    let bracket_tax = compute_tax(deductions.value, &schedule, &jurisdiction)?;

    let credit_ctx = ctx.with_state_agi(conformity.value);
    let (rule_credits, credits_applied) =
        apply_rules(&ruleset.credits, &credit_ctx, &mut diagnostics);
    let mut tax = non_negative(bracket_tax.tax - rule_credits);

    let premium_credits = input.premium_credits.as_ref().map(|credit_input| {
        compute_state_credits(credit_input, input.credit_constants).drain_into(&mut diagnostics)
    });
    if let Some(credits) = &premium_credits {
        tax = non_negative(tax - credits.total());
    }
    let tax = round_half_up(tax);

    debug!(
        state = %ruleset.state,
        state_agi = %conformity.value,
        taxable_income = %deductions.value,
        tax_before_credits = %bracket_tax.tax,
        tax = %tax,
        "State tax computed"
    );

    Ok(Outcome::new(
        StateTaxResult {
            state: ruleset.state.clone(),
            tax_before_credits: bracket_tax.tax,
            rule_credits,
            credits_applied,
            premium_credits,
            tax,
            effective_rate: bracket_tax.effective_rate,
            marginal_rate: bracket_tax.marginal_rate(),
            breakdown: bracket_tax.breakdown,
            conformity,
            deductions,
        },
        diagnostics,
    ))
}
