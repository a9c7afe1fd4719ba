//! From federal AGI to a state taxable base.
//!
//! Two passes, both pure:
//!
//! 1. [`apply_conformity`] picks the state's starting point, adds the
//!    addition rules and then subtracts the subtraction rules. Subtractions
//!    see the post-addition state AGI.
//! 2. [`apply_deductions`] takes the standard deduction, the personal
//!    exemption and (only when the caller itemizes) the deduction rules.
//!
//! Every rule that fires is listed in `applied` so a result can be audited
//! line by line.

use rust_decimal::Decimal;
use serde::Serialize;
use tracing::debug;

use super::common::{non_negative, round_half_up};
use super::diagnostics::{Diagnostics, Outcome, Warning};
use super::rules::{EvaluationContext, apply_rule};
use crate::models::{Rule, RuleKind, StartingPoint, StateRuleSet};

/// One rule that contributed to a state result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppliedRule {
    pub id: String,
    pub kind: RuleKind,
    pub amount: Decimal,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConformityResult {
    pub starting_base: Decimal,
    pub additions: Decimal,
    pub subtractions: Decimal,
    /// State AGI: `max(0, base + additions − subtractions)`.
    pub value: Decimal,
    pub applied: Vec<AppliedRule>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeductionResult {
    pub standard_deduction: Decimal,
    pub personal_exemption: Decimal,
    pub itemized: Decimal,
    /// State taxable income.
    pub value: Decimal,
    pub applied: Vec<AppliedRule>,
}

/// Applies `rules` in order and returns their total plus the ones that
/// fired.
pub(crate) fn apply_rules(
    rules: &[Rule],
    ctx: &EvaluationContext<'_>,
    diagnostics: &mut Diagnostics,
) -> (Decimal, Vec<AppliedRule>) {
    let mut total = Decimal::ZERO;
    let mut applied = Vec::new();
    for rule in rules {
        let outcome = apply_rule(rule, ctx).drain_into(diagnostics);
        if outcome.applied {
            total += outcome.amount;
            applied.push(AppliedRule {
                id: rule.id.clone(),
                kind: rule.kind,
                amount: outcome.amount,
                description: rule.description.clone(),
            });
        }
    }
    (total, applied)
}

fn starting_base(
    federal_agi: Decimal,
    ruleset: &StateRuleSet,
    ctx: &EvaluationContext<'_>,
    diagnostics: &mut Diagnostics,
) -> Decimal {
    match ruleset.starting_point {
        StartingPoint::FederalAgi => federal_agi,
        StartingPoint::FederalTaxableIncome => match ctx.federal_taxable_income {
            Some(taxable) => taxable,
            None => {
                diagnostics.warn(Warning::StartingPointFallback {
                    requested: "federal_taxable_income",
                });
                federal_agi
            }
        },
        StartingPoint::StateDefined => {
            diagnostics.warn(Warning::StartingPointFallback {
                requested: "state_defined",
            });
            federal_agi
        }
    }
}

/// Computes state AGI from federal AGI.
///
/// # Example
///
/// ```
/// use rust_decimal_macros::dec;
/// use tax_core::calculations::rules::EvaluationContext;
/// use tax_core::calculations::state_pipeline::apply_conformity;
/// use tax_core::models::{
///     Expr, FilingStatus, Rule, RuleKind, RuleTarget, ScenarioFacts, StateCode, StateRuleSet,
/// };
///
/// let state = StateCode::parse("CA").unwrap();
/// let mut ruleset = StateRuleSet::untaxed(2024, state.clone());
/// ruleset.additions.push(
///     Rule::new("hsa_addback", RuleKind::Addition, RuleTarget::StateAgi)
///         .with_amount(Expr::lookup("hsaContributions")),
/// );
/// let facts = ScenarioFacts {
///     hsa_contributions: Some(dec!(3000)),
///     ..Default::default()
/// };
/// let ctx = EvaluationContext::new(2024, &state, FilingStatus::Single, dec!(80000), &facts);
///
/// let outcome = apply_conformity(dec!(80000), &ruleset, &ctx);
///
/// assert_eq!(outcome.value.value, dec!(83000));
/// assert_eq!(outcome.value.applied.len(), 1);
/// ```
pub fn apply_conformity(
    federal_agi: Decimal,
    ruleset: &StateRuleSet,
    ctx: &EvaluationContext<'_>,
) -> Outcome<ConformityResult> {
    let mut diagnostics = Diagnostics::new();
    let base = starting_base(federal_agi, ruleset, ctx, &mut diagnostics);

    let addition_ctx = ctx.with_state_agi(base);
    let (additions, mut applied) = apply_rules(&ruleset.additions, &addition_ctx, &mut diagnostics);

    let subtraction_ctx = ctx.with_state_agi(base + additions);
    let (subtractions, applied_subtractions) =
        apply_rules(&ruleset.subtractions, &subtraction_ctx, &mut diagnostics);
    applied.extend(applied_subtractions);

    let value = round_half_up(non_negative(base + additions - subtractions));
    debug!(
        state = %ruleset.state,
        base = %base,
        additions = %additions,
        subtractions = %subtractions,
        state_agi = %value,
        "State conformity applied"
    );

    Outcome::new(
        ConformityResult {
            starting_base: base,
            additions,
            subtractions,
            value,
            applied,
        },
        diagnostics,
    )
}

/// Computes state taxable income from state AGI.
pub fn apply_deductions(
    state_agi: Decimal,
    ruleset: &StateRuleSet,
    ctx: &EvaluationContext<'_>,
    itemize: bool,
) -> Outcome<DeductionResult> {
    let mut diagnostics = Diagnostics::new();
    let standard_deduction = ruleset.standard_deduction.resolve(ctx.filing_status);
    let personal_exemption = ruleset.personal_exemption.resolve(ctx.filing_status);

    let (itemized, applied) = if itemize {
        let ctx = ctx.with_state_agi(state_agi);
        apply_rules(&ruleset.deductions, &ctx, &mut diagnostics)
    } else {
        (Decimal::ZERO, Vec::new())
    };

    let value = round_half_up(non_negative(
        state_agi - standard_deduction - personal_exemption - itemized,
    ));

    Outcome::new(
        DeductionResult {
            standard_deduction,
            personal_exemption,
            itemized,
            value,
            applied,
        },
        diagnostics,
    )
}
