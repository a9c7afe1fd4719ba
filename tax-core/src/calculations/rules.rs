//! Rule expression evaluator.
//!
//! Interprets [`Expr`] trees against an [`EvaluationContext`]. Evaluation is
//! fail-soft: an unknown fact, a text operand where a number is needed, or an
//! [`Expr::Unsupported`] node contributes zero and leaves a [`Warning`]
//! behind. Nothing here returns an error or panics.
//!
//! | Node | Result |
//! |------|--------|
//! | `constant(v)` | `v` |
//! | `value(path)` | context field or fact; missing → 0 plus a missing input |
//! | `compare(op, path, v)` | numeric comparison; text supports `==`/`!=` only |
//! | `mul(args)` | product, 1 when empty |
//! | `min(args)` / `max(args)` | elementwise, 0 plus a warning when empty |
//! | `case(branches, default)` | first truthy branch, else default, else 0 |
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! use tax_core::calculations::rules::{EvaluationContext, evaluate};
//! use tax_core::models::{Expr, FilingStatus, ScenarioFacts, StateCode, Value};
//!
//! let state = StateCode::parse("CA").unwrap();
//! let facts = ScenarioFacts {
//!     hsa_contributions: Some(dec!(4150)),
//!     ..Default::default()
//! };
//! let ctx = EvaluationContext::new(2024, &state, FilingStatus::Single, dec!(90000), &facts);
//!
//! let outcome = evaluate(&Expr::lookup("hsaContributions"), &ctx);
//!
//! assert_eq!(outcome.value, Value::Number(dec!(4150)));
//! assert!(outcome.diagnostics.is_empty());
//! ```

use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, warn};

use super::common::{non_negative, round_half_up};
use super::diagnostics::{Diagnostics, Outcome, Warning};
use crate::models::{
    CaseBranch, CompareOp, Expr, FactPath, FilingStatus, Rule, RuleStatus, ScenarioFacts,
    StateCode, Value,
};

/// Everything a rule expression can read.
#[derive(Debug, Clone, Copy)]
pub struct EvaluationContext<'a> {
    pub year: i32,
    pub state: &'a StateCode,
    pub filing_status: FilingStatus,
    pub federal_agi: Decimal,
    pub federal_taxable_income: Option<Decimal>,
    pub state_agi: Option<Decimal>,
    pub facts: &'a ScenarioFacts,
}

impl<'a> EvaluationContext<'a> {
    pub fn new(
        year: i32,
        state: &'a StateCode,
        filing_status: FilingStatus,
        federal_agi: Decimal,
        facts: &'a ScenarioFacts,
    ) -> Self {
        Self {
            year,
            state,
            filing_status,
            federal_agi,
            federal_taxable_income: None,
            state_agi: None,
            facts,
        }
    }

    pub fn with_federal_taxable_income(
        mut self,
        federal_taxable_income: Option<Decimal>,
    ) -> Self {
        self.federal_taxable_income = federal_taxable_income;
        self
    }

    pub fn with_state_agi(
        mut self,
        state_agi: Decimal,
    ) -> Self {
        self.state_agi = Some(state_agi);
        self
    }

    /// Resolves a path without recording anything.
    pub fn resolve(
        &self,
        path: &FactPath,
    ) -> Option<Value> {
        match path {
            FactPath::FederalAgi => Some(Value::Number(self.federal_agi)),
            FactPath::FederalTaxableIncome => self.federal_taxable_income.map(Value::Number),
            FactPath::StateAgi => self.state_agi.map(Value::Number),
            FactPath::FilingStatus => Some(Value::Text(self.filing_status.key().to_string())),
            FactPath::Fact(fact) => self.facts.get(*fact),
            FactPath::Unknown(_) => None,
        }
    }
}

/// Whether a rule fired and what it contributed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RuleOutcome {
    pub applied: bool,
    pub amount: Decimal,
}

impl RuleOutcome {
    const SKIPPED: Self = Self {
        applied: false,
        amount: Decimal::ZERO,
    };
}

/// Evaluates a free-standing expression.
pub fn evaluate(
    expr: &Expr,
    ctx: &EvaluationContext<'_>,
) -> Outcome<Value> {
    let mut diagnostics = Diagnostics::new();
    let value = Evaluator::new(ctx, "expression", &mut diagnostics).eval(expr);
    Outcome::new(value, diagnostics)
}

/// Applies one rule: checks that it is enabled and complete, records
/// unresolvable `requires` entries, tests `when` (true when absent) and
/// evaluates `amount` (zero when absent), clamped to be non-negative.
///
/// # Example
///
/// ```
/// use rust_decimal_macros::dec;
/// use tax_core::calculations::rules::{EvaluationContext, apply_rule};
/// use tax_core::models::{Expr, FilingStatus, Rule, RuleKind, RuleTarget, ScenarioFacts, StateCode};
///
/// let state = StateCode::parse("CA").unwrap();
/// let facts = ScenarioFacts::default();
/// let ctx = EvaluationContext::new(2024, &state, FilingStatus::Single, dec!(50000), &facts);
/// let rule = Rule::new("hsa_addback", RuleKind::Addition, RuleTarget::StateAgi)
///     .with_amount(Expr::lookup("hsaContributions"))
///     .with_requires(&["hsaContributions"]);
///
/// let outcome = apply_rule(&rule, &ctx);
///
/// assert!(outcome.value.applied);
/// assert_eq!(outcome.value.amount, dec!(0));
/// assert_eq!(outcome.missing_inputs(), ["hsaContributions"]);
/// ```
pub fn apply_rule(
    rule: &Rule,
    ctx: &EvaluationContext<'_>,
) -> Outcome<RuleOutcome> {
    let mut diagnostics = Diagnostics::new();

    if !rule.enabled {
        debug!(rule = %rule.id, "Rule disabled; skipping");
        diagnostics.warn(Warning::RuleDisabled {
            rule: rule.id.clone(),
        });
        return Outcome::new(RuleOutcome::SKIPPED, diagnostics);
    }
    if rule.status == RuleStatus::NeedsDetail {
        debug!(rule = %rule.id, "Rule needs detail; skipping");
        diagnostics.warn(Warning::RuleNeedsDetail {
            rule: rule.id.clone(),
        });
        return Outcome::new(RuleOutcome::SKIPPED, diagnostics);
    }

    for required in &rule.requires {
        if ctx.resolve(&FactPath::parse(required)).is_none() {
            diagnostics.missing(required.as_str());
        }
    }

    let mut evaluator = Evaluator::new(ctx, &rule.id, &mut diagnostics);
    let fires = rule
        .when
        .as_ref()
        .is_none_or(|when| evaluator.eval(when).is_truthy());
    if !fires {
        return Outcome::new(RuleOutcome::SKIPPED, diagnostics);
    }

    let amount = match &rule.amount {
        Some(expr) => {
            let value = evaluator.eval(expr);
            evaluator.number(&value, "amount")
        }
        None => Decimal::ZERO,
    };
    if amount < Decimal::ZERO {
        debug!(rule = %rule.id, amount = %amount, "Negative rule amount clamped to zero");
    }

    Outcome::new(
        RuleOutcome {
            applied: true,
            amount: round_half_up(non_negative(amount)),
        },
        diagnostics,
    )
}

struct Evaluator<'c, 'd> {
    ctx: &'c EvaluationContext<'c>,
    context: &'c str,
    diagnostics: &'d mut Diagnostics,
}

impl<'c, 'd> Evaluator<'c, 'd> {
    fn new(
        ctx: &'c EvaluationContext<'c>,
        context: &'c str,
        diagnostics: &'d mut Diagnostics,
    ) -> Self {
        Self {
            ctx,
            context,
            diagnostics,
        }
    }

    fn eval(
        &mut self,
        expr: &Expr,
    ) -> Value {
        match expr {
            Expr::Constant { value } => value.clone(),
            Expr::Lookup { path } => self.lookup(path),
            Expr::Compare { cmp, path, value } => Value::Bool(self.compare(*cmp, path, value)),
            Expr::Mul { args } => {
                let mut product = Decimal::ONE;
                for arg in args {
                    let value = self.eval(arg);
                    product *= self.number(&value, "mul");
                }
                Value::Number(product)
            }
            Expr::Min { args } => self.aggregate("min", args, Decimal::min),
            Expr::Max { args } => self.aggregate("max", args, Decimal::max),
            Expr::Case { branches, default } => self.case(branches, default.as_deref()),
            Expr::Unsupported => {
                warn!(context = %self.context, "Unsupported expression node evaluated as zero");
                self.diagnostics.warn(Warning::UnsupportedExpression {
                    context: self.context.to_string(),
                });
                Value::Number(Decimal::ZERO)
            }
        }
    }

    fn lookup(
        &mut self,
        path: &FactPath,
    ) -> Value {
        if let Some(value) = self.ctx.resolve(path) {
            return value;
        }
        if let FactPath::Unknown(name) = path {
            warn!(context = %self.context, path = %name, "Unknown fact path evaluated as zero");
            self.diagnostics.warn(Warning::UnknownFact {
                context: self.context.to_string(),
                path: name.clone(),
            });
        }
        self.diagnostics.missing(path.name());
        Value::Number(Decimal::ZERO)
    }

    fn compare(
        &mut self,
        op: CompareOp,
        path: &FactPath,
        expected: &Value,
    ) -> bool {
        let actual = self.lookup(path);

        if let (FactPath::FilingStatus, Value::Text(text)) = (path, expected) {
            if let Some(status) = FilingStatus::parse(text) {
                return self.equality(op, self.ctx.filing_status == status, path);
            }
        }

        match (&actual, expected) {
            (Value::Text(left), Value::Text(right)) => self.equality(op, left == right, path),
            (Value::Text(_), _) | (_, Value::Text(_)) => self.equality(op, false, path),
            (left, right) => match (left.as_number(), right.as_number()) {
                (Some(l), Some(r)) => op.apply(&l, &r),
                _ => false,
            },
        }
    }

    /// `==` / `!=` on operands that only support equality.
    fn equality(
        &mut self,
        op: CompareOp,
        equal: bool,
        path: &FactPath,
    ) -> bool {
        match op {
            CompareOp::Eq => equal,
            CompareOp::Ne => !equal,
            _ => {
                self.diagnostics.warn(Warning::NonNumericOperand {
                    context: self.context.to_string(),
                    detail: format!("'{}' cannot be ordered with '{}'", path, op.as_str()),
                });
                false
            }
        }
    }

    fn aggregate(
        &mut self,
        op: &'static str,
        args: &[Expr],
        pick: fn(Decimal, Decimal) -> Decimal,
    ) -> Value {
        let mut result: Option<Decimal> = None;
        for arg in args {
            let value = self.eval(arg);
            let n = self.number(&value, op);
            result = Some(result.map_or(n, |acc| pick(acc, n)));
        }
        match result {
            Some(n) => Value::Number(n),
            None => {
                self.diagnostics.warn(Warning::EmptyAggregate {
                    context: self.context.to_string(),
                    op,
                });
                Value::Number(Decimal::ZERO)
            }
        }
    }

    fn case(
        &mut self,
        branches: &[CaseBranch],
        default: Option<&Expr>,
    ) -> Value {
        for branch in branches {
            if self.eval(&branch.when).is_truthy() {
                return self.eval(&branch.then);
            }
        }
        match default {
            Some(expr) => self.eval(expr),
            None => Value::Number(Decimal::ZERO),
        }
    }

    /// Numeric view of an operand; text becomes zero with a warning.
    fn number(
        &mut self,
        value: &Value,
        op: &str,
    ) -> Decimal {
        match value.as_number() {
            Some(n) => n,
            None => {
                self.diagnostics.warn(Warning::NonNumericOperand {
                    context: self.context.to_string(),
                    detail: format!("text operand in '{op}' evaluated as 0"),
                });
                Decimal::ZERO
            }
        }
    }
}
