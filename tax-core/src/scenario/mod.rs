//! W-2 vs 1099 comparison.
//!
//! Both paths run the same federal and state machinery; they differ in what
//! counts as AGI and which payroll tax applies:
//!
//! | | W-2 path | 1099 path |
//! |---|---|---|
//! | Gross | salary | contract income |
//! | Payroll tax | employee FICA | SE tax on `max(0, income − expenses)` |
//! | Federal AGI | salary | net profit − deductible half of SE tax |
//! | QBI deduction | none | premium only |
//!
//! With the premium flag set, NIIT, child credits, EITC, itemized
//! deductions and state credits are applied on both paths, and the 1099
//! path also gets a planning block (safe harbor, 1040-ES worksheet,
//! quarterly penalty risk).

pub mod break_even;

use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, info};

pub use break_even::BreakEven;

use crate::calculations::common::{non_negative, round_half_up};
use crate::calculations::diagnostics::{Diagnostics, Outcome, Warning};
use crate::calculations::estimated_payments::{
    EstimatedPaymentInput, EstimatedPaymentResult, EstimatedPaymentWorksheet,
};
use crate::calculations::federal::{FederalTaxResult, compute_federal_tax, select_deduction};
use crate::calculations::fica::{FicaResult, compute_fica};
use crate::calculations::premium::{
    ChildCreditInput, ChildCreditResult, EitcInput, EitcResult, EstimatedPayments, ItemizedResult,
    NiitResult, PenaltyRiskInput, PenaltyRiskResult, QbiInput, QbiResult, SafeHarborResult,
    StateCreditInput, compute_child_credits, compute_eitc, compute_itemized, compute_niit,
    compute_penalty_risk, compute_qbi_deduction, compute_safe_harbor,
};
use crate::calculations::self_emp::{SeTaxCalculator, SeTaxConfig, SeTaxResult};
use crate::calculations::state_tax::{StateTaxInput, StateTaxResult, compute_state_tax};
use crate::error::EngineError;
use crate::models::{
    Fact, FilingStatus, ScenarioFacts, ScenarioInput, StateCode, StateRuleSet, TaxYearConstants,
};

/// Payroll tax owed on one path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PayrollTax {
    Fica(FicaResult),
    SelfEmployment(SeTaxResult),
}

impl PayrollTax {
    pub fn total(&self) -> Decimal {
        match self {
            Self::Fica(fica) => fica.total,
            Self::SelfEmployment(se) => se.total,
        }
    }
}

/// Premium adjustments computed for one path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PremiumAdjustments {
    pub niit: NiitResult,
    pub child_credits: ChildCreditResult,
    pub eitc: EitcResult,
    pub itemized: Option<ItemizedResult>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PathResult {
    pub gross_income: Decimal,
    pub business_expenses: Decimal,
    pub agi: Decimal,
    pub federal: FederalTaxResult,
    /// Regular tax after non-refundable credits, plus NIIT.
    pub federal_tax: Decimal,
    pub payroll: PayrollTax,
    pub state: StateTaxResult,
    pub qbi: Option<QbiResult>,
    pub premium: Option<PremiumAdjustments>,
    pub refundable_credits: Decimal,
    /// Federal + payroll + state − refundable credits, never below zero.
    pub total_tax: Decimal,
    pub net_income: Decimal,
    pub effective_rate: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanningResult {
    pub safe_harbor: Option<SafeHarborResult>,
    pub estimated_payments: EstimatedPaymentResult,
    pub penalty_risk: Option<PenaltyRiskResult>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScenarioResult {
    pub tax_year: i32,
    pub filing_status: FilingStatus,
    pub state: StateCode,
    pub w2: PathResult,
    pub contractor: PathResult,
    /// Contractor net income minus W-2 net income.
    pub annual_difference: Decimal,
    pub monthly_difference: Decimal,
    pub break_even: BreakEven,
    pub planning: Option<PlanningResult>,
    #[serde(flatten)]
    pub diagnostics: Diagnostics,
}

/// Everything one comparison reads. Built by the engine after the
/// repository lookups.
#[derive(Debug, Clone, Copy)]
pub struct Scenario<'a> {
    pub input: &'a ScenarioInput,
    pub constants: &'a TaxYearConstants,
    pub ruleset: &'a StateRuleSet,
}

/// Amounts the premium calculators need that differ between the paths.
struct PathIncome {
    gross: Decimal,
    expenses: Decimal,
    agi: Decimal,
    earned: Decimal,
}

impl<'a> Scenario<'a> {
    pub fn new(
        input: &'a ScenarioInput,
        constants: &'a TaxYearConstants,
        ruleset: &'a StateRuleSet,
    ) -> Self {
        Self {
            input,
            constants,
            ruleset,
        }
    }

    fn facts(&self) -> &'a ScenarioFacts {
        &self.input.facts
    }

    /// Runs both paths, the break-even search and, with the premium flag,
    /// the planning block.
    ///
    /// # Errors
    ///
    /// Negative inputs and missing or malformed configuration.
    pub fn compare(&self) -> Result<ScenarioResult, EngineError> {
        self.input.validate()?;
        let mut diagnostics = Diagnostics::new();

        let w2 = self.w2_path()?.drain_into(&mut diagnostics);
        let contractor = self
            .contractor_path(self.input.income_1099)?
            .drain_into(&mut diagnostics);

        let annual_difference = contractor.net_income - w2.net_income;
        let monthly_difference = round_half_up(annual_difference / Decimal::from(12));

        let break_even = self.break_even(w2.net_income)?;
        if !break_even.converged {
            diagnostics.warn(Warning::BreakEvenNotConverged {
                upper_bound: break_even.income_1099.to_string(),
            });
        }

        let planning = if self.input.premium {
            Some(self.planning(&contractor)?.drain_into(&mut diagnostics))
        } else {
            None
        };

        info!(
            tax_year = self.input.tax_year,
            state = %self.input.state,
            w2_net = %w2.net_income,
            contractor_net = %contractor.net_income,
            break_even = %break_even.income_1099,
            "Scenario compared"
        );

        Ok(ScenarioResult {
            tax_year: self.input.tax_year,
            filing_status: self.input.filing_status,
            state: self.input.state.clone(),
            w2,
            contractor,
            annual_difference,
            monthly_difference,
            break_even,
            planning,
            diagnostics,
        })
    }

    /// Salary taxed as wages.
    pub fn w2_path(&self) -> Result<Outcome<PathResult>, EngineError> {
        let input = self.input;
        let salary = non_negative(input.w2_salary);
        let payroll = PayrollTax::Fica(compute_fica(
            salary,
            input.filing_status,
            &self.constants.payroll,
        )?);

        self.finish_path(
            PathIncome {
                gross: salary,
                expenses: Decimal::ZERO,
                agi: salary,
                earned: salary,
            },
            payroll,
            None,
        )
    }

    /// Contract income taxed as self-employment. Takes the gross so the
    /// break-even search can vary it.
    pub fn contractor_path(
        &self,
        income_1099: Decimal,
    ) -> Result<Outcome<PathResult>, EngineError> {
        let input = self.input;
        let facts = self.facts();
        let expenses = non_negative(input.business_expenses);
        let net_profit = non_negative(income_1099 - expenses);

        let config = SeTaxConfig::from_payroll(&self.constants.payroll, input.filing_status)?;
        let se = SeTaxCalculator::new(config).calculate(net_profit, facts.amount(Fact::W2Wages))?;
        let agi = non_negative(net_profit - se.deductible_half);

        let qbi_input = QbiInput {
            qbi_base: non_negative(net_profit - se.deductible_half),
            net_capital_gains: facts.amount(Fact::NetCapitalGains),
            w2_wages: facts.amount(Fact::BusinessW2Wages),
            ubia: facts.amount(Fact::Ubia),
            is_sstb: facts.is_sstb.unwrap_or(false),
            ..QbiInput::new(input.filing_status)
        };

        self.finish_path(
            PathIncome {
                gross: non_negative(income_1099),
                expenses,
                agi,
                earned: agi,
            },
            PayrollTax::SelfEmployment(se),
            Some(qbi_input),
        )
    }

    /// Federal, state and premium steps shared by both paths. `qbi` carries
    /// the QBI inputs except taxable income, which is only known here.
    fn finish_path(
        &self,
        income: PathIncome,
        payroll: PayrollTax,
        qbi: Option<QbiInput>,
    ) -> Result<Outcome<PathResult>, EngineError> {
        let input = self.input;
        let constants = self.constants;
        let facts = self.facts();
        let premium = input.premium;
        let mut diagnostics = Diagnostics::new();

        let itemized = if premium {
            compute_itemized(facts, income.agi, input.filing_status, constants.itemized.as_ref())
                .drain_into(&mut diagnostics)
        } else {
            None
        };
        let itemized_total = itemized.as_ref().map(|result| result.total);

        let qbi = match qbi {
            Some(qbi_input) if premium => {
                let (deduction, _) =
                    select_deduction(input.filing_status, itemized_total, constants)?;
                let qbi_input = QbiInput {
                    taxable_before_qbi: non_negative(income.agi - deduction),
                    ..qbi_input
                };
                Some(
                    compute_qbi_deduction(&qbi_input, constants.qbi.as_ref())
                        .drain_into(&mut diagnostics),
                )
            }
            _ => None,
        };
        let qbi_deduction = qbi.as_ref().map_or(Decimal::ZERO, |q| q.deduction);

        let federal = compute_federal_tax(
            income.agi,
            input.filing_status,
            qbi_deduction,
            itemized_total,
            constants,
        )?;

        let premium_adjustments = if premium {
            Some(self.premium_adjustments(&income, &federal, itemized, &mut diagnostics))
        } else {
            None
        };

        let mut state_input = StateTaxInput {
            federal_taxable_income: Some(federal.taxable_income),
            itemize: input.itemize_state_deductions,
            ..StateTaxInput::new(input.filing_status, income.agi, facts)
        };
        if premium {
            state_input.premium_credits = Some(StateCreditInput {
                earned_income: income.earned,
                agi: income.agi,
                qualifying_children: facts.qualifying_children.unwrap_or(0),
                children_under_six: facts.children_under_six,
            });
            state_input.credit_constants = constants.state_credits.get(input.state.as_str());
        }
        let state = compute_state_tax(&state_input, self.ruleset)?.drain_into(&mut diagnostics);

        let (non_refundable, niit_tax, refundable_credits) = match &premium_adjustments {
            Some(adjustments) => (
                adjustments.child_credits.non_refundable,
                adjustments.niit.tax,
                adjustments.child_credits.refundable + adjustments.eitc.credit,
            ),
            None => (Decimal::ZERO, Decimal::ZERO, Decimal::ZERO),
        };
        let federal_tax = non_negative(federal.tax - non_refundable) + niit_tax;
        let taxes = federal_tax + payroll.total() + state.tax;
        let total_tax = non_negative(taxes - refundable_credits);
        let net_income = round_half_up(non_negative(
            income.gross - income.expenses - taxes + refundable_credits,
        ));
        let effective_rate = if income.gross > Decimal::ZERO {
            (total_tax / income.gross).round_dp(4)
        } else {
            Decimal::ZERO
        };

        debug!(
            gross = %income.gross,
            agi = %income.agi,
            federal_tax = %federal_tax,
            payroll_tax = %payroll.total(),
            state_tax = %state.tax,
            net_income = %net_income,
            "Path computed"
        );

        Ok(Outcome::new(
            PathResult {
                gross_income: income.gross,
                business_expenses: income.expenses,
                agi: income.agi,
                federal,
                federal_tax,
                payroll,
                state,
                qbi,
                premium: premium_adjustments,
                refundable_credits,
                total_tax,
                net_income,
                effective_rate,
            },
            diagnostics,
        ))
    }

    fn premium_adjustments(
        &self,
        income: &PathIncome,
        federal: &FederalTaxResult,
        itemized: Option<ItemizedResult>,
        diagnostics: &mut Diagnostics,
    ) -> PremiumAdjustments {
        let input = self.input;
        let constants = self.constants;
        let facts = self.facts();
        let investment_income = facts.amount(Fact::NetInvestmentIncome);
        let children = facts.qualifying_children.unwrap_or(0);

        let niit = compute_niit(
            investment_income,
            income.agi,
            input.filing_status,
            constants.niit.as_ref(),
        )
        .drain_into(diagnostics);

        let child_credits = compute_child_credits(
            &ChildCreditInput {
                filing_status: input.filing_status,
                qualifying_children: children,
                other_dependents: facts.other_dependents.unwrap_or(0),
                magi: income.agi,
                earned_income: income.earned,
                tax_liability: federal.tax,
            },
            constants.child_credits.as_ref(),
        )
        .drain_into(diagnostics);

        let eitc = compute_eitc(
            &EitcInput {
                filing_status: input.filing_status,
                earned_income: income.earned,
                agi: income.agi,
                investment_income,
                qualifying_children: children,
            },
            constants.eitc.as_ref(),
        )
        .drain_into(diagnostics);

        PremiumAdjustments {
            niit,
            child_credits,
            eitc,
            itemized,
        }
    }

    /// 1099 gross income that leaves the same net income as the W-2 path.
    ///
    /// Diagnostics from the trial runs are discarded; only the final
    /// convergence status is reported.
    pub fn break_even(
        &self,
        target_net_income: Decimal,
    ) -> Result<BreakEven, EngineError> {
        let initial_upper = non_negative(self.input.w2_salary) + non_negative(self.input.business_expenses);
        break_even::search(target_net_income, initial_upper, |income| {
            Ok(self.contractor_path(income)?.value.net_income)
        })
    }

    /// Safe harbor, the 1040-ES worksheet and quarterly penalty risk for the
    /// 1099 path.
    pub fn planning(
        &self,
        contractor: &PathResult,
    ) -> Result<Outcome<PlanningResult>, EngineError> {
        let input = self.input;
        let facts = self.facts();
        let mut diagnostics = Diagnostics::new();

        if facts.prior_year_tax.is_none() {
            diagnostics.missing(Fact::PriorYearTax.as_str());
        }
        if facts.prior_year_agi.is_none() {
            diagnostics.missing(Fact::PriorYearAgi.as_str());
        }
        // Without prior-year AGI the high-income multiplier cannot apply, so
        // the safe harbor falls back to 100% of prior-year tax.
        let safe_harbor = facts.prior_year_tax.map(|tax| {
            compute_safe_harbor(
                tax,
                facts.prior_year_agi.unwrap_or(Decimal::ZERO),
                input.filing_status,
                &self.constants.safe_harbor,
            )
        });

        let (non_refundable, niit_tax) = contractor
            .premium
            .as_ref()
            .map_or((Decimal::ZERO, Decimal::ZERO), |p| {
                (p.child_credits.non_refundable, p.niit.tax)
            });
        let withholding = facts.amount(Fact::Withholding);
        let worksheet_input = EstimatedPaymentInput {
            tax_before_credits: contractor.federal.tax,
            credits: non_refundable,
            self_employment_tax: contractor.payroll.total(),
            other_taxes: niit_tax,
            refundable_credits: contractor.refundable_credits,
            prior_year_safe_harbor: safe_harbor.as_ref().map(|s| s.annual_required),
            withholding,
            is_farmer_or_fisher: input.farmer_or_fisher,
        };
        let estimated_payments =
            EstimatedPaymentWorksheet::new(&self.constants.estimated_payments).calculate(&worksheet_input);

        let payments = match (input.estimated_payments_by_quarter, facts.estimated_payments_ytd) {
            (Some(quarters), _) => Some(EstimatedPayments::ByQuarter(quarters)),
            (None, Some(ytd)) => Some(EstimatedPayments::YearToDate(ytd)),
            (None, None) if facts.withholding.is_some() => Some(EstimatedPayments::None),
            (None, None) => None,
        };
        let penalty_risk = match payments {
            Some(payments) => Some(compute_penalty_risk(&PenaltyRiskInput {
                tax_year: input.tax_year,
                required_annual_payment: estimated_payments.required_annual_payment,
                withholding,
                payments,
                as_of: input.as_of,
            })?),
            None => None,
        };

        Ok(Outcome::new(
            PlanningResult {
                safe_harbor,
                estimated_payments,
                penalty_risk,
            },
            diagnostics,
        ))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::test_support::{california_2024, constants_2024, init_test_tracing, texas_2024};

    fn texas(
        w2: Decimal,
        income_1099: Decimal,
    ) -> ScenarioInput {
        ScenarioInput::new(
            2024,
            FilingStatus::Single,
            StateCode::parse("TX").unwrap(),
            w2,
            income_1099,
        )
    }

    fn compare(
        input: &ScenarioInput,
        ruleset: &StateRuleSet,
    ) -> ScenarioResult {
        let constants = constants_2024();
        Scenario::new(input, &constants, ruleset).compare().unwrap()
    }

    // =========================================================================
    // Baseline paths
    // =========================================================================

    #[test]
    fn w2_path_in_untaxed_state() {
        let _guard = init_test_tracing();
        let result = compare(&texas(dec!(64600), dec!(64600)), &texas_2024());

        // 6,053 federal + 4,941.90 FICA
        assert_eq!(result.w2.federal_tax, dec!(6053.00));
        assert_eq!(result.w2.payroll.total(), dec!(4941.90));
        assert_eq!(result.w2.state.tax, dec!(0));
        assert_eq!(result.w2.net_income, dec!(53605.10));
    }

    #[test]
    fn contractor_path_deducts_half_se_tax() {
        let result = compare(&texas(dec!(100000), dec!(100000)), &texas_2024());

        let PayrollTax::SelfEmployment(se) = &result.contractor.payroll else {
            panic!("contractor path must carry SE tax");
        };
        assert_eq!(se.total, dec!(14129.55));
        assert_eq!(result.contractor.agi, dec!(92935.22));
        assert_eq!(result.contractor.qbi, None);
    }

    #[test]
    fn contractor_path_subtracts_expenses() {
        let mut input = texas(dec!(100000), dec!(120000));
        input.business_expenses = dec!(20000);

        let result = compare(&input, &texas_2024());

        assert_eq!(result.contractor.gross_income, dec!(120000));
        assert_eq!(result.contractor.agi, dec!(92935.22));
    }

    #[test]
    fn expenses_above_income_leave_zero_profit() {
        let mut input = texas(dec!(50000), dec!(10000));
        input.business_expenses = dec!(15000);

        let result = compare(&input, &texas_2024());

        assert_eq!(result.contractor.agi, dec!(0));
        assert_eq!(result.contractor.payroll.total(), dec!(0));
        assert_eq!(result.contractor.net_income, dec!(0));
    }

    #[test]
    fn difference_is_contractor_minus_w2() {
        let result = compare(&texas(dec!(100000), dec!(100000)), &texas_2024());

        assert_eq!(
            result.annual_difference,
            result.contractor.net_income - result.w2.net_income
        );
        assert!(result.annual_difference < dec!(0));
        assert_eq!(
            result.monthly_difference,
            round_half_up(result.annual_difference / dec!(12))
        );
    }

    #[test]
    fn negative_input_is_rejected() {
        let constants = constants_2024();
        let ruleset = texas_2024();
        let input = texas(dec!(-1), dec!(100000));

        let result = Scenario::new(&input, &constants, &ruleset).compare();

        assert!(matches!(
            result,
            Err(EngineError::NegativeInput {
                field: "w2_salary",
                ..
            })
        ));
    }

    // =========================================================================
    // Break-even
    // =========================================================================

    #[test]
    fn break_even_matches_w2_net_income() {
        let result = compare(&texas(dec!(85000), dec!(85000)), &texas_2024());

        assert!(result.break_even.converged);
        assert!((result.break_even.net_income - result.w2.net_income).abs() < dec!(1));
        assert!(result.break_even.income_1099 > dec!(85000));
    }

    #[test]
    fn break_even_in_california() {
        let input = ScenarioInput::new(
            2024,
            FilingStatus::MarriedFilingJointly,
            StateCode::parse("CA").unwrap(),
            dec!(150000),
            dec!(150000),
        );

        let result = compare(&input, &california_2024());

        assert!(result.break_even.converged);
        assert!((result.break_even.net_income - result.w2.net_income).abs() < dec!(1));
    }

    #[test]
    fn zero_salary_breaks_even_at_zero() {
        let result = compare(&texas(dec!(0), dec!(0)), &texas_2024());

        assert!(result.break_even.converged);
        assert_eq!(result.break_even.income_1099, dec!(0));
    }

    // =========================================================================
    // Premium
    // =========================================================================

    #[test]
    fn premium_flag_enables_qbi_and_planning() {
        let mut input = texas(dec!(100000), dec!(100000));
        input.premium = true;
        input.facts.prior_year_tax = Some(dec!(20000));
        input.facts.prior_year_agi = Some(dec!(160000));

        let result = compare(&input, &texas_2024());

        let qbi = result.contractor.qbi.clone().unwrap();
        // min(20% × 92,935.22, 20% × (92,935.22 − 14,600))
        assert_eq!(qbi.deduction, dec!(15667.04));
        let planning = result.planning.unwrap();
        assert_eq!(
            planning.safe_harbor.map(|s| s.annual_required),
            Some(dec!(22000.00))
        );
        assert_eq!(planning.penalty_risk, None);
        assert!(result.w2.premium.is_some());
    }

    #[test]
    fn premium_off_skips_everything_optional() {
        let mut input = texas(dec!(100000), dec!(100000));
        input.facts.qualifying_children = Some(2);

        let result = compare(&input, &texas_2024());

        assert_eq!(result.w2.premium, None);
        assert_eq!(result.w2.refundable_credits, dec!(0));
        assert_eq!(result.planning, None);
    }

    #[test]
    fn premium_child_credits_reduce_federal_tax() {
        let mut base = texas(dec!(100000), dec!(100000));
        base.premium = true;
        let mut with_children = base.clone();
        with_children.facts.qualifying_children = Some(2);

        let without = compare(&base, &texas_2024());
        let with = compare(&with_children, &texas_2024());

        assert_eq!(without.w2.federal_tax - with.w2.federal_tax, dec!(4000));
    }

    #[test]
    fn planning_reports_missing_prior_year() {
        let mut input = texas(dec!(100000), dec!(100000));
        input.premium = true;

        let result = compare(&input, &texas_2024());

        assert!(
            result
                .diagnostics
                .missing_inputs
                .contains(&"priorYearTax".to_string())
        );
        let planning = result.planning.unwrap();
        assert_eq!(planning.safe_harbor, None);
        assert!(planning.estimated_payments.estimated_payments_required);
    }

    #[test]
    fn planning_tracks_quarterly_payments() {
        let mut input = texas(dec!(100000), dec!(100000));
        input.premium = true;
        input.estimated_payments_by_quarter = Some([dec!(0); 4]);

        let result = compare(&input, &texas_2024());

        let risk = result.planning.unwrap().penalty_risk.unwrap();
        assert!(!risk.protected);
        assert_eq!(risk.quarters.len(), 4);
    }

    #[test]
    fn planning_without_prior_agi_uses_full_prior_tax() {
        let mut input = texas(dec!(100000), dec!(250000));
        input.premium = true;
        input.facts.prior_year_tax = Some(dec!(20000));

        let result = compare(&input, &texas_2024());

        assert!(
            result
                .diagnostics
                .missing_inputs
                .contains(&"priorYearAgi".to_string())
        );
        assert!(
            !result
                .diagnostics
                .missing_inputs
                .contains(&"priorYearTax".to_string())
        );
        let planning = result.planning.unwrap();
        assert_eq!(
            planning.safe_harbor,
            Some(SafeHarborResult {
                multiplier: dec!(1),
                annual_required: dec!(20000.00),
                quarterly_required: dec!(5000.00),
            })
        );
        // 90% of this year's tax is far above 20,000
        assert_eq!(planning.estimated_payments.required_annual_payment, dec!(20000.00));
    }

    // =========================================================================
    // Reported amounts
    // =========================================================================

    fn assert_path_non_negative(path: &PathResult) -> Result<(), TestCaseError> {
        let mut amounts = vec![
            ("gross_income", path.gross_income),
            ("business_expenses", path.business_expenses),
            ("agi", path.agi),
            ("federal.taxable_income", path.federal.taxable_income),
            ("federal.deduction", path.federal.deduction),
            ("federal.qbi_deduction", path.federal.qbi_deduction),
            ("federal.tax", path.federal.tax),
            ("federal_tax", path.federal_tax),
            ("payroll", path.payroll.total()),
            ("state.agi", path.state.state_agi()),
            ("state.taxable_income", path.state.taxable_income()),
            ("state.tax_before_credits", path.state.tax_before_credits),
            ("state.rule_credits", path.state.rule_credits),
            ("state.tax", path.state.tax),
            ("refundable_credits", path.refundable_credits),
            ("total_tax", path.total_tax),
            ("net_income", path.net_income),
            ("effective_rate", path.effective_rate),
        ];
        if let PayrollTax::SelfEmployment(se) = &path.payroll {
            amounts.push(("se.deductible_half", se.deductible_half));
        }
        if let Some(qbi) = &path.qbi {
            amounts.push(("qbi.deduction", qbi.deduction));
        }
        if let Some(credits) = &path.state.premium_credits {
            amounts.push(("state.premium_credits", credits.total()));
        }
        if let Some(premium) = &path.premium {
            amounts.extend([
                ("niit.tax", premium.niit.tax),
                ("child.non_refundable", premium.child_credits.non_refundable),
                ("child.refundable", premium.child_credits.refundable),
                ("child.phaseout", premium.child_credits.phaseout_reduction),
                ("eitc.credit", premium.eitc.credit),
            ]);
        }

        for (label, amount) in amounts {
            prop_assert!(amount >= Decimal::ZERO, "{label} = {amount}");
        }
        Ok(())
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn every_reported_amount_is_non_negative(
            w2 in 0i64..40_000_000,
            income_1099 in 0i64..40_000_000,
            expenses in 0i64..10_000_000,
            joint in any::<bool>(),
            in_california in any::<bool>(),
            children in proptest::option::of(0u32..4),
            investment_income in proptest::option::of(0i64..30_000_000),
            hsa in proptest::option::of(0i64..800_000),
        ) {
            let status = if joint {
                FilingStatus::MarriedFilingJointly
            } else {
                FilingStatus::Single
            };
            let (code, ruleset) = if in_california {
                ("CA", california_2024())
            } else {
                ("TX", texas_2024())
            };
            let mut input = ScenarioInput::new(
                2024,
                status,
                StateCode::parse(code).unwrap(),
                Decimal::new(w2, 2),
                Decimal::new(income_1099, 2),
            );
            input.business_expenses = Decimal::new(expenses, 2);
            input.premium = true;
            input.facts.qualifying_children = children;
            input.facts.children_under_six = children.map(|n| n.min(1));
            input.facts.net_investment_income = investment_income.map(|v| Decimal::new(v, 2));
            input.facts.hsa_contributions = hsa.map(|v| Decimal::new(v, 2));

            let result = compare(&input, &ruleset);

            assert_path_non_negative(&result.w2)?;
            assert_path_non_negative(&result.contractor)?;
            prop_assert!(result.break_even.income_1099 >= Decimal::ZERO);
            prop_assert!(result.break_even.net_income >= Decimal::ZERO);
            let planning = result.planning.unwrap();
            let estimates = &planning.estimated_payments;
            prop_assert!(estimates.required_annual_payment >= Decimal::ZERO);
            prop_assert!(estimates.quarterly_installment >= Decimal::ZERO);
        }
    }
}
