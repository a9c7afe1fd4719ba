//! The engine facade.
//!
//! [`TaxEngine`] borrows a loaded [`TaxRulesRepository`], resolves the
//! constants and ruleset each operation needs, and hands them to the pure
//! calculators in [`calculations`](crate::calculations). It holds no other
//! state, so one engine can serve any number of threads.
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! use tax_core::engine::TaxEngine;
//! use tax_core::repository::InMemoryRepository;
//!
//! let repository = InMemoryRepository::new();
//! let engine = TaxEngine::new(&repository);
//!
//! // Nothing loaded: every lookup fails with a repository error.
//! assert!(engine.compute_federal_tax(
//!     2024,
//!     tax_core::FilingStatus::Single,
//!     dec!(64600),
//!     dec!(0),
//!     None,
//! ).is_err());
//! ```

use rust_decimal::Decimal;
use tracing::debug;

use crate::calculations::diagnostics::Outcome;
use crate::calculations::federal::{self, FederalTaxResult};
use crate::calculations::premium::{
    self, ChildCreditInput, ChildCreditResult, EitcInput, EitcResult, NiitResult,
    PenaltyRiskInput, PenaltyRiskResult, QbiInput, QbiResult, SafeHarborResult,
};
use crate::calculations::self_emp::{SeTaxCalculator, SeTaxConfig, SeTaxResult};
use crate::calculations::state_tax::{self, StateTaxInput, StateTaxResult};
use crate::error::EngineError;
use crate::models::{FilingStatus, ScenarioInput, StateCode};
use crate::repository::TaxRulesRepository;
use crate::scenario::{Scenario, ScenarioResult};

pub struct TaxEngine<'a, R: TaxRulesRepository + ?Sized> {
    repository: &'a R,
}

impl<'a, R: TaxRulesRepository + ?Sized> TaxEngine<'a, R> {
    pub fn new(repository: &'a R) -> Self {
        Self { repository }
    }

    pub fn repository(&self) -> &'a R {
        self.repository
    }

    /// Regular federal income tax on `agi` after the larger of the standard
    /// and itemized deductions and any QBI deduction.
    pub fn compute_federal_tax(
        &self,
        tax_year: i32,
        filing_status: FilingStatus,
        agi: Decimal,
        qbi_deduction: Decimal,
        itemized: Option<Decimal>,
    ) -> Result<FederalTaxResult, EngineError> {
        let constants = self.repository.tax_year_constants(tax_year)?;
        Ok(federal::compute_federal_tax(
            agi,
            filing_status,
            qbi_deduction,
            itemized,
            &constants,
        )?)
    }

    /// State tax for `state`. When `input` asks for premium credits and does
    /// not bring its own table, the year's table for the state is used.
    pub fn compute_state_tax(
        &self,
        tax_year: i32,
        state: &StateCode,
        input: &StateTaxInput<'_>,
    ) -> Result<Outcome<StateTaxResult>, EngineError> {
        let ruleset = self.repository.state_ruleset(tax_year, state)?;
        if input.premium_credits.is_none() || input.credit_constants.is_some() {
            return state_tax::compute_state_tax(input, &ruleset);
        }

        let constants = self.repository.tax_year_constants(tax_year)?;
        let input = StateTaxInput {
            credit_constants: constants.state_credits.get(state.as_str()),
            ..input.clone()
        };
        state_tax::compute_state_tax(&input, &ruleset)
    }

    pub fn compute_self_employment_tax(
        &self,
        tax_year: i32,
        filing_status: FilingStatus,
        net_profit: Decimal,
        w2_wages: Decimal,
    ) -> Result<SeTaxResult, EngineError> {
        let constants = self.repository.tax_year_constants(tax_year)?;
        let config = SeTaxConfig::from_payroll(&constants.payroll, filing_status)?;
        Ok(SeTaxCalculator::new(config).calculate(net_profit, w2_wages)?)
    }

    pub fn compute_qbi_deduction(
        &self,
        tax_year: i32,
        input: &QbiInput,
    ) -> Result<Outcome<QbiResult>, EngineError> {
        let constants = self.repository.tax_year_constants(tax_year)?;
        Ok(premium::compute_qbi_deduction(input, constants.qbi.as_ref()))
    }

    pub fn compute_niit(
        &self,
        tax_year: i32,
        filing_status: FilingStatus,
        net_investment_income: Decimal,
        magi: Decimal,
    ) -> Result<Outcome<NiitResult>, EngineError> {
        let constants = self.repository.tax_year_constants(tax_year)?;
        Ok(premium::compute_niit(
            net_investment_income,
            magi,
            filing_status,
            constants.niit.as_ref(),
        ))
    }

    pub fn compute_child_credits(
        &self,
        tax_year: i32,
        input: &ChildCreditInput,
    ) -> Result<Outcome<ChildCreditResult>, EngineError> {
        let constants = self.repository.tax_year_constants(tax_year)?;
        Ok(premium::compute_child_credits(
            input,
            constants.child_credits.as_ref(),
        ))
    }

    pub fn compute_eitc(
        &self,
        tax_year: i32,
        input: &EitcInput,
    ) -> Result<Outcome<EitcResult>, EngineError> {
        let constants = self.repository.tax_year_constants(tax_year)?;
        Ok(premium::compute_eitc(input, constants.eitc.as_ref()))
    }

    /// Prior-year safe harbor for estimated payments due in `tax_year`.
    pub fn compute_safe_harbor_requirement(
        &self,
        tax_year: i32,
        filing_status: FilingStatus,
        prior_year_tax: Decimal,
        prior_year_agi: Decimal,
    ) -> Result<SafeHarborResult, EngineError> {
        let constants = self.repository.tax_year_constants(tax_year)?;
        Ok(premium::compute_safe_harbor(
            prior_year_tax,
            prior_year_agi,
            filing_status,
            &constants.safe_harbor,
        ))
    }

    pub fn compute_quarterly_penalty_risk(
        &self,
        input: &PenaltyRiskInput,
    ) -> Result<PenaltyRiskResult, EngineError> {
        self.repository.tax_year_constants(input.tax_year)?;
        premium::compute_penalty_risk(input)
    }

    /// Full W-2 vs 1099 comparison.
    ///
    /// # Errors
    ///
    /// Unknown year or state, negative inputs, and configuration the
    /// calculators cannot use. Everything else is reported in the result's
    /// warnings and missing inputs.
    pub fn compare_scenarios(
        &self,
        input: &ScenarioInput,
    ) -> Result<ScenarioResult, EngineError> {
        input.validate()?;
        let constants = self.repository.tax_year_constants(input.tax_year)?;
        let ruleset = self.repository.state_ruleset(input.tax_year, &input.state)?;
        debug!(
            tax_year = input.tax_year,
            state = %input.state,
            filing_status = %input.filing_status,
            premium = input.premium,
            "Comparing scenarios"
        );

        Scenario::new(input, &constants, &ruleset).compare()
    }
}
