//! Read-only access to loaded tax-year constants and state rulesets.
//!
//! The engine never loads anything itself. A loader builds an
//! [`InMemoryRepository`] once at startup and the engine borrows it through
//! the [`TaxRulesRepository`] trait, so tests can inject alternate rulesets
//! without touching the filesystem.

use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;

use crate::error::ConfigError;
use crate::models::{StateCode, StateRuleSet, TaxYearConstants};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("no tax-year constants loaded for {0}")]
    UnknownTaxYear(i32),

    #[error("no ruleset loaded for {state} in {year}")]
    UnknownState { year: i32, state: StateCode },

    #[error("invalid configuration: {0}")]
    Invalid(#[from] ConfigError),
}

/// Source of immutable per-year and per-state configuration.
///
/// Implementations hand out shared references; nothing returned here is ever
/// mutated after loading.
pub trait TaxRulesRepository: Send + Sync {
    fn tax_year_constants(
        &self,
        year: i32,
    ) -> Result<Arc<TaxYearConstants>, RepositoryError>;

    fn state_ruleset(
        &self,
        year: i32,
        state: &StateCode,
    ) -> Result<Arc<StateRuleSet>, RepositoryError>;

    /// Loaded tax years, ascending.
    fn list_tax_years(&self) -> Vec<i32>;

    /// States with a ruleset for `year`, sorted by code.
    fn list_states(
        &self,
        year: i32,
    ) -> Vec<StateCode>;
}

/// Populate-once, read-many repository.
///
/// Built by inserting validated constants and rulesets; once handed to an
/// engine it is only ever read, so it can be shared across threads freely.
#[derive(Debug, Default)]
pub struct InMemoryRepository {
    constants: HashMap<i32, Arc<TaxYearConstants>>,
    rulesets: HashMap<(i32, StateCode), Arc<StateRuleSet>>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds constants for one year, replacing any previous entry.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::Invalid`] when the constants fail
    /// [`TaxYearConstants::validate`].
    pub fn insert_constants(
        &mut self,
        constants: TaxYearConstants,
    ) -> Result<(), RepositoryError> {
        constants.validate()?;
        self.constants
            .insert(constants.tax_year, Arc::new(constants));
        Ok(())
    }

    /// Adds a state ruleset, replacing any previous entry for the same
    /// year and state.
    ///
    /// `allow_unsupported` is forwarded to [`StateRuleSet::validate`].
    pub fn insert_ruleset(
        &mut self,
        ruleset: StateRuleSet,
        allow_unsupported: bool,
    ) -> Result<(), RepositoryError> {
        ruleset.validate(allow_unsupported)?;
        self.rulesets
            .insert((ruleset.tax_year, ruleset.state.clone()), Arc::new(ruleset));
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.constants.is_empty() && self.rulesets.is_empty()
    }
}

impl TaxRulesRepository for InMemoryRepository {
    fn tax_year_constants(
        &self,
        year: i32,
    ) -> Result<Arc<TaxYearConstants>, RepositoryError> {
        self.constants
            .get(&year)
            .cloned()
            .ok_or(RepositoryError::UnknownTaxYear(year))
    }

    fn state_ruleset(
        &self,
        year: i32,
        state: &StateCode,
    ) -> Result<Arc<StateRuleSet>, RepositoryError> {
        self.rulesets
            .get(&(year, state.clone()))
            .cloned()
            .ok_or_else(|| RepositoryError::UnknownState {
                year,
                state: state.clone(),
            })
    }

    fn list_tax_years(&self) -> Vec<i32> {
        let mut years: Vec<_> = self.constants.keys().copied().collect();
        years.sort_unstable();
        years
    }

    fn list_states(
        &self,
        year: i32,
    ) -> Vec<StateCode> {
        let mut states: Vec<_> = self
            .rulesets
            .keys()
            .filter(|(y, _)| *y == year)
            .map(|(_, state)| state.clone())
            .collect();
        states.sort_unstable();
        states
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::models::{Rule, RuleKind, RuleTarget};
    use crate::test_support::constants_2024;

    fn state(code: &str) -> StateCode {
        StateCode::parse(code).unwrap()
    }

    #[test]
    fn tax_year_constants_returns_inserted_year() {
        let mut repo = InMemoryRepository::new();
        repo.insert_constants(constants_2024()).unwrap();

        let constants = repo.tax_year_constants(2024).unwrap();

        assert_eq!(constants.tax_year, 2024);
    }

    #[test]
    fn tax_year_constants_reports_unknown_year() {
        let repo = InMemoryRepository::new();

        assert_eq!(
            repo.tax_year_constants(1999).unwrap_err(),
            RepositoryError::UnknownTaxYear(1999)
        );
    }

    #[test]
    fn insert_constants_rejects_incomplete_tables() {
        let mut constants = constants_2024();
        constants.federal.standard_deduction.head_of_household = None;
        let mut repo = InMemoryRepository::new();

        assert!(matches!(
            repo.insert_constants(constants),
            Err(RepositoryError::Invalid(
                ConfigError::MissingFilingStatusValue { .. }
            ))
        ));
        assert!(repo.is_empty());
    }

    #[test]
    fn state_ruleset_is_keyed_by_year_and_state() {
        let mut repo = InMemoryRepository::new();
        repo.insert_ruleset(StateRuleSet::untaxed(2024, state("TX")), false)
            .unwrap();

        assert!(repo.state_ruleset(2024, &state("TX")).is_ok());
        assert_eq!(
            repo.state_ruleset(2025, &state("TX")).unwrap_err(),
            RepositoryError::UnknownState {
                year: 2025,
                state: state("TX"),
            }
        );
    }

    #[test]
    fn insert_ruleset_rejects_invalid_rules() {
        let mut ruleset = StateRuleSet::untaxed(2024, state("CA"));
        ruleset
            .credits
            .push(Rule::new("renter", RuleKind::Deduction, RuleTarget::StateTax));
        let mut repo = InMemoryRepository::new();

        assert!(matches!(
            repo.insert_ruleset(ruleset, true),
            Err(RepositoryError::Invalid(ConfigError::RuleKindMismatch { .. }))
        ));
    }

    #[test]
    fn list_methods_are_sorted() {
        let mut repo = InMemoryRepository::new();
        repo.insert_constants(constants_2024()).unwrap();
        for code in ["TX", "CA", "IL"] {
            repo.insert_ruleset(StateRuleSet::untaxed(2024, state(code)), false)
                .unwrap();
        }

        assert_eq!(repo.list_tax_years(), vec![2024]);
        assert_eq!(
            repo.list_states(2024),
            vec![state("CA"), state("IL"), state("TX")]
        );
        assert!(repo.list_states(2023).is_empty());
    }

    #[test]
    fn repository_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<InMemoryRepository>();
    }
}
