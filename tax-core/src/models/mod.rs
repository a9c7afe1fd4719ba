mod expr;
mod facts;
mod filing_status;
mod scenario;
mod state_code;
mod state_ruleset;
mod tax_bracket;
mod tax_year_constants;

pub use expr::{CaseBranch, CompareOp, Expr, FactPath, Value};
pub use facts::{Fact, FactError, ScenarioFacts};
pub use filing_status::{FilingStatus, FilingStatusTable};
pub use scenario::ScenarioInput;
pub use state_code::StateCode;
pub use state_ruleset::{
    DeductionAmount, Rule, RuleKind, RuleStatus, RuleTarget, StartingPoint, StateIncomeTax,
    StateRuleSet,
};
pub use tax_bracket::{TaxBracket, TaxSchedule, validate_brackets};
pub use tax_year_constants::{
    ChildCreditConstants, EitcConstants, EitcParams, EstimatedPaymentConstants,
    FederalConstants, ItemizedCaps, NiitConstants, PayrollConstants, QbiConstants,
    SafeHarborConstants, StateCreditConstants, StateEarnedIncomeCredit, TaxYearConstants,
    YoungChildCredit,
};
