//! Premium adjustments layered on top of the baseline comparison.
//!
//! Each calculator is a pure function over plain inputs and an optional
//! constants block. A missing block yields zero and a
//! [`Warning::MissingConstants`](crate::calculations::diagnostics::Warning),
//! never an error.

pub mod child_credits;
pub mod eitc;
pub mod itemized;
pub mod niit;
pub mod penalty_risk;
pub mod qbi;
pub mod safe_harbor;
pub mod state_credits;

pub use child_credits::{ChildCreditInput, ChildCreditResult, compute_child_credits};
pub use eitc::{EitcInput, EitcResult, compute_eitc};
pub use itemized::{ItemizedResult, compute_itemized};
pub use niit::{NiitResult, compute_niit};
pub use penalty_risk::{
    EstimatedPayments, PenaltyRiskInput, PenaltyRiskResult, QuarterStatus, compute_penalty_risk,
    due_dates,
};
pub use qbi::{QbiInput, QbiPhase, QbiResult, compute_qbi_deduction};
pub use safe_harbor::{SafeHarborResult, compute_safe_harbor};
pub use state_credits::{StateCreditInput, StateCreditResult, compute_state_credits};
