//! Qualified business income deduction (Section 199A).
//!
//! | Taxable income before QBI | Non-SSTB | SSTB |
//! |---------------------------|----------|------|
//! | at or below threshold | `min(tentative, taxable limit)` | same |
//! | inside the phase-out range | tentative reduced toward the wage/UBIA limit by `ratio` | amounts scaled by `1 − ratio`, then as non-SSTB |
//! | above threshold + range | `min(tentative, wage/UBIA limit, taxable limit)` | 0 |
//!
//! `tentative = rate × qbi_base`, `taxable limit = rate × (taxable income −
//! net capital gains)`, `wage/UBIA limit = max(50% × W-2 wages, 25% × W-2
//! wages + 2.5% × UBIA)`, `ratio = (taxable income − threshold) / range`.
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! use tax_core::calculations::premium::qbi::{QbiInput, compute_qbi_deduction};
//! use tax_core::models::{FilingStatus, FilingStatusTable, QbiConstants};
//!
//! let constants = QbiConstants {
//!     rate: dec!(0.20),
//!     threshold: FilingStatusTable::uniform(dec!(191950)),
//!     phaseout_range: FilingStatusTable::uniform(dec!(50000)),
//! };
//! let input = QbiInput {
//!     qbi_base: dec!(50000),
//!     taxable_before_qbi: dec!(80000),
//!     ..QbiInput::new(FilingStatus::Single)
//! };
//!
//! let outcome = compute_qbi_deduction(&input, Some(&constants));
//!
//! assert_eq!(outcome.value.deduction, dec!(10000.00));
//! ```

use rust_decimal::Decimal;
use serde::Serialize;
use tracing::debug;

use crate::calculations::common::{non_negative, round_half_up};
use crate::calculations::diagnostics::{Diagnostics, Outcome, Warning};
use crate::models::{FilingStatus, QbiConstants};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QbiInput {
    pub filing_status: FilingStatus,
    pub qbi_base: Decimal,
    pub taxable_before_qbi: Decimal,
    pub net_capital_gains: Decimal,
    pub w2_wages: Decimal,
    pub ubia: Decimal,
    pub is_sstb: bool,
}

impl QbiInput {
    pub fn new(filing_status: FilingStatus) -> Self {
        Self {
            filing_status,
            qbi_base: Decimal::ZERO,
            taxable_before_qbi: Decimal::ZERO,
            net_capital_gains: Decimal::ZERO,
            w2_wages: Decimal::ZERO,
            ubia: Decimal::ZERO,
            is_sstb: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QbiPhase {
    BelowThreshold,
    PhaseIn,
    AboveRange,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QbiResult {
    pub deduction: Decimal,
    pub tentative: Decimal,
    pub taxable_limit: Decimal,
    pub wage_limit: Decimal,
    pub phase: QbiPhase,
}

impl QbiResult {
    fn zero() -> Self {
        Self {
            deduction: Decimal::ZERO,
            tentative: Decimal::ZERO,
            taxable_limit: Decimal::ZERO,
            wage_limit: Decimal::ZERO,
            phase: QbiPhase::BelowThreshold,
        }
    }
}

fn wage_limit(
    w2_wages: Decimal,
    ubia: Decimal,
) -> Decimal {
    let half_wages = w2_wages * Decimal::new(50, 2);
    let wages_and_property = w2_wages * Decimal::new(25, 2) + ubia * Decimal::new(25, 3);
    half_wages.max(wages_and_property)
}

pub fn compute_qbi_deduction(
    input: &QbiInput,
    constants: Option<&QbiConstants>,
) -> Outcome<QbiResult> {
    let mut diagnostics = Diagnostics::new();
    let Some(constants) = constants else {
        diagnostics.warn(Warning::MissingConstants {
            block: "qbi".to_string(),
        });
        return Outcome::new(QbiResult::zero(), diagnostics);
    };
    let Some(threshold) = constants.threshold.get(input.filing_status).copied() else {
        diagnostics.warn(Warning::MissingConstants {
            block: format!("qbi threshold for {}", input.filing_status),
        });
        return Outcome::new(QbiResult::zero(), diagnostics);
    };
    let range = constants
        .phaseout_range
        .get(input.filing_status)
        .copied()
        .unwrap_or(Decimal::ZERO);

    let rate = constants.rate;
    let qbi_base = non_negative(input.qbi_base);
    let w2_wages = non_negative(input.w2_wages);
    let ubia = non_negative(input.ubia);
    let taxable = non_negative(input.taxable_before_qbi);

    let tentative = qbi_base * rate;
    let taxable_limit = rate * non_negative(taxable - non_negative(input.net_capital_gains));
    let full_wage_limit = wage_limit(w2_wages, ubia);

    let (phase, amount) = if taxable <= threshold || range <= Decimal::ZERO {
        (QbiPhase::BelowThreshold, tentative)
    } else if taxable >= threshold + range {
        let amount = if input.is_sstb {
            Decimal::ZERO
        } else {
            tentative.min(full_wage_limit)
        };
        (QbiPhase::AboveRange, amount)
    } else {
        let ratio = (taxable - threshold) / range;
        let (tentative, limit) = if input.is_sstb {
            let applicable = Decimal::ONE - ratio;
            (
                qbi_base * applicable * rate,
                wage_limit(w2_wages * applicable, ubia * applicable),
            )
        } else {
            (tentative, full_wage_limit)
        };
        let reduction = ratio * non_negative(tentative - limit);
        (QbiPhase::PhaseIn, tentative - reduction)
    };

    let deduction = round_half_up(non_negative(amount.min(taxable_limit)));
    debug!(
        phase = ?phase,
        tentative = %tentative,
        taxable_limit = %taxable_limit,
        deduction = %deduction,
        "QBI deduction computed"
    );

    Outcome::new(
        QbiResult {
            deduction,
            tentative: round_half_up(tentative),
            taxable_limit: round_half_up(taxable_limit),
            wage_limit: round_half_up(full_wage_limit),
            phase,
        },
        diagnostics,
    )
}
