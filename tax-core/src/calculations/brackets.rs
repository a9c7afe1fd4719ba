//! Flat and progressive tax from a taxable base.
//!
//! Shared by the federal and state computations. A progressive table is an
//! ordered list of [`TaxBracket`]s with ascending `up_to` bounds and an
//! unbounded last entry; each bracket taxes the slice of the base between the
//! previous bound and its own.
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! use tax_core::calculations::brackets::compute_tax;
//! use tax_core::models::{TaxBracket, TaxSchedule};
//!
//! let schedule = TaxSchedule::Progressive {
//!     brackets: vec![
//!         TaxBracket::new(Some(dec!(11600)), dec!(0.10)),
//!         TaxBracket::new(Some(dec!(47150)), dec!(0.12)),
//!         TaxBracket::new(None, dec!(0.22)),
//!     ],
//! };
//!
//! let result = compute_tax(dec!(50000), &schedule, "federal").unwrap();
//!
//! // 1160 + 4266 + 627
//! assert_eq!(result.tax, dec!(6053.00));
//! assert_eq!(result.breakdown.len(), 3);
//! ```

use rust_decimal::Decimal;
use serde::Serialize;
use tracing::warn;

use super::common::{non_negative, round_half_up};
use crate::error::ConfigError;
use crate::models::{TaxBracket, TaxSchedule};

/// One taxed slice of the base.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BracketSlice {
    pub from: Decimal,
    /// `None` for the unbounded top bracket.
    pub up_to: Option<Decimal>,
    pub rate: Decimal,
    pub taxed_amount: Decimal,
    pub tax: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BracketTax {
    pub taxable_base: Decimal,
    pub tax: Decimal,
    /// `tax / taxable_base`, or zero for a zero base.
    pub effective_rate: Decimal,
    pub breakdown: Vec<BracketSlice>,
}

impl BracketTax {
    fn zero(taxable_base: Decimal) -> Self {
        Self {
            taxable_base,
            tax: Decimal::ZERO,
            effective_rate: Decimal::ZERO,
            breakdown: Vec::new(),
        }
    }

    /// Rate applied to the last dollar of the base.
    pub fn marginal_rate(&self) -> Decimal {
        self.breakdown
            .last()
            .map_or(Decimal::ZERO, |slice| slice.rate)
    }
}

/// Computes tax on `taxable_base` under `schedule`.
///
/// Negative bases are treated as zero. `jurisdiction` only labels the error.
///
/// # Errors
///
/// Returns [`ConfigError::EmptyBrackets`] for a progressive schedule with no
/// brackets: a jurisdiction that taxes income but has no table must not
/// silently produce zero.
pub fn compute_tax(
    taxable_base: Decimal,
    schedule: &TaxSchedule,
    jurisdiction: &str,
) -> Result<BracketTax, ConfigError> {
    if taxable_base < Decimal::ZERO {
        warn!(
            jurisdiction,
            taxable_base = %taxable_base,
            "Negative taxable base clamped to zero"
        );
    }
    let base = non_negative(taxable_base);

    match schedule {
        TaxSchedule::None => Ok(BracketTax::zero(base)),
        TaxSchedule::Flat { rate } => {
            if base.is_zero() {
                return Ok(BracketTax::zero(base));
            }
            let tax = base * rate;
            Ok(finish(
                base,
                tax,
                vec![BracketSlice {
                    from: Decimal::ZERO,
                    up_to: None,
                    rate: *rate,
                    taxed_amount: base,
                    tax: round_half_up(tax),
                }],
            ))
        }
        TaxSchedule::Progressive { brackets } => {
            if brackets.is_empty() {
                return Err(ConfigError::EmptyBrackets {
                    jurisdiction: jurisdiction.to_string(),
                });
            }
            let (tax, breakdown) = walk_brackets(base, brackets);
            Ok(finish(base, tax, breakdown))
        }
    }
}

fn walk_brackets(
    base: Decimal,
    brackets: &[TaxBracket],
) -> (Decimal, Vec<BracketSlice>) {
    let mut tax = Decimal::ZERO;
    let mut breakdown = Vec::new();
    let mut prev_cap = Decimal::ZERO;

    for bracket in brackets {
        let ceiling = bracket.up_to.map_or(base, |up_to| base.min(up_to));
        let slice = non_negative(ceiling - prev_cap);
        if slice > Decimal::ZERO {
            let slice_tax = slice * bracket.rate;
            tax += slice_tax;
            breakdown.push(BracketSlice {
                from: prev_cap,
                up_to: bracket.up_to,
                rate: bracket.rate,
                taxed_amount: slice,
                tax: round_half_up(slice_tax),
            });
        }

        match bracket.up_to {
            Some(up_to) if base > up_to => prev_cap = up_to,
            _ => break,
        }
    }

    (tax, breakdown)
}

fn finish(
    base: Decimal,
    tax: Decimal,
    breakdown: Vec<BracketSlice>,
) -> BracketTax {
    let tax = round_half_up(tax);
    let effective_rate = if base > Decimal::ZERO {
        (tax / base).round_dp(6)
    } else {
        Decimal::ZERO
    };
    BracketTax {
        taxable_base: base,
        tax,
        effective_rate,
        breakdown,
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    use super::*;

    fn three_brackets() -> TaxSchedule {
        TaxSchedule::Progressive {
            brackets: vec![
                TaxBracket::new(Some(dec!(11600)), dec!(0.10)),
                TaxBracket::new(Some(dec!(47150)), dec!(0.12)),
                TaxBracket::new(None, dec!(0.22)),
            ],
        }
    }

    // =========================================================================
    // compute_tax tests
    // =========================================================================

    #[test]
    fn compute_tax_walks_progressive_slices() {
        let result = compute_tax(dec!(50000), &three_brackets(), "federal").unwrap();

        assert_eq!(result.tax, dec!(6053.00));
        assert_eq!(
            result
                .breakdown
                .iter()
                .map(|s| (s.taxed_amount, s.tax))
                .collect::<Vec<_>>(),
            vec![
                (dec!(11600), dec!(1160.00)),
                (dec!(35550), dec!(4266.00)),
                (dec!(2850), dec!(627.00)),
            ]
        );
        assert_eq!(result.marginal_rate(), dec!(0.22));
    }

    #[test]
    fn compute_tax_stops_at_containing_bracket() {
        let result = compute_tax(dec!(11600), &three_brackets(), "federal").unwrap();

        assert_eq!(result.tax, dec!(1160.00));
        assert_eq!(result.breakdown.len(), 1);
    }

    #[test]
    fn compute_tax_effective_rate() {
        let result = compute_tax(dec!(50000), &three_brackets(), "federal").unwrap();

        assert_eq!(result.effective_rate, dec!(0.12106));
    }

    #[test]
    fn compute_tax_flat_rate() {
        let schedule = TaxSchedule::Flat { rate: dec!(0.0495) };

        let result = compute_tax(dec!(60000), &schedule, "IL").unwrap();

        assert_eq!(result.tax, dec!(2970.00));
        assert_eq!(result.effective_rate, dec!(0.0495));
    }

    #[test]
    fn compute_tax_no_income_tax() {
        let result = compute_tax(dec!(250000), &TaxSchedule::None, "TX").unwrap();

        assert_eq!(result, BracketTax::zero(dec!(250000)));
    }

    #[test]
    fn compute_tax_zero_base() {
        let result = compute_tax(dec!(0), &three_brackets(), "federal").unwrap();

        assert_eq!(result.tax, dec!(0));
        assert_eq!(result.effective_rate, dec!(0));
        assert!(result.breakdown.is_empty());
    }

    #[test]
    fn compute_tax_clamps_negative_base() {
        let result = compute_tax(dec!(-500), &three_brackets(), "federal").unwrap();

        assert_eq!(result.taxable_base, dec!(0));
        assert_eq!(result.tax, dec!(0));
    }

    #[test]
    fn compute_tax_rejects_empty_progressive_table() {
        let schedule = TaxSchedule::Progressive { brackets: vec![] };

        assert_eq!(
            compute_tax(dec!(1000), &schedule, "CA 2024"),
            Err(ConfigError::EmptyBrackets {
                jurisdiction: "CA 2024".to_string()
            })
        );
    }

    // =========================================================================
    // properties
    // =========================================================================

    fn tax_at(cents: i64) -> Decimal {
        compute_tax(Decimal::new(cents, 2), &three_brackets(), "federal")
            .unwrap()
            .tax
    }

    proptest! {
        #[test]
        fn tax_is_monotonic(a in 0i64..100_000_000, b in 0i64..100_000_000) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(tax_at(lo) <= tax_at(hi));
        }

        #[test]
        fn tax_is_never_negative(cents in -10_000_000i64..100_000_000) {
            prop_assert!(tax_at(cents) >= Decimal::ZERO);
        }
    }

    #[test]
    fn tax_is_continuous_at_bracket_boundaries() {
        for boundary in [1_160_000i64, 4_715_000] {
            let below = tax_at(boundary - 1);
            let at = tax_at(boundary);
            let above = tax_at(boundary + 1);

            assert!(at - below <= dec!(0.01));
            assert!(above - at <= dec!(0.01));
        }
    }
}
