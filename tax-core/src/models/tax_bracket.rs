use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// One slice of a progressive schedule.
///
/// `up_to` is the inclusive upper edge of the slice; `None` marks the
/// unbounded top bracket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxBracket {
    pub up_to: Option<Decimal>,
    pub rate: Decimal,
}

impl TaxBracket {
    pub fn new(
        up_to: Option<Decimal>,
        rate: Decimal,
    ) -> Self {
        Self { up_to, rate }
    }
}

/// How a jurisdiction turns a taxable base into tax.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TaxSchedule {
    /// The jurisdiction levies no income tax.
    None,
    Flat { rate: Decimal },
    Progressive { brackets: Vec<TaxBracket> },
}

impl TaxSchedule {
    pub fn levies_tax(&self) -> bool {
        !matches!(self, Self::None)
    }
}

/// Rejects bracket tables the calculator would silently misread.
///
/// A valid table is non-empty, has strictly ascending finite upper bounds,
/// ends in exactly one unbounded bracket, and uses rates within `[0, 1]`.
pub fn validate_brackets(
    jurisdiction: &str,
    brackets: &[TaxBracket],
) -> Result<(), ConfigError> {
    let Some(last) = brackets.last() else {
        return Err(ConfigError::EmptyBrackets {
            jurisdiction: jurisdiction.to_string(),
        });
    };
    if last.up_to.is_some() {
        return Err(ConfigError::BoundedTopBracket {
            jurisdiction: jurisdiction.to_string(),
        });
    }

    let mut previous = Decimal::ZERO;
    for (index, bracket) in brackets.iter().enumerate() {
        if bracket.rate < Decimal::ZERO || bracket.rate > Decimal::ONE {
            return Err(ConfigError::InvalidRate {
                context: format!("{jurisdiction} bracket {index}"),
                rate: bracket.rate,
            });
        }
        match bracket.up_to {
            Some(up_to) if up_to <= previous => {
                return Err(ConfigError::UnorderedBrackets {
                    jurisdiction: jurisdiction.to_string(),
                    index,
                });
            }
            Some(up_to) => previous = up_to,
            None if index + 1 != brackets.len() => {
                return Err(ConfigError::UnboundedBeforeLast {
                    jurisdiction: jurisdiction.to_string(),
                    index,
                });
            }
            None => {}
        }
    }

    Ok(())
}
