//! Scenario batches in CSV form.
//!
//! Headers are matched by name, so column order does not matter.
//!
//! | Column | Required | Type | Notes |
//! |----------------------------|----------|---------|-------------------------------------------|
//! | `name`                     | no       | string  | Defaults to `row N` |
//! | `tax_year`                 | yes      | integer | e.g. `2024` |
//! | `filing_status`            | yes      | string  | `S`, `MFJ`, `MFS`, `HOH`, `QSS` |
//! | `state`                    | yes      | string  | Two-letter postal code |
//! | `w2_salary`                | yes      | decimal | |
//! | `income_1099`              | yes      | decimal | |
//! | `business_expenses`        | no       | decimal | Empty means 0 |
//! | `premium`                  | no       | bool    | `true` / `false` |
//! | `itemize_state_deductions` | no       | bool    | |
//! | `facts`                    | no       | string  | `name=value` pairs separated by `;` |
//!
//! ```csv
//! name,tax_year,filing_status,state,w2_salary,income_1099,premium,facts
//! family,2024,MFJ,CA,150000,175000,true,qualifyingChildren=2;childrenUnderSix=1
//! ```

use std::path::Path;

use rust_decimal::Decimal;
use serde::Deserialize;
use tax_core::{FactError, FilingStatus, ScenarioInput, StateCode};
use thiserror::Error;

#[derive(Debug, Deserialize)]
struct CsvRow {
    #[serde(default)]
    name: Option<String>,
    tax_year: i32,
    filing_status: String,
    state: String,
    w2_salary: Decimal,
    income_1099: Decimal,
    #[serde(default)]
    business_expenses: Option<Decimal>,
    #[serde(default)]
    premium: Option<bool>,
    #[serde(default)]
    itemize_state_deductions: Option<bool>,
    #[serde(default)]
    facts: Option<String>,
}

#[derive(Debug, Error)]
pub enum ScenarioCsvError {
    #[error("CSV parse error: {0}")]
    Parse(#[from] csv::Error),

    #[error("failed to read scenario file: {0}")]
    Io(#[from] std::io::Error),

    /// `row` is 1-based, not counting the header.
    #[error("unrecognised filing status '{status}' on row {row}")]
    InvalidFilingStatus { status: String, row: usize },

    #[error("invalid state '{state}' on row {row}")]
    InvalidState { state: String, row: usize },

    #[error("row {row}: {source}")]
    InvalidFact {
        row: usize,
        #[source]
        source: FactError,
    },
}

/// One named scenario from a batch file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScenarioRow {
    pub name: String,
    pub input: ScenarioInput,
}

fn convert_row(
    row: CsvRow,
    row_number: usize,
) -> Result<ScenarioRow, ScenarioCsvError> {
    let filing_status = FilingStatus::parse(&row.filing_status).ok_or_else(|| {
        ScenarioCsvError::InvalidFilingStatus {
            status: row.filing_status.clone(),
            row: row_number,
        }
    })?;
    let state = StateCode::parse(&row.state).map_err(|_| ScenarioCsvError::InvalidState {
        state: row.state.clone(),
        row: row_number,
    })?;

    let mut input = ScenarioInput::new(
        row.tax_year,
        filing_status,
        state,
        row.w2_salary,
        row.income_1099,
    );
    input.business_expenses = row.business_expenses.unwrap_or_default();
    input.premium = row.premium.unwrap_or(false);
    input.itemize_state_deductions = row.itemize_state_deductions.unwrap_or(false);

    for assignment in row
        .facts
        .as_deref()
        .unwrap_or_default()
        .split(';')
        .map(str::trim)
        .filter(|a| !a.is_empty())
    {
        input
            .facts
            .assign(assignment)
            .map_err(|source| ScenarioCsvError::InvalidFact {
                row: row_number,
                source,
            })?;
    }

    Ok(ScenarioRow {
        name: row
            .name
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| format!("row {row_number}")),
        input,
    })
}

/// Parses a whole batch; rows come back in file order.
///
/// # Errors
///
/// * [`ScenarioCsvError::Parse`] for structural problems and bad numbers.
/// * [`ScenarioCsvError::InvalidFilingStatus`], [`ScenarioCsvError::InvalidState`]
///   and [`ScenarioCsvError::InvalidFact`] name the offending row.
pub fn load_from_str(input: &str) -> Result<Vec<ScenarioRow>, ScenarioCsvError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .flexible(false)
        .from_reader(input.as_bytes());

    reader
        .deserialize::<CsvRow>()
        .enumerate()
        .map(|(idx, result)| {
            let row = result?;
            convert_row(row, idx + 1)
        })
        .collect()
}

pub fn load_from_file(path: &Path) -> Result<Vec<ScenarioRow>, ScenarioCsvError> {
    let contents = std::fs::read_to_string(path)?;
    load_from_str(&contents)
}
