use std::path::PathBuf;

use tax_core::{ConfigError, RepositoryError, StateCode};
use thiserror::Error;

/// Errors raised while turning a federal bracket CSV into bracket tables.
#[derive(Debug, Error)]
pub enum BracketCsvError {
    #[error("CSV parse error: {0}")]
    CsvParse(String),

    #[error("Invalid schedule: {0}")]
    InvalidSchedule(String),

    #[error(
        "schedule {schedule} ({tax_year}): bracket starting at {min_income} does not continue from {expected}"
    )]
    Gap {
        tax_year: i32,
        schedule: String,
        min_income: rust_decimal::Decimal,
        expected: rust_decimal::Decimal,
    },

    #[error("schedule {schedule} ({tax_year}): {source}")]
    Invalid {
        tax_year: i32,
        schedule: String,
        #[source]
        source: ConfigError,
    },
}

impl From<csv::Error> for BracketCsvError {
    fn from(err: csv::Error) -> Self {
        BracketCsvError::CsvParse(err.to_string())
    }
}

/// Errors raised while loading a configuration directory.
///
/// Every variant names the file at fault.
#[derive(Debug, Error)]
pub enum LoaderError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", .path.display())]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("{}: {source}", .path.display())]
    Brackets {
        path: PathBuf,
        #[source]
        source: BracketCsvError,
    },

    #[error("{}: declares tax year {found}, expected {expected}", .path.display())]
    YearMismatch {
        path: PathBuf,
        expected: i32,
        found: i32,
    },

    #[error("{}: declares state {found}, expected {expected}", .path.display())]
    StateMismatch {
        path: PathBuf,
        expected: String,
        found: StateCode,
    },

    #[error("{}: {source}", .path.display())]
    Invalid {
        path: PathBuf,
        #[source]
        source: RepositoryError,
    },

    #[error("no tax-year directories under {}", .0.display())]
    Empty(PathBuf),
}
