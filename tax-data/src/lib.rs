//! Configuration loading for the tax engine.
//!
//! Turns a directory of TOML constants, TOML state rulesets and CSV bracket
//! tables into a validated [`InMemoryRepository`](tax_core::InMemoryRepository),
//! and reads scenario batches from CSV.

pub mod brackets_csv;
pub mod config;
pub mod error;
pub mod scenario_csv;

pub use brackets_csv::{BracketCsv, BracketTables, TaxBracketRecord};
pub use config::{ConfigLoader, LoadMode, parse_constants, parse_ruleset};
pub use error::{BracketCsvError, LoaderError};
pub use scenario_csv::{ScenarioCsvError, ScenarioRow};

/// The sample configuration shipped with this crate.
pub fn bundled_data_dir() -> std::path::PathBuf {
    std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("data")
}
