//! Loads a configuration directory into an [`InMemoryRepository`].
//!
//! ```text
//! <root>/
//!   2024/
//!     federal.toml        tax-year constants
//!     brackets.csv        optional; federal brackets in IRS schedule form
//!     states/
//!       CA.toml           one ruleset per state
//! ```
//!
//! Brackets from `brackets.csv` replace any given inline in `federal.toml`.
//! Everything is validated before it reaches the repository. In
//! [`LoadMode::Strict`] a rule using an expression node the engine does not
//! understand is rejected; [`LoadMode::Lenient`] keeps it, and the evaluator
//! reports it and counts it as zero.

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use tax_core::{InMemoryRepository, StateRuleSet, TaxRulesRepository, TaxYearConstants};
use tracing::{debug, info, warn};

use crate::brackets_csv::BracketCsv;
use crate::error::LoaderError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LoadMode {
    #[default]
    Strict,
    Lenient,
}

pub fn parse_constants(text: &str) -> Result<TaxYearConstants, toml::de::Error> {
    toml::from_str(text)
}

pub fn parse_ruleset(text: &str) -> Result<StateRuleSet, toml::de::Error> {
    toml::from_str(text)
}

#[derive(Debug, Clone)]
pub struct ConfigLoader {
    root: PathBuf,
    mode: LoadMode,
}

impl ConfigLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            mode: LoadMode::default(),
        }
    }

    pub fn with_mode(
        mut self,
        mode: LoadMode,
    ) -> Self {
        self.mode = mode;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Loads every tax-year directory under the root.
    ///
    /// # Errors
    ///
    /// The first file that cannot be read, parsed or validated, or
    /// [`LoaderError::Empty`] when the root holds no year directories.
    pub fn load(&self) -> Result<InMemoryRepository, LoaderError> {
        let years = self.year_directories()?;
        if years.is_empty() {
            return Err(LoaderError::Empty(self.root.clone()));
        }

        let mut repository = InMemoryRepository::new();
        for year in years {
            self.load_year(&mut repository, year)?;
        }
        Ok(repository)
    }

    /// Loads one year's constants and state rulesets into `repository`.
    pub fn load_year(
        &self,
        repository: &mut InMemoryRepository,
        year: i32,
    ) -> Result<(), LoaderError> {
        let year_dir = self.root.join(year.to_string());

        let federal_path = year_dir.join("federal.toml");
        let mut constants = parse_constants(&read(&federal_path)?).map_err(|source| {
            LoaderError::Toml {
                path: federal_path.clone(),
                source,
            }
        })?;
        if constants.tax_year != year {
            return Err(LoaderError::YearMismatch {
                path: federal_path,
                expected: year,
                found: constants.tax_year,
            });
        }

        let brackets_path = year_dir.join("brackets.csv");
        if brackets_path.is_file() {
            self.merge_brackets(&brackets_path, &mut constants)?;
        }

        repository
            .insert_constants(constants)
            .map_err(|source| LoaderError::Invalid {
                path: federal_path.clone(),
                source,
            })?;

        let states_dir = year_dir.join("states");
        if states_dir.is_dir() {
            for path in toml_files(&states_dir)? {
                self.load_state(repository, year, &path)?;
            }
        } else {
            warn!(year, dir = %states_dir.display(), "No state rulesets for tax year");
        }

        info!(
            year,
            states = repository.list_states(year).len(),
            mode = ?self.mode,
            "Loaded tax year"
        );
        Ok(())
    }

    fn merge_brackets(
        &self,
        path: &Path,
        constants: &mut TaxYearConstants,
    ) -> Result<(), LoaderError> {
        let file = File::open(path).map_err(|source| LoaderError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let brackets_error = |source| LoaderError::Brackets {
            path: path.to_path_buf(),
            source,
        };
        let records = BracketCsv::parse(file).map_err(brackets_error)?;
        let mut tables = BracketCsv::into_tables(&records).map_err(brackets_error)?;

        if let Some(other) = tables.keys().copied().find(|y| *y != constants.tax_year) {
            return Err(LoaderError::YearMismatch {
                path: path.to_path_buf(),
                expected: constants.tax_year,
                found: other,
            });
        }
        if let Some(table) = tables.remove(&constants.tax_year) {
            debug!(path = %path.display(), "Using federal brackets from CSV");
            constants.federal.brackets = table;
        }
        Ok(())
    }

    fn load_state(
        &self,
        repository: &mut InMemoryRepository,
        year: i32,
        path: &Path,
    ) -> Result<(), LoaderError> {
        let ruleset = parse_ruleset(&read(path)?).map_err(|source| LoaderError::Toml {
            path: path.to_path_buf(),
            source,
        })?;

        if ruleset.tax_year != year {
            return Err(LoaderError::YearMismatch {
                path: path.to_path_buf(),
                expected: year,
                found: ruleset.tax_year,
            });
        }
        let expected = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().to_ascii_uppercase())
            .unwrap_or_default();
        if ruleset.state.as_str() != expected {
            return Err(LoaderError::StateMismatch {
                path: path.to_path_buf(),
                expected,
                found: ruleset.state,
            });
        }

        debug!(state = %ruleset.state, year, "Loaded state ruleset");
        repository
            .insert_ruleset(ruleset, self.mode == LoadMode::Lenient)
            .map_err(|source| LoaderError::Invalid {
                path: path.to_path_buf(),
                source,
            })
    }

    fn year_directories(&self) -> Result<Vec<i32>, LoaderError> {
        let entries = fs::read_dir(&self.root).map_err(|source| LoaderError::Io {
            path: self.root.clone(),
            source,
        })?;

        let mut years: Vec<i32> = entries
            .filter_map(Result::ok)
            .filter(|entry| entry.path().is_dir())
            .filter_map(|entry| entry.file_name().to_str()?.parse().ok())
            .collect();
        years.sort_unstable();
        Ok(years)
    }
}

fn read(path: &Path) -> Result<String, LoaderError> {
    fs::read_to_string(path).map_err(|source| LoaderError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// `*.toml` files in `dir`, sorted by name.
fn toml_files(dir: &Path) -> Result<Vec<PathBuf>, LoaderError> {
    let entries = fs::read_dir(dir).map_err(|source| LoaderError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut files: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "toml"))
        .collect();
    files.sort();
    Ok(files)
}
