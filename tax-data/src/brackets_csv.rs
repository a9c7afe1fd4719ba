//! Federal bracket tables in IRS schedule CSV form.
//!
//! ```csv
//! tax_year,schedule,min_income,max_income,base_tax,rate
//! 2024,X,0,11600,0,0.10
//! 2024,X,11600,47150,1160.00,0.12
//! ```
//!
//! Schedules map to filing statuses the way the IRS tables do:
//!
//! | Schedule | Filing status |
//! |----------|---------------|
//! | X   | Single |
//! | Y-1 | Married filing jointly, qualifying surviving spouse |
//! | Y-2 | Married filing separately |
//! | Z   | Head of household |
//!
//! `base_tax` is redundant with the rates; it is checked against the running
//! total and a mismatch is logged, not rejected.

use std::collections::BTreeMap;
use std::io::Read;

use rust_decimal::Decimal;
use serde::Deserialize;
use tax_core::{FilingStatus, FilingStatusTable, TaxBracket, validate_brackets};
use tracing::{debug, warn};

use crate::error::BracketCsvError;

const BASE_TAX_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

fn schedule_to_filing_statuses(
    schedule: &str
) -> Result<&'static [FilingStatus], BracketCsvError> {
    match schedule {
        "X" => Ok(&[FilingStatus::Single]),
        "Y-1" => Ok(&[
            FilingStatus::MarriedFilingJointly,
            FilingStatus::QualifyingSurvivingSpouse,
        ]),
        "Y-2" => Ok(&[FilingStatus::MarriedFilingSeparately]),
        "Z" => Ok(&[FilingStatus::HeadOfHousehold]),
        _ => Err(BracketCsvError::InvalidSchedule(schedule.to_string())),
    }
}

/// One row of the bracket CSV. An empty `max_income` marks the top bracket.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct TaxBracketRecord {
    pub tax_year: i32,
    pub schedule: String,
    pub min_income: Decimal,
    #[serde(deserialize_with = "deserialize_optional_decimal")]
    pub max_income: Option<Decimal>,
    pub base_tax: Decimal,
    pub rate: Decimal,
}

fn deserialize_optional_decimal<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: Option<String> = Option::deserialize(deserializer)?;
    match s {
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => s
            .trim()
            .parse::<Decimal>()
            .map(Some)
            .map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}

/// Federal bracket tables keyed by tax year.
pub type BracketTables = BTreeMap<i32, FilingStatusTable<Vec<TaxBracket>>>;

pub struct BracketCsv;

impl BracketCsv {
    /// Parses every row; the reader can be a file or a byte slice.
    pub fn parse<R: Read>(reader: R) -> Result<Vec<TaxBracketRecord>, BracketCsvError> {
        let mut csv_reader = csv::Reader::from_reader(reader);
        let mut records = Vec::new();

        for result in csv_reader.deserialize() {
            let record: TaxBracketRecord = result?;
            records.push(record);
        }

        Ok(records)
    }

    /// Groups records by year and schedule into validated bracket tables.
    ///
    /// Within a schedule, rows are ordered by `min_income` and must start at
    /// zero and continue exactly where the previous row ended.
    pub fn into_tables(records: &[TaxBracketRecord]) -> Result<BracketTables, BracketCsvError> {
        let mut groups: BTreeMap<(i32, &str), Vec<&TaxBracketRecord>> = BTreeMap::new();
        for record in records {
            groups
                .entry((record.tax_year, record.schedule.as_str()))
                .or_default()
                .push(record);
        }

        let mut tables = BracketTables::new();
        for ((tax_year, schedule), mut rows) in groups {
            let statuses = schedule_to_filing_statuses(schedule)?;
            rows.sort_by(|a, b| a.min_income.cmp(&b.min_income));
            let brackets = Self::schedule_brackets(tax_year, schedule, &rows)?;

            let jurisdiction = format!("federal {tax_year} schedule {schedule}");
            validate_brackets(&jurisdiction, &brackets).map_err(|source| {
                BracketCsvError::Invalid {
                    tax_year,
                    schedule: schedule.to_string(),
                    source,
                }
            })?;

            debug!(tax_year, schedule, brackets = brackets.len(), "Parsed bracket schedule");
            let table = tables.entry(tax_year).or_default();
            for status in statuses {
                table.set(*status, brackets.clone());
            }
        }

        Ok(tables)
    }

    fn schedule_brackets(
        tax_year: i32,
        schedule: &str,
        rows: &[&TaxBracketRecord],
    ) -> Result<Vec<TaxBracket>, BracketCsvError> {
        let mut expected_min = Decimal::ZERO;
        let mut running_tax = Decimal::ZERO;
        let mut brackets = Vec::with_capacity(rows.len());

        for row in rows {
            if row.min_income != expected_min {
                return Err(BracketCsvError::Gap {
                    tax_year,
                    schedule: schedule.to_string(),
                    min_income: row.min_income,
                    expected: expected_min,
                });
            }
            if (row.base_tax - running_tax).abs() > BASE_TAX_TOLERANCE {
                warn!(
                    tax_year,
                    schedule,
                    min_income = %row.min_income,
                    base_tax = %row.base_tax,
                    computed = %running_tax,
                    "Bracket base tax disagrees with the rates; using the rates"
                );
            }

            if let Some(max) = row.max_income {
                running_tax += (max - row.min_income) * row.rate;
                expected_min = max;
            }
            brackets.push(TaxBracket::new(row.max_income, row.rate));
        }

        Ok(brackets)
    }
}
