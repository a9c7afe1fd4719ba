use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use rust_decimal::Decimal;
use tax_core::{FilingStatus, ScenarioInput, StateCode};

// ─── CLI definition ──────────────────────────────────────────────────────────

/// Compares take-home pay from a W-2 salary against 1099 contract income.
///
/// Loads per-year federal constants and state rulesets from a configuration
/// directory, runs both paths through federal, payroll and state tax, and
/// reports the difference and the 1099 break-even rate.
#[derive(Debug, Parser)]
#[command(name = "tax-compare", version)]
pub struct Cli {
    /// Configuration directory with one sub-directory per tax year.
    /// Defaults to the sample data bundled with the tool.
    #[arg(long, global = true)]
    pub config_dir: Option<PathBuf>,

    /// Skip unsupported rule expressions instead of refusing to load.
    #[arg(long, global = true)]
    pub lenient: bool,

    /// Print results as JSON instead of text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Log filter: a bare level (`debug`) or a full `RUST_LOG` directive.
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Also append log records to this file.
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Compare one W-2 offer against one 1099 offer.
    Compare(ScenarioArgs),

    /// Compare every scenario in a CSV file.
    Batch {
        /// Scenario CSV with a header row.
        file: PathBuf,
    },

    /// Self-employment tax on a net profit.
    SeTax {
        #[arg(long)]
        year: i32,
        #[arg(long, value_parser = parse_filing_status, default_value = "S")]
        status: FilingStatus,
        #[arg(long, allow_negative_numbers = true)]
        net_profit: Decimal,
        /// W-2 wages already counted against the social security wage base.
        #[arg(long, default_value = "0")]
        w2_wages: Decimal,
    },

    /// Prior-year safe harbor for estimated payments.
    SafeHarbor {
        #[arg(long)]
        year: i32,
        #[arg(long, value_parser = parse_filing_status, default_value = "S")]
        status: FilingStatus,
        #[arg(long)]
        prior_tax: Decimal,
        #[arg(long)]
        prior_agi: Decimal,
    },

    /// Load the configuration directory and list what it contains.
    Validate,
}

#[derive(Debug, Args)]
pub struct ScenarioArgs {
    #[arg(long)]
    pub year: i32,

    /// `S`, `MFJ`, `MFS`, `HOH` or `QSS`.
    #[arg(long, value_parser = parse_filing_status, default_value = "S")]
    pub status: FilingStatus,

    /// Two-letter state code.
    #[arg(long, value_parser = parse_state)]
    pub state: StateCode,

    /// Annual W-2 salary.
    #[arg(long)]
    pub w2: Decimal,

    /// Annual 1099 contract income.
    #[arg(long = "income-1099")]
    pub income_1099: Decimal,

    /// Deductible business expenses on the 1099 path.
    #[arg(long, default_value = "0")]
    pub expenses: Decimal,

    /// Run the premium adjustments and the payment planning block.
    #[arg(long)]
    pub premium: bool,

    /// Itemize state deductions instead of taking the state standard deduction.
    #[arg(long)]
    pub itemize_state: bool,

    /// Estimated payments made per quarter, as `Q1,Q2,Q3,Q4`.
    #[arg(long, value_delimiter = ',')]
    pub quarterly_payments: Vec<Decimal>,

    /// Date the penalty-risk tracker treats as today (`YYYY-MM-DD`).
    #[arg(long)]
    pub as_of: Option<NaiveDate>,

    /// Two-thirds of gross income is from farming or fishing.
    #[arg(long)]
    pub farmer_or_fisher: bool,

    /// Additional scenario fact as `name=value`; repeatable.
    #[arg(long = "fact", value_name = "NAME=VALUE")]
    pub facts: Vec<String>,
}

impl ScenarioArgs {
    pub fn to_input(&self) -> Result<ScenarioInput> {
        let mut input = ScenarioInput::new(
            self.year,
            self.status,
            self.state.clone(),
            self.w2,
            self.income_1099,
        );
        input.business_expenses = self.expenses;
        input.premium = self.premium;
        input.itemize_state_deductions = self.itemize_state;
        input.as_of = self.as_of;
        input.farmer_or_fisher = self.farmer_or_fisher;

        input.estimated_payments_by_quarter = match self.quarterly_payments.as_slice() {
            [] => None,
            [q1, q2, q3, q4] => Some([*q1, *q2, *q3, *q4]),
            other => bail!(
                "--quarterly-payments takes exactly four amounts, got {}",
                other.len()
            ),
        };

        for assignment in &self.facts {
            input
                .facts
                .assign(assignment)
                .with_context(|| format!("invalid --fact '{assignment}'"))?;
        }
        Ok(input)
    }
}

fn parse_filing_status(s: &str) -> Result<FilingStatus, String> {
    FilingStatus::parse(s)
        .or_else(|| FilingStatus::parse(&s.to_ascii_uppercase()))
        .ok_or_else(|| format!("unrecognised filing status '{s}' (use S, MFJ, MFS, HOH or QSS)"))
}

fn parse_state(s: &str) -> Result<StateCode, String> {
    StateCode::parse(s).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;
    use tax_core::Fact;

    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("tax-compare").chain(args.iter().copied())).unwrap()
    }

    fn scenario(args: &[&str]) -> ScenarioArgs {
        match parse(args).command {
            Command::Compare(scenario) => scenario,
            other => panic!("expected compare, got {other:?}"),
        }
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    // =========================================================================
    // compare
    // =========================================================================

    #[test]
    fn compare_minimal_uses_defaults() {
        let args = scenario(&[
            "compare",
            "--year",
            "2024",
            "--state",
            "tx",
            "--w2",
            "90000",
            "--income-1099",
            "110000",
        ]);

        let input = args.to_input().unwrap();
        assert_eq!(input.filing_status, FilingStatus::Single);
        assert_eq!(input.state.as_str(), "TX");
        assert_eq!(input.business_expenses, dec!(0));
        assert_eq!(input.estimated_payments_by_quarter, None);
        assert!(!input.premium);
    }

    #[test]
    fn compare_reads_facts_and_quarters() {
        let args = scenario(&[
            "compare",
            "--year",
            "2024",
            "--status",
            "mfj",
            "--state",
            "CA",
            "--w2",
            "150000",
            "--income-1099",
            "175000",
            "--premium",
            "--quarterly-payments",
            "5000,5000,0,0",
            "--as-of",
            "2024-10-01",
            "--fact",
            "qualifyingChildren=2",
            "--fact",
            "priorYearTax=28000",
        ]);

        let input = args.to_input().unwrap();
        assert_eq!(input.filing_status, FilingStatus::MarriedFilingJointly);
        assert_eq!(
            input.estimated_payments_by_quarter,
            Some([dec!(5000), dec!(5000), dec!(0), dec!(0)])
        );
        assert_eq!(input.as_of, NaiveDate::from_ymd_opt(2024, 10, 1));
        assert_eq!(input.facts.amount(Fact::PriorYearTax), dec!(28000));
        assert_eq!(input.facts.qualifying_children, Some(2));
    }

    #[test]
    fn compare_rejects_three_quarters() {
        let args = scenario(&[
            "compare",
            "--year",
            "2024",
            "--state",
            "TX",
            "--w2",
            "1",
            "--income-1099",
            "1",
            "--quarterly-payments",
            "1,2,3",
        ]);

        let err = args.to_input().unwrap_err();
        assert!(err.to_string().contains("exactly four"));
    }

    #[test]
    fn compare_rejects_unknown_fact() {
        let args = scenario(&[
            "compare",
            "--year",
            "2024",
            "--state",
            "TX",
            "--w2",
            "1",
            "--income-1099",
            "1",
            "--fact",
            "shoeSize=11",
        ]);

        assert!(args.to_input().is_err());
    }

    #[test]
    fn bad_status_and_state_fail_to_parse() {
        let status = Cli::try_parse_from([
            "tax-compare",
            "se-tax",
            "--year",
            "2024",
            "--status",
            "XYZ",
            "--net-profit",
            "1",
        ]);
        let state = Cli::try_parse_from([
            "tax-compare",
            "compare",
            "--year",
            "2024",
            "--state",
            "Texas",
            "--w2",
            "1",
            "--income-1099",
            "1",
        ]);

        assert!(status.is_err());
        assert!(state.is_err());
    }

    // =========================================================================
    // Global flags and other commands
    // =========================================================================

    #[test]
    fn global_flags_after_subcommand() {
        let cli = parse(&[
            "validate",
            "--config-dir",
            "/tmp/tax",
            "--lenient",
            "--json",
            "--log-level",
            "debug",
        ]);

        assert!(matches!(cli.command, Command::Validate));
        assert_eq!(cli.config_dir, Some(PathBuf::from("/tmp/tax")));
        assert!(cli.lenient);
        assert!(cli.json);
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
    }

    #[test]
    fn se_tax_accepts_negative_profit() {
        let cli = parse(&["se-tax", "--year", "2024", "--net-profit", "-500"]);

        match cli.command {
            Command::SeTax {
                net_profit,
                w2_wages,
                ..
            } => {
                assert_eq!(net_profit, dec!(-500));
                assert_eq!(w2_wages, dec!(0));
            }
            other => panic!("expected se-tax, got {other:?}"),
        }
    }
}
