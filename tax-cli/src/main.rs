use anyhow::{Context, Result, bail};
use clap::Parser;
use serde::Serialize;
use tracing::{debug, error, info};

use tax_core::{InMemoryRepository, TaxEngine, TaxRulesRepository};
use tax_data::{ConfigLoader, LoadMode, bundled_data_dir, scenario_csv};

mod cli;
mod logging;
mod report;

use cli::{Cli, Command};

// ─── helpers ─────────────────────────────────────────────────────────────────

fn load_repository(cli: &Cli) -> Result<InMemoryRepository> {
    let root = cli.config_dir.clone().unwrap_or_else(bundled_data_dir);
    let mode = if cli.lenient {
        LoadMode::Lenient
    } else {
        LoadMode::Strict
    };
    debug!(root = %root.display(), ?mode, "Loading configuration");

    ConfigLoader::new(&root)
        .with_mode(mode)
        .load()
        .with_context(|| format!("failed to load configuration from '{}'", root.display()))
}

fn emit<T: Serialize>(
    json: bool,
    value: &T,
    text: impl FnOnce(&T) -> String,
) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        print!("{}", text(value));
    }
    Ok(())
}

#[derive(Serialize)]
struct ConfigSummary {
    root: String,
    years: Vec<YearSummary>,
}

#[derive(Serialize)]
struct YearSummary {
    tax_year: i32,
    states: Vec<String>,
}

// ─── entry point ─────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.log_level.as_deref(), cli.log_file.as_deref())?;

    let repository = load_repository(&cli)?;
    let engine = TaxEngine::new(&repository);

    match &cli.command {
        Command::Compare(args) => {
            let input = args.to_input()?;
            let result = engine.compare_scenarios(&input)?;
            emit(cli.json, &result, report::comparison)
        }

        Command::Batch { file } => {
            let rows = scenario_csv::load_from_file(file)
                .with_context(|| format!("failed to read scenarios from '{}'", file.display()))?;
            info!(count = rows.len(), "Running scenario batch");

            let mut results = Vec::with_capacity(rows.len());
            let mut failures = 0usize;
            for row in rows {
                match engine.compare_scenarios(&row.input) {
                    Ok(result) => results.push((row.name, result)),
                    Err(err) => {
                        error!(scenario = %row.name, error = %err, "Scenario failed");
                        failures += 1;
                    }
                }
            }

            if cli.json {
                let entries: Vec<_> = results
                    .iter()
                    .map(|(name, result)| report::BatchEntry { name, result })
                    .collect();
                println!("{}", serde_json::to_string_pretty(&entries)?);
            } else {
                print!("{}", report::batch(&results));
            }

            if failures > 0 {
                bail!("{failures} of {} scenarios failed", results.len() + failures);
            }
            Ok(())
        }

        Command::SeTax {
            year,
            status,
            net_profit,
            w2_wages,
        } => {
            let result = engine.compute_self_employment_tax(*year, *status, *net_profit, *w2_wages)?;
            emit(cli.json, &result, report::self_employment)
        }

        Command::SafeHarbor {
            year,
            status,
            prior_tax,
            prior_agi,
        } => {
            let result =
                engine.compute_safe_harbor_requirement(*year, *status, *prior_tax, *prior_agi)?;
            emit(cli.json, &result, report::safe_harbor)
        }

        Command::Validate => {
            let summary = ConfigSummary {
                root: cli
                    .config_dir
                    .clone()
                    .unwrap_or_else(bundled_data_dir)
                    .display()
                    .to_string(),
                years: repository
                    .list_tax_years()
                    .into_iter()
                    .map(|tax_year| YearSummary {
                        tax_year,
                        states: repository
                            .list_states(tax_year)
                            .iter()
                            .map(|s| s.as_str().to_string())
                            .collect(),
                    })
                    .collect(),
            };
            emit(cli.json, &summary, |summary| {
                let mut out = format!("{} is valid\n", summary.root);
                for year in &summary.years {
                    out.push_str(&format!("  {}: {}\n", year.tax_year, year.states.join(", ")));
                }
                out
            })
        }
    }
}
