use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};
use uuid::Uuid;

use crate::api::{ServerConfig, run_http_server};
use crate::core::{
    DEFAULT_MAX_MONTHS, Debt, SimulationError, SimulationOptions, SimulationResult, Strategy,
    compare_strategies, simulate_with_options,
};
use crate::narrative::{NarrativeError, PlanNarrator, TemplateNarrator};
use crate::store::NewDebt;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("failed to read {path}: {source}")]
    Read { path: String, source: io::Error },

    #[error("invalid debts JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Simulation(#[from] SimulationError),

    #[error(transparent)]
    Narrative(#[from] NarrativeError),

    #[error("server error: {0}")]
    Server(io::Error),
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum CliStrategy {
    Avalanche,
    Snowball,
}

impl From<CliStrategy> for Strategy {
    fn from(value: CliStrategy) -> Self {
        match value {
            CliStrategy::Avalanche => Strategy::Avalanche,
            CliStrategy::Snowball => Strategy::Snowball,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Parser, Debug)]
#[command(
    name = "finsaathi",
    version,
    about = "Debt payoff planner (avalanche / snowball) with a JSON HTTP API"
)]
pub struct Cli {
    /// Log filter used when FINSAATHI_LOG is unset, e.g. info or finsaathi=debug
    #[arg(long, global = true, env = "FINSAATHI_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Serve the HTTP API
    Serve(ServeArgs),
    /// Compute a payoff plan for debts read from a JSON file
    Plan(PlanArgs),
}

#[derive(Args, Debug)]
pub struct ServeArgs {
    #[arg(long, env = "FINSAATHI_HOST", default_value = "0.0.0.0")]
    pub host: String,
    #[arg(short, long, env = "FINSAATHI_PORT", default_value_t = 8080)]
    pub port: u16,
    #[arg(
        long,
        env = "FINSAATHI_MAX_MONTHS",
        default_value_t = DEFAULT_MAX_MONTHS,
        help = "Months simulated before a plan is reported as non-converging"
    )]
    pub max_months: u32,
}

#[derive(Args, Debug)]
pub struct PlanArgs {
    #[arg(long, help = "JSON array of debts, or - for stdin")]
    pub input: String,
    #[arg(long, help = "Total amount available for debts each month")]
    pub budget: f64,
    #[arg(long, value_enum, ignore_case = true, default_value_t = CliStrategy::Avalanche)]
    pub strategy: CliStrategy,
    #[arg(long, help = "Run both strategies and recommend one")]
    pub compare: bool,
    #[arg(long, help = "Append a plain-language summary")]
    pub narrate: bool,
    #[arg(long, default_value_t = DEFAULT_MAX_MONTHS)]
    pub max_months: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PlanOutput {
    #[serde(flatten)]
    result: SimulationResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<String>,
}

pub fn init_tracing(filter: &str, format: LogFormat) {
    let env_filter =
        EnvFilter::try_from_env("FINSAATHI_LOG").unwrap_or_else(|_| EnvFilter::new(filter));
    let registry = tracing_subscriber::registry().with(env_filter);
    match format {
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(io::stderr))
            .init(),
        LogFormat::Pretty => registry
            .with(fmt::layer().with_target(true).with_writer(io::stderr))
            .init(),
    }
}

pub async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Command::Serve(args) => {
            let config = ServerConfig {
                host: args.host,
                port: args.port,
                options: SimulationOptions {
                    max_months: args.max_months,
                },
            };
            run_http_server(config).await.map_err(CliError::Server)
        }
        Command::Plan(args) => {
            let output = run_plan(&args)?;
            println!("{output}");
            Ok(())
        }
    }
}

/// Runs the `plan` command and returns the pretty-printed JSON it prints.
pub fn run_plan(args: &PlanArgs) -> Result<String, CliError> {
    let raw = read_input(&args.input)?;
    let debts = parse_debts(&raw)?;
    let options = SimulationOptions {
        max_months: args.max_months,
    };
    debug!(debts = debts.len(), budget = args.budget, "planning");

    if args.compare {
        let comparison = compare_strategies(&debts, args.budget, options)?;
        info!(
            recommended = comparison.recommended.as_str(),
            "compared strategies"
        );
        return Ok(serde_json::to_string_pretty(&comparison)?);
    }

    let result = simulate_with_options(&debts, args.budget, args.strategy.into(), options)?;
    let summary = if args.narrate {
        Some(TemplateNarrator::default().narrate(&debts, &result)?)
    } else {
        None
    };
    Ok(serde_json::to_string_pretty(&PlanOutput { result, summary })?)
}

fn parse_debts(raw: &str) -> Result<Vec<Debt>, CliError> {
    let records: Vec<NewDebt> = serde_json::from_str(raw)?;
    Ok(records
        .into_iter()
        .map(|record| record.into_debt(Uuid::new_v4()))
        .collect())
}

fn read_input(input: &str) -> Result<String, CliError> {
    let read_err = |source| CliError::Read {
        path: input.to_string(),
        source,
    };
    if input == "-" {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf).map_err(read_err)?;
        Ok(buf)
    } else {
        fs::read_to_string(PathBuf::from(input)).map_err(read_err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use serde_json::Value;
    use std::io::Write;
    use std::path::Path;
    use tempfile::NamedTempFile;

    fn write_debts(json: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("create temp debts");
        file.write_all(json.as_bytes()).expect("write temp debts");
        file
    }

    const DEBTS: &str = r#"[
        {"name": "A", "type": "credit-card", "currentBalance": 5000, "interestRate": 24, "minimumPayment": 200},
        {"name": "B", "currentBalance": 2000, "interestRate": 12, "minimumPayment": 100}
    ]"#;

    fn plan_args(input: &Path) -> PlanArgs {
        PlanArgs {
            input: input.display().to_string(),
            budget: 500.0,
            strategy: CliStrategy::Snowball,
            compare: false,
            narrate: false,
            max_months: DEFAULT_MAX_MONTHS,
        }
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_plan_subcommand() {
        let cli = Cli::try_parse_from([
            "finsaathi",
            "plan",
            "--input",
            "debts.json",
            "--budget",
            "750",
            "--strategy",
            "SnowBall",
            "--narrate",
        ])
        .expect("valid args");
        let Command::Plan(args) = cli.command else {
            panic!("expected plan command");
        };
        assert_eq!(args.strategy, CliStrategy::Snowball);
        assert_eq!(args.budget, 750.0);
        assert!(args.narrate);
        assert_eq!(args.max_months, DEFAULT_MAX_MONTHS);
    }

    #[test]
    fn plan_writes_simulation_json() {
        let file = write_debts(DEBTS);
        let mut args = plan_args(file.path());
        args.narrate = true;
        let output = run_plan(&args).expect("plan succeeds");
        let value: Value = serde_json::from_str(&output).expect("json output");
        assert_eq!(value["strategy"], "snowball");
        assert!(value["monthlyPlan"].as_array().is_some_and(|m| !m.is_empty()));
        assert!(value["summary"].as_str().is_some());
    }

    #[test]
    fn plan_compare_recommends() {
        let file = write_debts(DEBTS);
        let mut args = plan_args(file.path());
        args.compare = true;
        let output = run_plan(&args).expect("compare succeeds");
        let value: Value = serde_json::from_str(&output).expect("json output");
        assert_eq!(value["recommended"], "avalanche");
    }

    #[test]
    fn plan_surfaces_budget_errors() {
        let file = write_debts(DEBTS);
        let mut args = plan_args(file.path());
        args.budget = 10.0;
        let err = run_plan(&args).expect_err("budget too low");
        assert!(matches!(
            err,
            CliError::Simulation(SimulationError::BudgetTooLow { .. })
        ));
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let args = plan_args(Path::new("/definitely/not/here.json"));
        assert!(matches!(run_plan(&args), Err(CliError::Read { .. })));
    }
}
