//! Stress CLI - Command line interface for running portfolio stress tests.
//!
//! All output is JSON on stdout; logs go to stderr (filter with `STRESS_LOG`).

use clap::{Parser, Subcommand};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};
use stress_core::{
    worst_scenario, ApiResponse, Calibration, Error, Portfolio, Result, RiskScenario,
    ScenarioCatalog, ScenarioEngine, SensitivityRegistry,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "stress")]
#[command(about = "Portfolio stress testing against risk-factor scenarios")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one or more scenarios against a portfolio
    Run {
        /// Portfolio JSON file
        #[arg(short, long)]
        portfolio: PathBuf,
        /// Catalog scenario id (repeatable)
        #[arg(short, long)]
        scenario: Vec<String>,
        /// Scenario JSON file
        #[arg(long)]
        scenario_file: Option<PathBuf>,
        /// Calibration JSON file (defaults to ~/.stress/calibration.json)
        #[arg(long)]
        calibration: Option<PathBuf>,
        /// Scenario catalog JSON file (defaults to ~/.stress/scenarios.json)
        #[arg(long)]
        catalog: Option<PathBuf>,
    },
    /// Scenario catalog commands
    Scenarios {
        #[command(subcommand)]
        action: ScenarioAction,
    },
    /// Show the effective sensitivity coefficients
    Registry {
        /// Calibration JSON file (defaults to ~/.stress/calibration.json)
        #[arg(long)]
        calibration: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum ScenarioAction {
    /// List available scenarios
    List {
        /// Scenario catalog JSON file
        #[arg(long)]
        catalog: Option<PathBuf>,
    },
    /// Get scenario details
    Get {
        /// Scenario id
        #[arg(short, long)]
        id: String,
        /// Scenario catalog JSON file
        #[arg(long)]
        catalog: Option<PathBuf>,
    },
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    let outcome = match cli.command {
        Commands::Run {
            portfolio,
            scenario,
            scenario_file,
            calibration,
            catalog,
        } => handle_run(
            &portfolio,
            &scenario,
            scenario_file.as_deref(),
            calibration.as_deref(),
            catalog.as_deref(),
        ),
        Commands::Scenarios { action } => handle_scenarios(action),
        Commands::Registry { calibration } => handle_registry(calibration.as_deref()),
    };

    match outcome {
        Ok(data) => println!("{}", render(&ApiResponse::ok(data))),
        Err(e) => {
            tracing::error!("{}", e);
            println!("{}", render(&ApiResponse::<()>::err(e.to_string())));
            std::process::exit(1);
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("STRESS_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn render<T: Serialize>(response: &ApiResponse<T>) -> String {
    serde_json::to_string_pretty(response)
        .unwrap_or_else(|e| json!({ "ok": false, "error": e.to_string() }).to_string())
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

fn load_registry(calibration: Option<&Path>) -> Result<SensitivityRegistry> {
    let calibration = match calibration {
        Some(path) => Calibration::load_from_path(path)?,
        None => Calibration::load()?,
    };
    SensitivityRegistry::with_calibration(&calibration)
}

fn load_catalog(catalog: Option<&Path>) -> Result<ScenarioCatalog> {
    match catalog {
        Some(path) => ScenarioCatalog::load_from_path(path),
        None => ScenarioCatalog::load(),
    }
}

fn handle_run(
    portfolio: &Path,
    scenario_ids: &[String],
    scenario_file: Option<&Path>,
    calibration: Option<&Path>,
    catalog: Option<&Path>,
) -> Result<Value> {
    let portfolio: Portfolio = read_json(portfolio)?;

    let mut scenarios: Vec<RiskScenario> = Vec::new();
    if !scenario_ids.is_empty() {
        let catalog = load_catalog(catalog)?;
        for id in scenario_ids {
            scenarios.push(catalog.get(id)?.clone());
        }
    }
    if let Some(path) = scenario_file {
        scenarios.push(read_json(path)?);
    }
    if scenarios.is_empty() {
        return Err(Error::InvalidScenario(
            "no scenario given; use --scenario or --scenario-file".to_string(),
        ));
    }

    let registry = load_registry(calibration)?;
    let engine = ScenarioEngine::new(&registry);
    let results = engine.run_many(&portfolio, &scenarios)?;

    let worst = worst_scenario(&results).map(|r| r.scenario_id.clone());
    Ok(json!({
        "results": results,
        "worst_scenario": worst,
    }))
}

fn handle_scenarios(action: ScenarioAction) -> Result<Value> {
    match action {
        ScenarioAction::List { catalog } => {
            let catalog = load_catalog(catalog.as_deref())?;
            Ok(json!({ "scenarios": catalog.list() }))
        }
        ScenarioAction::Get { id, catalog } => {
            let catalog = load_catalog(catalog.as_deref())?;
            Ok(serde_json::to_value(catalog.get(&id)?)?)
        }
    }
}

fn handle_registry(calibration: Option<&Path>) -> Result<Value> {
    let registry = load_registry(calibration)?;
    Ok(json!({
        "coefficients": registry.calibration(),
        "defaults": {
            "asset_class_beta": stress_core::sensitivity::DEFAULT_ASSET_CLASS_BETA,
            "sector_beta": stress_core::sensitivity::DEFAULT_SECTOR_BETA,
            "correlation": stress_core::sensitivity::DEFAULT_CORRELATION,
        },
    }))
}
