use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::json;

use route_planner::config::ServiceConfig;
use route_planner::error::Error;
use route_planner::engine::{
    HttpSolverConfig, HttpSolverEngine, RouteSolvingEngine, UnavailableEngine,
};
use route_planner::logging::{LoggingConfig, init_logging};
use route_planner::model::OptimizeRequest;
use route_planner::strategy::{FirstSolutionStrategy, LocalSearchStrategy, Strategy};
use route_planner::RoutePlanner;

#[derive(Parser, Debug)]
#[command(author, version, about = "Single-depot route optimization")]
struct Cli {
    /// Route solving engine base URL (overrides ROUTE_PLANNER_SOLVER_URL).
    #[arg(long, global = true)]
    solver_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Optimize a route from an OptimizeRequest JSON document.
    Optimize {
        /// Request file, or `-` for stdin.
        #[arg(long, short, default_value = "-")]
        input: PathBuf,
        /// Pretty-print the response.
        #[arg(long)]
        pretty: bool,
    },
    /// List the accepted strategy names.
    Strategies,
    /// Check whether the route solving engine is reachable.
    Health,
}

fn main() -> Result<ExitCode> {
    init_logging(&LoggingConfig::from_env());
    let cli = Cli::parse();

    match cli.command {
        Command::Strategies => {
            print_strategies();
            Ok(ExitCode::SUCCESS)
        }
        Command::Health => handle_health(cli.solver_url),
        Command::Optimize { input, pretty } => handle_optimize(cli.solver_url, &input, pretty),
    }
}

fn handle_optimize(solver_url: Option<String>, input: &Path, pretty: bool) -> Result<ExitCode> {
    let config = config_or_fallback(ServiceConfig::global());
    let request = read_request(input)?;
    let engine = build_engine(solver_url, config)?;

    let planner = match config {
        Some(config) => RoutePlanner::new(engine, config),
        None => RoutePlanner::without_config(engine),
    };
    let (body, code) = match planner.optimize(&request) {
        Ok(response) => (serde_json::to_value(&response)?, ExitCode::SUCCESS),
        Err(err) => (
            json!({
                "status": "error",
                "category": err.category().as_str(),
                "http_status": err.http_status(),
                "detail": err.to_string(),
            }),
            ExitCode::FAILURE,
        ),
    };

    let rendered = if pretty {
        serde_json::to_string_pretty(&body)?
    } else {
        serde_json::to_string(&body)?
    };
    println!("{rendered}");
    Ok(code)
}

fn handle_health(solver_url: Option<String>) -> Result<ExitCode> {
    let config = ServiceConfig::global().context("failed to load service configuration")?;
    let engine = build_engine(solver_url, Some(config))?;
    if engine.is_available() {
        println!("route solving engine: available");
        Ok(ExitCode::SUCCESS)
    } else {
        println!("route solving engine: unavailable");
        Ok(ExitCode::FAILURE)
    }
}

/// Optimization keeps serving with built-in defaults when configuration is broken.
fn config_or_fallback(
    loaded: route_planner::Result<&ServiceConfig>,
) -> Option<&ServiceConfig> {
    match loaded {
        Ok(config) => Some(config),
        Err(Error::Config { key, message }) => {
            tracing::error!(key = %key, error = %message, "invalid service configuration, using built-in defaults");
            None
        }
        Err(err) => {
            tracing::error!(error = %err, "failed to load service configuration, using built-in defaults");
            None
        }
    }
}

fn build_engine(
    solver_url: Option<String>,
    config: Option<&ServiceConfig>,
) -> Result<Box<dyn RouteSolvingEngine>> {
    match solver_url.or_else(|| config.and_then(|c| c.solver_url.clone())) {
        Some(url) => {
            let engine = HttpSolverEngine::new(HttpSolverConfig::new(url.as_str()))
                .with_context(|| format!("failed to create solver client for {url}"))?;
            Ok(Box::new(engine))
        }
        None => {
            tracing::warn!("no solver URL configured, optimization requests with more than one stop will fail");
            Ok(Box::new(UnavailableEngine))
        }
    }
}

fn read_request(input: &Path) -> Result<OptimizeRequest> {
    let raw = if input.as_os_str() == "-" {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .context("failed to read request from stdin")?;
        buffer
    } else {
        fs::read_to_string(input)
            .with_context(|| format!("failed to read request from {}", input.display()))?
    };
    serde_json::from_str(&raw).context("request is not a valid OptimizeRequest document")
}

fn print_strategies() {
    println!("First solution strategies:");
    for strategy in FirstSolutionStrategy::ALL {
        println!("- {}", strategy.name());
    }
    println!("Local search strategies:");
    for strategy in LocalSearchStrategy::ALL {
        println!("- {}", strategy.name());
    }
}
