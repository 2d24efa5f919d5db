//! Debt plan command-line interface
//!
//! Reads an `OptimizationRequest` as JSON, runs the optimizer and writes the
//! result as JSON to stdout. Logs go to stderr (`RUST_LOG`, default `info`).

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use debt_optimizer_core::{
    DebtOptimizer, OpenAiClient, OptimizationRequest, OptimizerConfig, ScenarioAdjustments,
    StrategyPreference,
};
use serde::Serialize;
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::prelude::*;

#[derive(Parser, Debug)]
#[command(name = "debt-plan", version, about = "Compute a month-by-month debt repayment plan")]
struct Cli {
    /// Optimizer config file (JSON); defaults apply when omitted
    #[arg(short = 'c', long = "config", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Optimize a repayment plan
    Plan {
        /// Request file (default: stdin)
        #[arg(short = 'i', long = "input")]
        input: Option<PathBuf>,

        /// Override the request's strategy (avalanche, snowball, auto)
        #[arg(short = 's', long = "strategy")]
        strategy: Option<StrategyPreference>,

        /// Never call the language model
        #[arg(long = "offline")]
        offline: bool,
    },

    /// Compare the request with a what-if variant (never calls the model)
    Scenario {
        /// Request file (default: stdin)
        #[arg(short = 'i', long = "input")]
        input: Option<PathBuf>,

        /// Adjustments file (JSON)
        #[arg(short = 'a', long = "adjustments")]
        adjustments: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Command::Plan {
            input,
            strategy,
            offline,
        } => {
            let mut request = read_request(input.as_deref())?;
            if let Some(strategy) = strategy {
                request.strategy = strategy;
            }

            let optimizer = build_optimizer(config, offline);
            let result = optimizer
                .optimize(&request)
                .await
                .context("Optimization failed")?;

            tracing::info!(
                strategy = %result.strategy,
                total_months = result.total_months,
                source = ?result.source,
                "plan computed"
            );
            write_json(&result)
        }
        Command::Scenario { input, adjustments } => {
            let request = read_request(input.as_deref())?;
            let text = read_text(Some(adjustments.as_path()))?;
            let adjustments: ScenarioAdjustments =
                serde_json::from_str(&text).context("Invalid adjustments JSON")?;

            let comparison = DebtOptimizer::new(config)
                .simulate_scenario(&request, &adjustments)
                .context("Scenario simulation failed")?;
            write_json(&comparison)
        }
    }
}

fn build_optimizer(config: OptimizerConfig, offline: bool) -> DebtOptimizer {
    let optimizer = DebtOptimizer::new(config);
    if offline {
        return optimizer;
    }

    match OpenAiClient::from_env() {
        Ok(client) => optimizer.with_model(Arc::new(client)),
        Err(err) => {
            tracing::warn!(%err, "language model unavailable, running deterministic only");
            optimizer
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<OptimizerConfig> {
    let Some(path) = path else {
        return Ok(OptimizerConfig::default());
    };
    let text = read_text(Some(path))?;
    serde_json::from_str(&text)
        .with_context(|| format!("Invalid config file {}", path.display()))
}

fn read_request(path: Option<&Path>) -> Result<OptimizationRequest> {
    let text = read_text(path)?;
    serde_json::from_str(&text).context("Invalid request JSON")
}

fn read_text(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display())),
        None => {
            let mut text = String::new();
            io::stdin()
                .read_to_string(&mut text)
                .context("Failed to read stdin")?;
            Ok(text)
        }
    }
}

fn write_json<T: Serialize>(value: &T) -> Result<()> {
    let mut stdout = io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, value).context("Failed to write JSON")?;
    writeln!(stdout)?;
    Ok(())
}
