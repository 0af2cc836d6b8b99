// SPDX-License-Identifier: MIT OR Apache-2.0
//! `portline_inspect` - headless host for the portline graph engine.
//!
//! Loads a scenario (or the built-in one), evaluates its connection
//! attempts, and prints resolved port positions, connection curves and
//! decisions.
//!
//! ```text
//! portline_inspect [SCENARIO.ron] [--json]
//! ```

mod report;
mod scenario;

use clap::Parser;
use report::Report;
use scenario::{InspectError, Scenario};
use std::path::PathBuf;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Resolve a node graph scenario and report layout, curves and connection decisions
#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Cli {
    /// Scenario file (RON); the built-in dataflow scenario when omitted
    scenario: Option<PathBuf>,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,
}

fn run(cli: &Cli) -> Result<(), InspectError> {
    let scenario = match &cli.scenario {
        Some(path) => Scenario::load(path)?,
        None => {
            tracing::info!("No scenario given, using the built-in dataflow scenario");
            Scenario::builtin()
        }
    };

    let report = Report::run(&scenario)?;
    if cli.json {
        println!("{}", report.to_json()?);
    } else {
        print!("{report}");
    }
    Ok(())
}

fn main() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("portline_inspect=info,portline_graph=warn"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(&cli) {
        tracing::error!("{e}");
        std::process::exit(1);
    }
}
