//! uis-sdg-etl: UIS SDG education bulk export → DDF
//!
//! Turns the denormalized SDG bulk export (national and regional observations
//! plus label and country reference tables) into a DDF dataset: entity files,
//! concept files, and one datapoint file per indicator and scope.
//!
//! # Pipeline
//!
//! 1. **Gate** (`check`): compare the upstream "last updated" date with the
//!    configured baseline. A newer upstream release stops the run before any
//!    file is read.
//! 2. **Load**: read every raw table. Missing tables or columns abort here.
//! 3. **Transform**: build entities and concepts, group observations per
//!    indicator, keep only indicators that have a measure concept.
//! 4. **Write**: entities, concepts, and datapoints are written
//!    unconditionally; supplementary datapoints only where no file exists.
//!
//! # Examples
//!
//! ```bash
//! # Check upstream before refreshing the source archive
//! uis-sdg-etl check --versions versions.json
//!
//! # Full run with etl.toml in the current directory
//! uis-sdg-etl run --versions versions.json
//!
//! # Explicit paths, machine-readable summary
//! uis-sdg-etl run --source source/SDG --output . --format json
//! ```
//!
//! # Crate Structure
//!
//! - [`core`]: ids, tables, sources, sinks, config, output rendering
//! - [`plugins`]: entity, concept, observation, gatekeeper, supplementary, and version-gate stages
//! - [`pipeline`]: load → transform → write

pub mod core;
pub mod pipeline;
pub mod plugins;

use crate::core::{
    config::EtlConfig,
    error::EtlError,
    output,
    sink::CsvDirSink,
    source::DirSource,
    time::{self, Envelope},
};
use crate::plugins::version_gate::{self, GateDecision};

use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[clap(
    name = "uis-sdg-etl",
    version = env!("CARGO_PKG_VERSION"),
    about = "UIS SDG education bulk export to DDF"
)]
struct Cli {
    /// Log at debug level (overridden by RUST_LOG).
    #[clap(short, long, global = true)]
    verbose: bool,
    #[clap(subcommand)]
    command: Command,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Format {
    Text,
    Json,
}

#[derive(clap::Args, Debug)]
struct GateArgs {
    /// Versions document fetched from the upstream API.
    #[clap(long)]
    versions: Option<PathBuf>,
    /// Baseline "last update" date (overrides config).
    #[clap(long)]
    baseline: Option<String>,
    /// Theme to read from the versions document (overrides config).
    #[clap(long)]
    theme: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compare upstream version with the recorded baseline
    Check {
        /// Path to etl.toml (defaults to ./etl.toml when present).
        #[clap(long)]
        config: Option<PathBuf>,
        #[clap(flatten)]
        gate: GateArgs,
        #[clap(long, value_enum, default_value = "text")]
        format: Format,
    },

    /// Gate, then build the DDF dataset
    Run {
        /// Path to etl.toml (defaults to ./etl.toml when present).
        #[clap(long)]
        config: Option<PathBuf>,
        /// Extracted archive directory (overrides config).
        #[clap(long)]
        source: Option<PathBuf>,
        /// Output directory (overrides config).
        #[clap(long)]
        output: Option<PathBuf>,
        /// Region label for the world aggregate (overrides config).
        #[clap(long)]
        world_region: Option<String>,
        #[clap(flatten)]
        gate: GateArgs,
        #[clap(long, value_enum, default_value = "text")]
        format: Format,
    },
}

fn init_logging(verbose: bool) {
    let default = if verbose { "uis_sdg_etl=debug" } else { "uis_sdg_etl=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn apply_gate_args(config: &mut EtlConfig, gate: &GateArgs) {
    if let Some(b) = &gate.baseline {
        config.last_update = b.clone();
    }
    if let Some(t) = &gate.theme {
        config.theme = t.clone();
    }
}

fn evaluate_gate(versions: &Path, config: &EtlConfig) -> Result<GateDecision, EtlError> {
    let document = fs::read_to_string(versions)?;
    version_gate::evaluate(&document, &config.theme, &config.last_update)
}

fn print_decision(
    envelope: Envelope<'_>,
    decision: &GateDecision,
    format: Format,
) -> Result<(), EtlError> {
    match format {
        Format::Text => println!("{}", output::render_decision(decision)),
        Format::Json => {
            let status = if decision.is_blocked() { "blocked" } else { "ok" };
            let body = Envelope { status, ..envelope }.wrap(serde_json::to_value(decision)?);
            println!("{}", serde_json::to_string_pretty(&body)?);
        }
    }
    Ok(())
}

pub fn run() -> Result<(), EtlError> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Check {
            config,
            gate,
            format,
        } => {
            let mut cfg = EtlConfig::discover(config.as_deref())?;
            apply_gate_args(&mut cfg, &gate);
            let versions = gate.versions.ok_or_else(|| {
                EtlError::ConfigError("check requires --versions <file>".to_string())
            })?;
            let run_id = time::new_run_id();
            let decision = evaluate_gate(&versions, &cfg)?;
            let envelope = Envelope {
                cmd: "check",
                status: "ok",
                run_id: &run_id,
                config: cfg.origin.as_deref(),
            };
            print_decision(envelope, &decision, format)?;
        }
        Command::Run {
            config,
            source: source_dir,
            output: output_dir,
            world_region,
            gate,
            format,
        } => {
            let mut cfg = EtlConfig::discover(config.as_deref())?;
            apply_gate_args(&mut cfg, &gate);
            if let Some(s) = source_dir {
                cfg.source_dir = s;
            }
            if let Some(o) = output_dir {
                cfg.output_dir = o;
            }
            if let Some(w) = world_region {
                cfg.world_region = w;
            }

            let run_id = time::new_run_id();
            let _span = tracing::info_span!("run", %run_id).entered();
            let envelope = Envelope {
                cmd: "run",
                status: "ok",
                run_id: &run_id,
                config: cfg.origin.as_deref(),
            };

            if let Some(versions) = &gate.versions {
                let decision = evaluate_gate(versions, &cfg)?;
                if decision.is_blocked() {
                    print_decision(envelope, &decision, format)?;
                    return Ok(());
                }
            }

            tracing::info!(
                source = %cfg.source_dir.display(),
                output = %cfg.output_dir.display(),
                "starting run"
            );
            let source = DirSource::new(&cfg.source_dir);
            let mut sink = CsvDirSink::new(&cfg.output_dir);
            let report = pipeline::run_pipeline(&source, &mut sink, &cfg)?;

            match format {
                Format::Text => println!("{}", output::render_report(&report)),
                Format::Json => {
                    let body = envelope.wrap(serde_json::to_value(&report)?);
                    println!("{}", serde_json::to_string_pretty(&body)?);
                }
            }
        }
    }
    Ok(())
}
