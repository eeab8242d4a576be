use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use opentelemetry::KeyValue;
use rotorsim_config::{Profile, RotorsimConfig};
use rotorsim_engine::{InMemoryStore, RecordWriter, Scenario, SimulationRuntime};
use rotorsim_telemetry::EventLogger;
use tokio::sync::watch;
use tracing::{info, warn};

#[derive(Parser)]
#[command(version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Tick in real time at the configured interval until Ctrl-C
    Run(RunArgs),
    /// Run a fixed number of ticks back to back and print the state hash
    Simulate(SimulateArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ConfigArgs {
    /// Configuration file; defaults to config/rotorsim.yaml plus ROTORSIM_* overrides
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// Deployment profile (baseline, noisy-drift, high-rate)
    #[arg(short, long)]
    pub profile: Option<Profile>,
    /// Noise seed; overrides the configured one
    #[arg(long)]
    pub seed: Option<u64>,
    /// Append every tick record to this JSON-lines file
    #[arg(long)]
    pub record: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    #[command(flatten)]
    pub config: ConfigArgs,
}

#[derive(Args, Debug, Clone)]
pub struct SimulateArgs {
    #[command(flatten)]
    pub config: ConfigArgs,
    /// Number of ticks; defaults to the scenario's length
    #[arg(short, long)]
    pub ticks: Option<u64>,
    /// Scenario of scripted client writes to replay
    #[arg(short, long)]
    pub scenario: Option<PathBuf>,
    /// Expected state hash; a mismatch fails the run and writes a bug report
    #[arg(long)]
    pub validate_hash: Option<String>,
}

pub async fn run(args: RunArgs) -> anyhow::Result<()> {
    let config = load_config(&args.config, None)?;
    EventLogger::init(&config.telemetry)?;

    let mut runtime = build_runtime(config, args.config.record.as_deref())?;
    EventLogger::log_event(
        "run_started",
        vec![
            KeyValue::new("profile", runtime.config().simulator.profile.to_string()),
            KeyValue::new("seed", runtime.seed().to_string()),
        ],
    )
    .await;

    let (tx, rx) = watch::channel(false);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                let _ = tx.send(true);
            }
            Err(e) => {
                warn!("Cannot listen for Ctrl-C: {e}");
                std::future::pending::<()>().await;
            }
        }
    });

    let summary = runtime.run_realtime(rx).await?;
    info!(
        ticks = summary.ticks,
        alarm_transitions = summary.alarm_transitions,
        write_failures = summary.write_failures,
        "Simulator stopped"
    );
    Ok(())
}

pub async fn simulate(args: SimulateArgs) -> anyhow::Result<()> {
    let scenario = args
        .scenario
        .as_deref()
        .map(Scenario::load_from_file)
        .transpose()
        .context("Failed to load scenario")?;

    let Some(ticks) = args.ticks.or(scenario.as_ref().map(|s| s.ticks)) else {
        bail!("--ticks is required when no scenario is given");
    };

    let scenario_seed = scenario.as_ref().and_then(|s| s.seed);
    let config = load_config(&args.config, scenario_seed)?;
    EventLogger::init(&config.telemetry)?;

    let mut runtime = build_runtime(config, args.config.record.as_deref())?;
    if let Some(path) = &args.scenario {
        info!("Replaying scenario from file: {}", path.display());
    }
    let summary = runtime.run_ticks(ticks, scenario.as_ref()).await?;
    println!("{}", summary.final_hash);

    let expected = args
        .validate_hash
        .or_else(|| scenario.and_then(|s| s.expected_hash));
    if let Some(expected) = expected {
        runtime.validate_hash(&expected, &summary)?;
    }
    Ok(())
}

/// Loads the layered configuration and applies the seed: `--seed` first,
/// then the scenario's, then whatever the configuration holds.
fn load_config(args: &ConfigArgs, scenario_seed: Option<u64>) -> anyhow::Result<RotorsimConfig> {
    let mut config = match &args.config {
        Some(path) => RotorsimConfig::load_from_path(path, args.profile),
        None => RotorsimConfig::load(args.profile),
    }
    .context("Failed to load configuration")?;

    if let Some(seed) = args.seed.or(scenario_seed) {
        config.simulator.seed = Some(seed);
    }
    Ok(config)
}

fn build_runtime(
    config: RotorsimConfig,
    record: Option<&Path>,
) -> anyhow::Result<SimulationRuntime> {
    let mut runtime = SimulationRuntime::new(config, Arc::new(InMemoryStore::new()))?;
    if let Some(path) = record {
        let writer = RecordWriter::create(path)
            .with_context(|| format!("Cannot create record file {}", path.display()))?;
        runtime = runtime.with_recorder(writer);
    }
    Ok(runtime)
}
