use std::process;

use clap::Parser;
use lockbench::bench::Harness;
use lockbench::cli::{CliArgs, Command, HistoryArgs};
use lockbench::config::persistence::ResultsStorage;
use lockbench::config::HarnessConfig;
use lockbench::models::TimingSample;
use lockbench::probe::{ExecutionGate, LockProbe};
use lockbench::{error, server, telemetry, LockBenchError, Result};
use tracing::{dispatcher, info};

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        if dispatcher::has_been_set() {
            tracing::error!(error = %err, "lockbench failed");
        }
        eprintln!("{}", error::user_friendly_message(&err));
        process::exit(1);
    }
}

async fn run() -> Result<()> {
    let args = CliArgs::parse();
    let config = args.resolve_config()?;
    telemetry::init(&config.logging)?;

    match args.command {
        Command::Probe => {
            let probe = ExecutionGate::new(config.mode);
            println!(
                "global lock active: {} ({})",
                probe.global_lock_active(),
                probe.mode()
            );
            Ok(())
        }
        Command::Sum(_) => run_workloads(config, |h| Ok(vec![h.run_summation()?])).await,
        Command::Cpu(_) => run_workloads(config, Harness::run_cpu).await,
        Command::Io(_) => run_workloads(config, Harness::run_io).await,
        Command::All => run_workloads(config, Harness::run_all).await,
        Command::Serve(_) => run_serve(config).await,
        Command::History(history) => show_history(history),
    }
}

async fn run_workloads<F>(config: HarnessConfig, workload: F) -> Result<()>
where
    F: FnOnce(&Harness) -> Result<Vec<TimingSample>> + Send + 'static,
{
    let record = config.record;
    let harness = Harness::new(config)?.with_progress(true);
    info!(mode = %harness.mode(), "starting workloads");

    let samples = tokio::task::spawn_blocking(move || workload(&harness))
        .await
        .map_err(|e| LockBenchError::Worker(format!("workload thread failed: {}", e)))??;

    for sample in &samples {
        println!("{}", sample.summary());
    }

    if record {
        let storage = ResultsStorage::new()?;
        storage.append(&samples)?;
        info!(path = %storage.path().display(), count = samples.len(), "samples recorded");
    }
    Ok(())
}

async fn run_serve(config: HarnessConfig) -> Result<()> {
    let harness = Harness::new(config)?;
    let shutdown = server::shutdown_on(tokio::signal::ctrl_c());
    server::serve(harness.config(), harness.gate(), shutdown).await
}

fn show_history(args: HistoryArgs) -> Result<()> {
    let storage = ResultsStorage::new()?;
    if args.clear {
        storage.clear()?;
        println!("cleared {}", storage.path().display());
        return Ok(());
    }

    let samples = storage.recent(args.limit)?;
    if samples.is_empty() {
        println!("no recorded samples");
    }
    for sample in samples {
        println!(
            "{} {}",
            sample.timestamp.format("%Y-%m-%d %H:%M:%S UTC"),
            sample.summary()
        );
    }
    Ok(())
}
