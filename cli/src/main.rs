//! `acc-eval` CLI: filter highD tracks, re-simulate challenging events, run scenarios.

use acc_core::metrics::EvaluationMetrics;
use acc_core::pipeline::{EvaluationConfig, EvaluationPipeline};
use acc_core::simulator::LeadMotion;
use acc_core::types::{SafetyVerdict, TrajectoryRecord};
use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use highd::scenarios::{Scenario, ScenarioKind};
use highd::{collect_track_files, jsonl, read_tracks};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Parser)]
#[command(name = "acc-eval", about = "Challenging-scenario filter and ACC re-simulation")]
struct Cli {
    /// JSON config with `classifier`, `acc` and `controller` sections
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Override how the lead vehicle moves during re-simulation
    #[arg(long, global = true, value_enum)]
    lead_motion: Option<LeadMotionArg>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum LeadMotionArg {
    Held,
    ConstantVelocity,
}

impl From<LeadMotionArg> for LeadMotion {
    fn from(arg: LeadMotionArg) -> Self {
        match arg {
            LeadMotionArg::Held => LeadMotion::Held,
            LeadMotionArg::ConstantVelocity => LeadMotion::ConstantVelocity,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Classify highD track files and keep the challenging records.
    Filter {
        /// `*_tracks.csv` files or directories containing them
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
        /// Challenging records as JSON lines
        #[arg(long)]
        output: PathBuf,
    },
    /// Re-simulate records under the ACC law.
    Simulate {
        /// Records as JSON lines (e.g. the output of `filter`)
        input: PathBuf,
        /// Verdicts as JSON lines
        #[arg(long)]
        output: PathBuf,
        /// Output metrics to a JSON file
        #[arg(long)]
        metrics: Option<PathBuf>,
    },
    /// Filter track files, then re-simulate the challenging records.
    Run {
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
        /// Verdicts as JSON lines
        #[arg(long)]
        output: PathBuf,
        /// Also save the challenging records
        #[arg(long)]
        challenging: Option<PathBuf>,
        /// Output metrics to a JSON file
        #[arg(long)]
        metrics: Option<PathBuf>,
    },
    /// Run a named synthetic scenario.
    Scenario {
        #[arg(value_enum)]
        scenario: ScenarioKind,
        /// Random seed for reproducibility
        #[arg(long, default_value_t = 42)]
        seed: u64,
        /// Verdicts as JSON lines
        #[arg(long)]
        output: Option<PathBuf>,
        /// Output metrics to a JSON file
        #[arg(long)]
        metrics: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => jsonl::load_config(path)?,
        None => EvaluationConfig::default(),
    };
    if let Some(motion) = cli.lead_motion {
        config.acc.lead_motion = motion.into();
    }
    let pipeline = EvaluationPipeline::new(config)?;

    match cli.command {
        Commands::Filter { inputs, output } => {
            let (challenging, metrics) = filter_tracks(&pipeline, &inputs)?;
            jsonl::save_records(&challenging, &output)?;
            println!(
                "Filter done: {} records, {} without lead, {} challenging, {} failures",
                metrics.n_records, metrics.n_no_lead, metrics.n_challenging, metrics.n_failures
            );
            println!("Challenging records saved to {}", output.display());
        }
        Commands::Simulate {
            input,
            output,
            metrics: metrics_path,
        } => {
            let records = jsonl::load_records(&input)?;
            info!(records = records.len(), input = %input.display(), "loaded records");
            let mut metrics = EvaluationMetrics::default();
            let verdicts = simulate(&pipeline, &records, &mut metrics);
            finish(&verdicts, &metrics, &output, metrics_path.as_deref())?;
        }
        Commands::Run {
            inputs,
            output,
            challenging: challenging_path,
            metrics: metrics_path,
        } => {
            let (challenging, mut metrics) = filter_tracks(&pipeline, &inputs)?;
            if let Some(path) = &challenging_path {
                jsonl::save_records(&challenging, path)?;
                println!("Challenging records saved to {}", path.display());
            }
            let verdicts = simulate(&pipeline, &challenging, &mut metrics);
            finish(&verdicts, &metrics, &output, metrics_path.as_deref())?;
        }
        Commands::Scenario {
            scenario,
            seed,
            output,
            metrics: metrics_path,
        } => {
            let scenario = Scenario::build(scenario, seed);
            println!(
                "Running scenario '{}' (seed={}, {} records)...",
                scenario.name,
                seed,
                scenario.records.len()
            );
            let out = pipeline.run(&scenario.records);
            print_summary(&out.metrics);
            if let Some(path) = output {
                jsonl::save_verdicts(&out.simulation.verdicts, &path)?;
                println!("Verdicts saved to {}", path.display());
            }
            if let Some(path) = metrics_path {
                write_metrics(&out.metrics, &path)?;
            }
        }
    }

    Ok(())
}

/// Classify every input file, one file at a time.
fn filter_tracks(
    pipeline: &EvaluationPipeline,
    inputs: &[PathBuf],
) -> Result<(Vec<TrajectoryRecord>, EvaluationMetrics)> {
    let files = collect_track_files(inputs)?;
    anyhow::ensure!(!files.is_empty(), "no track files found");

    let mut challenging = Vec::new();
    let mut metrics = EvaluationMetrics::default();
    for path in &files {
        let tracks = read_tracks(path)?;
        let out = pipeline.filter(&tracks.records);
        info!(
            path = %path.display(),
            records = out.n_records,
            rejected_lines = tracks.rejected.len(),
            challenging = out.challenging.len(),
            "filtered track file"
        );
        metrics.accumulate_filter(
            out.n_records + tracks.rejected.len(),
            out.n_no_lead,
            out.challenging.len(),
            out.failures.len() + tracks.rejected.len(),
        );
        challenging.extend(out.challenging);
    }
    Ok((challenging, metrics))
}

fn simulate(
    pipeline: &EvaluationPipeline,
    records: &[TrajectoryRecord],
    metrics: &mut EvaluationMetrics,
) -> Vec<SafetyVerdict> {
    let start = std::time::Instant::now();
    let out = pipeline.simulate(records);
    metrics.accumulate_verdicts(&out.verdicts, out.failures.len());
    info!(
        verdicts = out.verdicts.len(),
        failures = out.failures.len(),
        elapsed_s = start.elapsed().as_secs_f64(),
        "simulation done"
    );
    out.verdicts
}

fn finish(
    verdicts: &[SafetyVerdict],
    metrics: &EvaluationMetrics,
    output: &Path,
    metrics_path: Option<&Path>,
) -> Result<()> {
    jsonl::save_verdicts(verdicts, output)?;
    print_summary(metrics);
    println!("Verdicts saved to {}", output.display());
    if let Some(path) = metrics_path {
        write_metrics(metrics, path)?;
    }
    Ok(())
}

fn print_summary(metrics: &EvaluationMetrics) {
    println!(
        "Simulated {} events: {} collisions avoided ({:.1}%), {} failures",
        metrics.n_simulated,
        metrics.n_collisions_avoided,
        100.0 * metrics.avoidance_rate(),
        metrics.n_failures,
    );
    if let Some(ttc) = metrics.min_ttc {
        println!(
            "Min TTC {:.2}s, mean of closing events {:.2}s",
            ttc,
            metrics.mean_min_ttc().unwrap_or(ttc)
        );
    }
}

fn write_metrics(metrics: &EvaluationMetrics, path: &Path) -> Result<()> {
    let json = serde_json::json!({
        "metrics": metrics,
        "avoidance_rate": metrics.avoidance_rate(),
        "mean_min_ttc": metrics.mean_min_ttc(),
    });
    std::fs::write(path, serde_json::to_string_pretty(&json)?)?;
    println!("Metrics saved to {}", path.display());
    Ok(())
}
