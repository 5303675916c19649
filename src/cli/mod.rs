//! forest-tracker CLI Module
//!
//! Command-line interface for training runs and experiment inspection.

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use colored::*;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::error::{ForestError, Result};
use crate::orchestration::{FileNotifier, FlowRunner, LogNotifier, Notifier};
use crate::tracking::{ExperimentTracker, RunStatus, TrackingConfig};
use crate::training::{MetricReport, ModelConfig, TrainingRoutine, RMSE_METRIC};
use crate::utils::{DataLoader, TRAIN_SPLIT, VALIDATION_SPLIT};

// ─── Styling helpers ───────────────────────────────────────────────────────────

fn dim(s: &str) -> ColoredString { s.truecolor(100, 100, 100) }
fn muted(s: &str) -> ColoredString { s.truecolor(140, 140, 140) }
fn ok(s: &str) -> ColoredString { s.truecolor(100, 210, 120) }

fn section(title: &str) {
    println!();
    println!("  {}", title.white().bold());
    println!("  {}", dim(&"─".repeat(56)));
}

fn kv(key: &str, val: &str) {
    println!("  {:<16} {}", muted(key), val.white());
}

fn step_ok(msg: &str) {
    println!("  {} {}", ok("✓"), msg);
}

// ─── CLI definition ────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "forest-tracker")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Train a seeded random forest and track the run")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fit on the train split, score RMSE on the val split, record the run
    Train(TrainArgs),

    /// List the runs of an experiment
    Runs(TrackingArgs),

    /// Show the shape of the splits in a data directory
    Info {
        /// Directory holding train.{bin,json} and val.{bin,json}
        #[arg(long, env = "FOREST_TRACKER_DATA_PATH", default_value = "./output")]
        data_path: PathBuf,
    },
}

#[derive(Args, Debug, Clone)]
pub struct TrackingArgs {
    /// Directory of the experiment store
    #[arg(long, env = "FOREST_TRACKER_TRACKING_DIR", default_value = "./mlruns")]
    pub tracking_dir: PathBuf,

    /// Experiment name
    #[arg(long, env = "FOREST_TRACKER_EXPERIMENT", default_value = "taxi-experiment")]
    pub experiment: String,
}

#[derive(Args, Debug, Clone)]
pub struct TrainArgs {
    /// Directory holding train.{bin,json} and val.{bin,json}
    #[arg(long, env = "FOREST_TRACKER_DATA_PATH", default_value = "./output")]
    pub data_path: PathBuf,

    /// Maximum tree depth (must be > 0)
    #[arg(long, env = "FOREST_TRACKER_MAX_DEPTH", default_value_t = 10, allow_negative_numbers = true)]
    pub max_depth: i64,

    /// Seed for bootstrap sampling
    #[arg(long, env = "FOREST_TRACKER_RANDOM_STATE", default_value_t = 0, allow_negative_numbers = true)]
    pub random_state: i64,

    /// Number of trees
    #[arg(long, env = "FOREST_TRACKER_N_ESTIMATORS", default_value_t = 100)]
    pub n_estimators: usize,

    #[command(flatten)]
    pub tracking: TrackingArgs,

    /// Retries after a failed attempt
    #[arg(long, env = "FOREST_TRACKER_RETRIES", default_value_t = 0)]
    pub retries: u32,

    /// Append failure notices to this file instead of the log
    #[arg(long, env = "FOREST_TRACKER_NOTIFY_FILE")]
    pub notify_file: Option<PathBuf>,
}

// ─── Commands ──────────────────────────────────────────────────────────────────

/// Train once under a flow run, recording params and RMSE in the tracker
pub fn cmd_train(args: &TrainArgs) -> anyhow::Result<MetricReport> {
    section("Train");

    let notifier: Box<dyn Notifier + Send + Sync> = match &args.notify_file {
        Some(path) => Box::new(FileNotifier::new(path)),
        None => Box::new(LogNotifier),
    };
    let runner = FlowRunner::new("train", notifier).with_retries(args.retries);

    let config = ModelConfig::new(args.max_depth, args.random_state).with_n_estimators(args.n_estimators);
    let routine = TrainingRoutine::new();
    let start = Instant::now();

    // Opened inside the flow so store failures reach the notifier
    let mut tracker: Option<ExperimentTracker> = None;

    let report = runner.run(|ctx| {
        if tracker.is_none() {
            tracker = Some(open_tracker(&args.tracking)?);
        }
        let tracker = tracker
            .as_ref()
            .ok_or_else(|| ForestError::TrackingError("experiment store not open".to_string()))?;

        tracker.start_run(&ctx.flow_run_name)?;
        tracker.log_tag("attempt", ctx.attempt.to_string())?;

        let outcome = routine
            .run(&args.data_path, config)
            .and_then(|report| report.report_to(tracker).map(|_| report));

        let status = if outcome.is_ok() { RunStatus::Finished } else { RunStatus::Failed };
        match tracker.end_run(status) {
            Ok(run) => step_ok(&format!("run {} {:?}", run.run_id, status).to_lowercase()),
            Err(e) if outcome.is_err() => {
                tracing::warn!(error = %e, "Could not close failed run");
            }
            Err(e) => return Err(e),
        }

        outcome
    })?;

    println!();
    kv("Experiment", &args.tracking.experiment);
    kv("max_depth", &report.config.max_depth().to_string());
    kv("random_state", &report.config.random_state().to_string());
    kv("n_estimators", &report.config.n_estimators().to_string());
    println!("  {:<16} {}", muted("RMSE"), format!("{:.4}", report.value).white().bold());
    kv("Time", &format!("{:.3}s", start.elapsed().as_secs_f64()));
    println!();

    Ok(report)
}

fn open_tracker(args: &TrackingArgs) -> Result<ExperimentTracker> {
    let tracker = ExperimentTracker::new(TrackingConfig::new(&args.tracking_dir, &args.experiment))?;
    tracker.set_experiment(&args.experiment)?;
    Ok(tracker)
}

/// Print every run of an experiment, marking the lowest RMSE
pub fn cmd_runs(args: &TrackingArgs) -> anyhow::Result<()> {
    section("Runs");

    let tracker = ExperimentTracker::new(TrackingConfig::new(&args.tracking_dir, &args.experiment))
        .context("opening experiment store")?;

    let Some(experiment) = tracker.get_experiment_by_name(&args.experiment) else {
        println!("  {}", format!("no experiment named '{}'", args.experiment).yellow());
        println!();
        return Ok(());
    };

    let best_id = experiment.best_run(RMSE_METRIC, false).map(|r| r.run_id.clone());

    for run in &experiment.runs {
        let marker = if Some(&run.run_id) == best_id.as_ref() { ok("★") } else { dim(" ") };
        let status = match run.status {
            RunStatus::Finished => "finished".green(),
            RunStatus::Failed => "failed".red(),
            RunStatus::Running => "running".yellow(),
            RunStatus::Killed => "killed".red(),
        };
        let rmse = run
            .metrics
            .get(RMSE_METRIC)
            .map(|v| format!("{:.4}", v))
            .unwrap_or_else(|| "-".to_string());
        let params: Vec<String> = run.params.iter().map(|(k, v)| format!("{}={}", k, v)).collect();

        println!(
            "  {} {:<24} {:<10} {:>10} {:>8}  {}",
            marker,
            run.run_name,
            status,
            rmse,
            format!("{:.2}s", run.duration_secs()),
            dim(&params.join(" "))
        );
    }

    println!();
    kv("Runs", &experiment.runs.len().to_string());
    println!();

    Ok(())
}

/// Print sample and feature counts of both splits
pub fn cmd_info(data_path: &Path) -> anyhow::Result<()> {
    section("Info");

    let loader = DataLoader::new();
    for stem in [TRAIN_SPLIT, VALIDATION_SPLIT] {
        let path = loader.resolve_split(data_path, stem)?;
        let dataset = loader.load_file(&path)?;
        kv(
            stem,
            &format!(
                "{} rows × {} features  {}",
                dataset.n_samples(),
                dataset.n_features(),
                path.display()
            ),
        );
    }
    println!();

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use std::ffi::OsStr;

    #[test]
    fn test_train_options_read_from_env() {
        let cmd = Cli::command();
        let train = cmd.find_subcommand("train").unwrap();

        for (id, var) in [
            ("max_depth", "FOREST_TRACKER_MAX_DEPTH"),
            ("random_state", "FOREST_TRACKER_RANDOM_STATE"),
            ("n_estimators", "FOREST_TRACKER_N_ESTIMATORS"),
            ("data_path", "FOREST_TRACKER_DATA_PATH"),
            ("retries", "FOREST_TRACKER_RETRIES"),
        ] {
            let arg = train.get_arguments().find(|a| a.get_id() == id).unwrap();
            assert_eq!(arg.get_env(), Some(OsStr::new(var)), "{id}");
        }
    }

    #[test]
    fn test_parse_train_defaults() {
        let cli = Cli::try_parse_from(["forest-tracker", "train"]).unwrap();
        match cli.command {
            Commands::Train(args) => {
                assert_eq!(args.max_depth, 10);
                assert_eq!(args.random_state, 0);
                assert_eq!(args.n_estimators, 100);
                assert_eq!(args.data_path, PathBuf::from("./output"));
                assert_eq!(args.tracking.experiment, "taxi-experiment");
            }
            _ => panic!("expected train"),
        }
    }

    #[test]
    fn test_parse_negative_depth() {
        let cli = Cli::try_parse_from(["forest-tracker", "train", "--max-depth", "-1"]).unwrap();
        match cli.command {
            Commands::Train(args) => assert_eq!(args.max_depth, -1),
            _ => panic!("expected train"),
        }
    }
}
