//! Experiment Tracker Implementation
//!
//! Track experiments, runs, parameters and metrics.

use crate::error::{ForestError, Result};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::storage::{LocalStorage, StorageBackend};
use super::TrackingSink;

/// Configuration for experiment tracking
#[derive(Debug, Clone)]
pub struct TrackingConfig {
    /// Output directory for experiments
    pub output_dir: PathBuf,
    /// Experiment selected when a run starts without one
    pub experiment_name: String,
    /// Enable metrics history
    pub enable_metrics_history: bool,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("./mlruns"),
            experiment_name: "default".to_string(),
            enable_metrics_history: true,
        }
    }
}

impl TrackingConfig {
    pub fn new(output_dir: impl Into<PathBuf>, experiment_name: impl Into<String>) -> Self {
        Self {
            output_dir: output_dir.into(),
            experiment_name: experiment_name.into(),
            ..Default::default()
        }
    }
}

/// A single metric value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metric {
    /// Metric name
    pub name: String,
    /// Metric value
    pub value: f64,
    /// Step/epoch number
    pub step: u64,
    /// Timestamp
    pub timestamp: DateTime<Utc>,
}

impl Metric {
    /// Create a new metric
    pub fn new(name: impl Into<String>, value: f64, step: u64) -> Self {
        Self {
            name: name.into(),
            value,
            step,
            timestamp: Utc::now(),
        }
    }
}

/// Status of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    /// Run is currently running
    Running,
    /// Run completed successfully
    Finished,
    /// Run failed
    Failed,
    /// Run was killed/stopped
    Killed,
}

/// A run within an experiment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Run {
    /// Run ID
    pub run_id: String,
    /// Run name
    pub run_name: String,
    /// Start time
    pub start_time: DateTime<Utc>,
    /// End time (None if still running)
    pub end_time: Option<DateTime<Utc>>,
    /// Parameters
    pub params: BTreeMap<String, String>,
    /// Latest metrics
    pub metrics: BTreeMap<String, f64>,
    /// Metrics history
    #[serde(default)]
    pub metrics_history: Vec<Metric>,
    /// Tags
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
    /// Status
    pub status: RunStatus,
}

impl Run {
    /// Create a new run
    pub fn new(run_name: impl Into<String>) -> Self {
        Self {
            run_id: Uuid::new_v4().simple().to_string(),
            run_name: run_name.into(),
            start_time: Utc::now(),
            end_time: None,
            params: BTreeMap::new(),
            metrics: BTreeMap::new(),
            metrics_history: Vec::new(),
            tags: BTreeMap::new(),
            status: RunStatus::Running,
        }
    }

    /// Get run duration in seconds
    pub fn duration_secs(&self) -> f64 {
        let end = self.end_time.unwrap_or_else(Utc::now);
        (end - self.start_time).num_milliseconds() as f64 / 1000.0
    }
}

/// An experiment containing multiple runs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Experiment {
    /// Experiment ID
    pub experiment_id: String,
    /// Experiment name
    pub name: String,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Runs in this experiment
    pub runs: Vec<Run>,
    /// Tags
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
}

impl Experiment {
    /// Create a new experiment
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            experiment_id: Uuid::new_v4().simple().to_string(),
            name: name.into(),
            created_at: Utc::now(),
            runs: Vec::new(),
            tags: BTreeMap::new(),
        }
    }

    /// Get the best finished run by a metric
    pub fn best_run(&self, metric_name: &str, maximize: bool) -> Option<&Run> {
        self.runs
            .iter()
            .filter(|r| r.status == RunStatus::Finished)
            .filter_map(|r| r.metrics.get(metric_name).map(|v| (r, *v)))
            .filter(|(_, v)| !v.is_nan())
            .max_by(|(_, a), (_, b)| {
                if maximize {
                    a.total_cmp(b)
                } else {
                    b.total_cmp(a)
                }
            })
            .map(|(r, _)| r)
    }
}

/// Experiment tracker.
///
/// Constructed once per process; runs are opened and closed per invocation
/// and every closed run is persisted through the storage backend.
pub struct ExperimentTracker {
    config: TrackingConfig,
    storage: Box<dyn StorageBackend + Send + Sync>,

    // Current state
    current_experiment: RwLock<Option<String>>,
    current_run: RwLock<Option<Run>>,

    // All experiments, by ID
    experiments: RwLock<BTreeMap<String, Experiment>>,
}

impl ExperimentTracker {
    /// Create a tracker backed by local storage under `config.output_dir`
    pub fn new(config: TrackingConfig) -> Result<Self> {
        let storage = Box::new(LocalStorage::new(config.output_dir.clone()));
        Self::with_storage(config, storage)
    }

    /// Create a tracker over any backend, loading what it already holds
    pub fn with_storage(
        config: TrackingConfig,
        storage: Box<dyn StorageBackend + Send + Sync>,
    ) -> Result<Self> {
        let experiments: BTreeMap<String, Experiment> = storage
            .load_experiments()?
            .into_iter()
            .map(|e| (e.experiment_id.clone(), e))
            .collect();

        Ok(Self {
            config,
            storage,
            current_experiment: RwLock::new(None),
            current_run: RwLock::new(None),
            experiments: RwLock::new(experiments),
        })
    }

    pub fn config(&self) -> &TrackingConfig {
        &self.config
    }

    /// Select the experiment called `name`, creating it if needed.
    /// Returns its ID.
    pub fn set_experiment(&self, name: &str) -> Result<String> {
        let mut experiments = self.experiments.write();

        let existing = experiments
            .values()
            .find(|e| e.name == name)
            .map(|e| e.experiment_id.clone());

        let experiment_id = match existing {
            Some(id) => id,
            None => {
                let experiment = Experiment::new(name);
                let id = experiment.experiment_id.clone();
                experiments.insert(id.clone(), experiment);
                let snapshot: Vec<Experiment> = experiments.values().cloned().collect();
                self.storage.save_experiments(&snapshot)?;
                info!(experiment = name, experiment_id = %id, "Created experiment");
                id
            }
        };

        *self.current_experiment.write() = Some(experiment_id.clone());
        Ok(experiment_id)
    }

    /// Start a new run in the current experiment
    pub fn start_run(&self, run_name: impl Into<String>) -> Result<String> {
        let has_experiment = self.current_experiment.read().is_some();
        if !has_experiment {
            let name = self.config.experiment_name.clone();
            self.set_experiment(&name)?;
        }

        let mut current = self.current_run.write();
        if let Some(active) = current.as_ref() {
            return Err(ForestError::TrackingError(format!(
                "run {} is still active",
                active.run_id
            )));
        }

        let run = Run::new(run_name);
        let run_id = run.run_id.clone();
        debug!(run_id = %run_id, run_name = %run.run_name, "Started run");
        *current = Some(run);

        Ok(run_id)
    }

    fn with_active_run<F>(&self, f: F) -> Result<()>
    where
        F: FnOnce(&mut Run),
    {
        let mut current = self.current_run.write();
        let run = current
            .as_mut()
            .ok_or_else(|| ForestError::TrackingError("no active run".to_string()))?;
        f(run);
        Ok(())
    }

    /// Log a parameter
    pub fn log_param(&self, key: impl Into<String>, value: impl Into<String>) -> Result<()> {
        let (key, value) = (key.into(), value.into());
        self.with_active_run(|r| {
            r.params.insert(key, value);
        })
    }

    /// Log multiple parameters
    pub fn log_params(&self, params: &BTreeMap<String, String>) -> Result<()> {
        self.with_active_run(|r| {
            r.params.extend(params.iter().map(|(k, v)| (k.clone(), v.clone())));
        })
    }

    /// Log a metric
    pub fn log_metric(&self, name: impl Into<String>, value: f64, step: Option<u64>) -> Result<()> {
        let name = name.into();
        let keep_history = self.config.enable_metrics_history;

        self.with_active_run(|r| {
            if keep_history {
                r.metrics_history.push(Metric::new(&name, value, step.unwrap_or(0)));
            }
            r.metrics.insert(name, value);
        })
    }

    /// Log a tag
    pub fn log_tag(&self, key: impl Into<String>, value: impl Into<String>) -> Result<()> {
        let (key, value) = (key.into(), value.into());
        self.with_active_run(|r| {
            r.tags.insert(key, value);
        })
    }

    /// End the current run, attach it to its experiment and persist.
    ///
    /// The in-memory experiment only gains the run once the store has
    /// accepted it. A failed save discards the run and clears the active slot.
    pub fn end_run(&self, status: RunStatus) -> Result<Run> {
        let experiment_id = self
            .current_experiment
            .read()
            .clone()
            .ok_or_else(|| ForestError::TrackingError("no active experiment".to_string()))?;

        let mut experiments = self.experiments.write();
        if !experiments.contains_key(&experiment_id) {
            return Err(ForestError::TrackingError(format!(
                "unknown experiment {}",
                experiment_id
            )));
        }

        let mut run = self
            .current_run
            .write()
            .take()
            .ok_or_else(|| ForestError::TrackingError("no active run to end".to_string()))?;

        run.end_time = Some(Utc::now());
        run.status = status;

        let mut snapshot: Vec<Experiment> = experiments.values().cloned().collect();
        if let Some(experiment) = snapshot.iter_mut().find(|e| e.experiment_id == experiment_id) {
            experiment.runs.push(run.clone());
        }

        if let Err(e) = self.storage.save_experiments(&snapshot) {
            warn!(run_id = %run.run_id, error = %e, "Failed to persist run");
            return Err(e);
        }

        if let Some(experiment) = experiments.get_mut(&experiment_id) {
            experiment.runs.push(run.clone());
        }
        info!(run_id = %run.run_id, status = ?status, "Ended run");

        Ok(run)
    }

    /// End run as finished
    pub fn end_run_success(&self) -> Result<Run> {
        self.end_run(RunStatus::Finished)
    }

    /// Get the current run
    pub fn current_run(&self) -> Option<Run> {
        self.current_run.read().clone()
    }

    /// Get the current experiment
    pub fn current_experiment(&self) -> Option<Experiment> {
        let id = self.current_experiment.read().clone()?;
        self.get_experiment(&id)
    }

    /// Get an experiment by ID
    pub fn get_experiment(&self, experiment_id: &str) -> Option<Experiment> {
        self.experiments.read().get(experiment_id).cloned()
    }

    /// Get an experiment by name
    pub fn get_experiment_by_name(&self, name: &str) -> Option<Experiment> {
        self.experiments.read().values().find(|e| e.name == name).cloned()
    }

    /// List all experiments
    pub fn list_experiments(&self) -> Vec<Experiment> {
        self.experiments.read().values().cloned().collect()
    }
}

impl TrackingSink for ExperimentTracker {
    fn record_params(&self, params: &BTreeMap<String, String>) -> Result<()> {
        self.log_params(params)
    }

    fn record_metric(&self, name: &str, value: f64) -> Result<()> {
        self.log_metric(name, value, None)
    }
}
