//! Experiment Tracking Module
//!
//! Provides experiment tracking capabilities similar to MLflow: named
//! experiments holding runs, each run carrying params, metrics and a status.

mod storage;
mod tracker;

pub use storage::{LocalStorage, MemoryStorage, StorageBackend};
pub use tracker::{Experiment, ExperimentTracker, Metric, Run, RunStatus, TrackingConfig};

use crate::error::Result;
use std::collections::BTreeMap;

/// Receiver of a run's parameters and metrics
pub trait TrackingSink {
    /// Record a set of named parameters
    fn record_params(&self, params: &BTreeMap<String, String>) -> Result<()>;

    /// Record one named metric value
    fn record_metric(&self, name: &str, value: f64) -> Result<()>;
}
