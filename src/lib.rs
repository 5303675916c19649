//! forest-tracker - seeded random-forest training with experiment tracking
//!
//! The core is [`training::TrainingRoutine`]: it loads the `train` and `val`
//! splits of a data directory, fits a random forest regressor configured by
//! a [`training::ModelConfig`], and returns the validation RMSE as a
//! [`training::MetricReport`]. Everything around it is a collaborator the
//! caller wires up:
//!
//! - [`tracking`] - experiments and runs, persisted as JSON
//! - [`orchestration`] - named flow runs with retries and failure notices
//! - [`cli`] - command-line interface
//!
//! # Modules
//!
//! - [`dataset`] - labeled dataset with shape validation
//! - [`training`] - decision trees, random forest, the training routine
//! - [`utils`] - split-file loading, timing

// Core error handling
pub mod error;

// Core ML modules
pub mod dataset;
pub mod training;

// Collaborators
pub mod tracking;
pub mod orchestration;

// Utilities
pub mod utils;

// Services
pub mod cli;

pub use error::{ForestError, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::error::{ForestError, Result};
    pub use crate::dataset::Dataset;
    pub use crate::training::{MetricReport, ModelConfig, RandomForest, TrainingRoutine};
    pub use crate::tracking::{ExperimentTracker, RunStatus, TrackingConfig, TrackingSink};
    pub use crate::orchestration::{FlowRunner, LogNotifier, Notifier};
    pub use crate::utils::{DataLoader, DataSaver, DatasetFormat};
}
