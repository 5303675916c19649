//! Model training module
//!
//! Provides the random forest regressor and the routine that fits it on a
//! training split and scores it on a validation split:
//! - [`DecisionTree`] - CART regression tree
//! - [`RandomForest`] - bagged, seeded ensemble of trees
//! - [`ModelConfig`] - hyperparameters
//! - [`TrainingRoutine`] - load → fit → evaluate, returning a [`MetricReport`]

mod config;
mod engine;
mod models;
pub mod decision_tree;
pub mod random_forest;

pub use config::{ModelConfig, MAX_DEPTH, N_ESTIMATORS, RANDOM_STATE};
pub use engine::{run, TrainingRoutine};
pub use models::{rmse, MetricReport, TrainedModel, RMSE_METRIC};
pub use decision_tree::{DecisionTree, TreeNode};
pub use random_forest::{MaxFeatures, RandomForest};
