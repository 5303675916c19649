//! Utility functions and types

mod metrics;
pub mod data_loader;

pub use data_loader::{DataLoader, DataSaver, DatasetFormat, TRAIN_SPLIT, VALIDATION_SPLIT};
pub use metrics::Timer;
