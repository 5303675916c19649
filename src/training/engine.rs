//! Train → evaluate cycle over a data directory

use crate::dataset::Dataset;
use crate::error::{ForestError, Result};
use crate::utils::{DataLoader, Timer, TRAIN_SPLIT, VALIDATION_SPLIT};
use super::config::ModelConfig;
use super::models::{rmse, MetricReport, TrainedModel, RMSE_METRIC};
use std::path::Path;
use tracing::{debug, info};

/// Deterministic train → evaluate routine.
///
/// Reads the `train` and `val` splits from a directory, fits the configured
/// forest on the first and reports RMSE on the second. Reporting to a
/// tracker is left to the caller.
#[derive(Debug, Clone, Default)]
pub struct TrainingRoutine {
    loader: DataLoader,
}

impl TrainingRoutine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a custom split loader
    pub fn with_loader(mut self, loader: DataLoader) -> Self {
        self.loader = loader;
        self
    }

    /// Run the full cycle on `data_directory`
    pub fn run(&self, data_directory: &Path, config: ModelConfig) -> Result<MetricReport> {
        // Configuration is checked before touching the filesystem
        config.validate()?;

        let train_path = self.loader.resolve_split(data_directory, TRAIN_SPLIT)?;
        let train = self.loader.load_file(&train_path)?;

        let validation_path = self.loader.resolve_split(data_directory, VALIDATION_SPLIT)?;
        let validation = self.loader.load_file(&validation_path)?;

        if validation.n_features() != train.n_features() {
            return Err(ForestError::data_load(
                &validation_path,
                format!(
                    "feature width {} does not match training width {}",
                    validation.n_features(),
                    train.n_features()
                ),
            ));
        }

        info!(
            data_directory = %data_directory.display(),
            n_train = train.n_samples(),
            n_validation = validation.n_samples(),
            n_features = train.n_features(),
            "Loaded splits"
        );

        self.evaluate(&train, &validation, config)
    }

    /// Fit on `train` and score on `validation`, without any I/O
    pub fn evaluate(&self, train: &Dataset, validation: &Dataset, config: ModelConfig) -> Result<MetricReport> {
        config.validate()?;

        if validation.n_features() != train.n_features() {
            return Err(ForestError::ShapeError {
                expected: format!("{} validation features", train.n_features()),
                actual: format!("{} validation features", validation.n_features()),
            });
        }

        let timer = Timer::start("fit");
        let model = TrainedModel::fit(&config, train)?;
        let fit_time = timer.stop();
        debug!(
            max_depth = config.max_depth(),
            random_state = config.random_state(),
            n_estimators = config.n_estimators(),
            fit_secs = fit_time.as_secs_f64(),
            "Fitted forest"
        );

        let predictions = model.predict(validation)?;
        let value = rmse(validation.labels(), &predictions)?;
        info!(rmse = value, "Validation complete");

        Ok(MetricReport::new(RMSE_METRIC, value, config))
    }
}

/// Run [`TrainingRoutine`] with the default loader
pub fn run(data_directory: impl AsRef<Path>, config: ModelConfig) -> Result<MetricReport> {
    TrainingRoutine::new().run(data_directory.as_ref(), config)
}
