//! Fitted model and evaluation report

use crate::dataset::Dataset;
use crate::error::{ForestError, Result};
use crate::tracking::TrackingSink;
use super::config::ModelConfig;
use super::random_forest::RandomForest;
use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// Name under which the validation error is reported
pub const RMSE_METRIC: &str = "rmse";

/// A forest fitted on a training split.
///
/// Prediction consumes the model; it is used once, on the validation split.
#[derive(Debug)]
pub struct TrainedModel {
    forest: RandomForest,
}

impl TrainedModel {
    /// Apply `config` to `train`
    pub fn fit(config: &ModelConfig, train: &Dataset) -> Result<Self> {
        let mut forest = config.build_forest()?;
        forest.fit(train.features(), train.labels())?;
        Ok(Self { forest })
    }

    /// Feature importances of the fitted forest
    pub fn feature_importances(&self) -> Option<&Array1<f64>> {
        self.forest.feature_importances()
    }

    /// Predict one label per feature vector of `dataset`
    pub fn predict(self, dataset: &Dataset) -> Result<Array1<f64>> {
        self.forest.predict(dataset.features())
    }
}

/// Root-mean-squared error: `sqrt(mean((pred_i - actual_i)^2))`
pub fn rmse(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> Result<f64> {
    if y_true.len() != y_pred.len() {
        return Err(ForestError::ShapeError {
            expected: format!("{} predictions", y_true.len()),
            actual: format!("{} predictions", y_pred.len()),
        });
    }
    if y_true.is_empty() {
        return Err(ForestError::ShapeError {
            expected: "at least one prediction".to_string(),
            actual: "0 predictions".to_string(),
        });
    }

    let mse = y_true
        .iter()
        .zip(y_pred.iter())
        .map(|(t, p)| (p - t).powi(2))
        .sum::<f64>()
        / y_true.len() as f64;

    Ok(mse.sqrt())
}

/// A single named metric plus the configuration that produced it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricReport {
    pub metric_name: String,
    pub value: f64,
    pub config: ModelConfig,
}

impl MetricReport {
    pub fn new(metric_name: impl Into<String>, value: f64, config: ModelConfig) -> Self {
        Self {
            metric_name: metric_name.into(),
            value,
            config,
        }
    }

    /// Hand the report to a tracker: one params call, one metric call
    pub fn report_to(&self, sink: &dyn TrackingSink) -> Result<()> {
        sink.record_params(&self.config.params())?;
        sink.record_metric(&self.metric_name, self.value)
    }
}
