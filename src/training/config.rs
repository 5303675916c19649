//! Model hyperparameters

use crate::error::{ForestError, Result};
use super::random_forest::RandomForest;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Key of the maximum tree depth
pub const MAX_DEPTH: &str = "max_depth";
/// Key of the seed
pub const RANDOM_STATE: &str = "random_state";
/// Key of the forest size
pub const N_ESTIMATORS: &str = "n_estimators";

/// Hyperparameters of the random forest regressor.
///
/// Values are stored as given and checked by [`ModelConfig::validate`], so
/// an out-of-range value surfaces as `InvalidConfig` at the start of a
/// run rather than at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModelConfig {
    max_depth: i64,
    random_state: i64,
    n_estimators: usize,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self::new(10, 0)
    }
}

impl ModelConfig {
    /// Create a configuration with the default forest size of 100 trees
    pub fn new(max_depth: i64, random_state: i64) -> Self {
        Self {
            max_depth,
            random_state,
            n_estimators: 100,
        }
    }

    /// Set the number of trees
    pub fn with_n_estimators(mut self, n_estimators: usize) -> Self {
        self.n_estimators = n_estimators;
        self
    }

    /// Build from a name → value map.
    ///
    /// `max_depth` and `random_state` are required; `n_estimators` is
    /// optional. Unknown names are rejected.
    pub fn from_params(params: &BTreeMap<String, String>) -> Result<Self> {
        if let Some(unknown) = params
            .keys()
            .find(|k| ![MAX_DEPTH, RANDOM_STATE, N_ESTIMATORS].contains(&k.as_str()))
        {
            return Err(ForestError::InvalidConfig(format!("unknown hyperparameter `{}`", unknown)));
        }

        let max_depth = parse_required::<i64>(params, MAX_DEPTH)?;
        let random_state = parse_required::<i64>(params, RANDOM_STATE)?;
        let mut config = Self::new(max_depth, random_state);

        if let Some(raw) = params.get(N_ESTIMATORS) {
            config.n_estimators = parse_value(N_ESTIMATORS, raw)?;
        }

        Ok(config)
    }

    pub fn max_depth(&self) -> i64 {
        self.max_depth
    }

    pub fn random_state(&self) -> i64 {
        self.random_state
    }

    pub fn n_estimators(&self) -> usize {
        self.n_estimators
    }

    /// Check every constraint
    pub fn validate(&self) -> Result<()> {
        if self.max_depth <= 0 {
            return Err(ForestError::InvalidConfig(format!(
                "max_depth must be greater than 0, got {}",
                self.max_depth
            )));
        }
        if self.n_estimators == 0 {
            return Err(ForestError::InvalidConfig(
                "n_estimators must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Name → value rendering, as recorded by a tracker
    pub fn params(&self) -> BTreeMap<String, String> {
        BTreeMap::from([
            (MAX_DEPTH.to_string(), self.max_depth.to_string()),
            (RANDOM_STATE.to_string(), self.random_state.to_string()),
            (N_ESTIMATORS.to_string(), self.n_estimators.to_string()),
        ])
    }

    /// Build an unfitted forest from this configuration
    pub fn build_forest(&self) -> Result<RandomForest> {
        self.validate()?;

        let max_depth = usize::try_from(self.max_depth)
            .map_err(|_| ForestError::InvalidConfig(format!("max_depth {} out of range", self.max_depth)))?;

        // Negative seeds map onto the upper half of the u64 range
        let seed = self.random_state as u64;

        Ok(RandomForest::new_regressor(self.n_estimators)
            .with_max_depth(max_depth)
            .with_random_state(seed))
    }
}

fn parse_required<T: std::str::FromStr>(params: &BTreeMap<String, String>, key: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    let raw = params
        .get(key)
        .ok_or_else(|| ForestError::InvalidConfig(format!("missing required hyperparameter `{}`", key)))?;
    parse_value(key, raw)
}

fn parse_value<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e| ForestError::InvalidConfig(format!("`{}` = {:?}: {}", key, raw, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_defaults() {
        let config = ModelConfig::default();
        assert_eq!(config.max_depth(), 10);
        assert_eq!(config.random_state(), 0);
        assert_eq!(config.n_estimators(), 100);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_non_positive_depth_rejected() {
        assert!(matches!(ModelConfig::new(0, 0).validate(), Err(ForestError::InvalidConfig(_))));
        assert!(matches!(ModelConfig::new(-3, 0).validate(), Err(ForestError::InvalidConfig(_))));
        assert!(ModelConfig::new(1, 0).validate().is_ok());
    }

    #[test]
    fn test_zero_estimators_rejected() {
        let config = ModelConfig::new(5, 0).with_n_estimators(0);
        assert!(matches!(config.validate(), Err(ForestError::InvalidConfig(_))));
    }

    #[test]
    fn test_from_params() {
        let config = ModelConfig::from_params(&params(&[("max_depth", "10"), ("random_state", "0")])).unwrap();
        assert_eq!(config, ModelConfig::new(10, 0));

        let config = ModelConfig::from_params(&params(&[
            ("max_depth", "3"),
            ("random_state", "-1"),
            ("n_estimators", "7"),
        ]))
        .unwrap();
        assert_eq!(config, ModelConfig::new(3, -1).with_n_estimators(7));
    }

    #[test]
    fn test_from_params_missing_key() {
        let err = ModelConfig::from_params(&params(&[("max_depth", "10")])).unwrap_err();
        assert!(err.to_string().contains("random_state"));
    }

    #[test]
    fn test_from_params_bad_value() {
        let err = ModelConfig::from_params(&params(&[("max_depth", "deep"), ("random_state", "0")])).unwrap_err();
        assert!(matches!(err, ForestError::InvalidConfig(_)));
    }

    #[test]
    fn test_from_params_unknown_key() {
        let err = ModelConfig::from_params(&params(&[
            ("max_depth", "1"),
            ("random_state", "0"),
            ("min_samples_leaf", "3"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("min_samples_leaf"));
    }

    #[test]
    fn test_params_round_trip() {
        let config = ModelConfig::new(4, 9).with_n_estimators(12);
        assert_eq!(ModelConfig::from_params(&config.params()).unwrap(), config);
    }

    #[test]
    fn test_build_forest() {
        let forest = ModelConfig::new(6, 3).with_n_estimators(5).build_forest().unwrap();
        assert_eq!(forest.max_depth, Some(6));
        assert_eq!(forest.random_state, Some(3));
        assert_eq!(forest.n_estimators, 5);
    }
}
