//! Labeled dataset type
//!
//! A [`Dataset`] pairs a sample-major feature matrix with one label per
//! row. Construction validates the shape contract, so every `Dataset` in
//! circulation has `n_samples >= 1`, `n_features >= 1`, exactly one
//! label per sample and only finite values.

use crate::error::{ForestError, Result};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

/// Feature matrix paired with labels
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    features: Array2<f64>,
    labels: Array1<f64>,
}

impl Dataset {
    /// Create a dataset from a feature matrix and a label vector
    pub fn new(features: Array2<f64>, labels: Array1<f64>) -> Result<Self> {
        if features.nrows() != labels.len() {
            return Err(ForestError::ShapeError {
                expected: format!("{} labels (one per feature vector)", features.nrows()),
                actual: format!("{} labels", labels.len()),
            });
        }
        if features.nrows() == 0 {
            return Err(ForestError::ShapeError {
                expected: "at least one sample".to_string(),
                actual: "0 samples".to_string(),
            });
        }
        if features.ncols() == 0 {
            return Err(ForestError::ShapeError {
                expected: "at least one feature".to_string(),
                actual: "0 features".to_string(),
            });
        }
        if let Some(((row, col), value)) = features.indexed_iter().find(|(_, v)| !v.is_finite()) {
            return Err(ForestError::DataError(format!(
                "non-finite feature {} at row {}, column {}",
                value, row, col
            )));
        }
        if let Some((row, value)) = labels.iter().enumerate().find(|(_, v)| !v.is_finite()) {
            return Err(ForestError::DataError(format!(
                "non-finite label {} at row {}",
                value, row
            )));
        }

        Ok(Self { features, labels })
    }

    /// Create a dataset from row-major feature vectors.
    ///
    /// Every row must have the same width as the first one.
    pub fn from_rows(rows: Vec<Vec<f64>>, labels: Vec<f64>) -> Result<Self> {
        let n_samples = rows.len();
        let width = rows.first().map_or(0, Vec::len);

        if let Some((idx, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != width) {
            return Err(ForestError::ShapeError {
                expected: format!("every feature vector to have width {}", width),
                actual: format!("row {} has width {}", idx, row.len()),
            });
        }

        let flat: Vec<f64> = rows.into_iter().flatten().collect();
        let features = Array2::from_shape_vec((n_samples, width), flat)?;

        Self::new(features, Array1::from_vec(labels))
    }

    /// Number of samples
    pub fn n_samples(&self) -> usize {
        self.features.nrows()
    }

    /// Width of every feature vector
    pub fn n_features(&self) -> usize {
        self.features.ncols()
    }

    pub fn features(&self) -> &Array2<f64> {
        &self.features
    }

    pub fn labels(&self) -> &Array1<f64> {
        &self.labels
    }

    /// Row-major copy of the features plus the labels
    pub fn to_rows(&self) -> (Vec<Vec<f64>>, Vec<f64>) {
        let rows = self.features.outer_iter().map(|r| r.to_vec()).collect();
        (rows, self.labels.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_from_rows() {
        let ds = Dataset::from_rows(vec![vec![0.0, 1.0], vec![2.0, 3.0]], vec![1.0, 2.0]).unwrap();
        assert_eq!(ds.n_samples(), 2);
        assert_eq!(ds.n_features(), 2);
        assert_eq!(ds.features()[[1, 0]], 2.0);
    }

    #[test]
    fn test_label_count_mismatch() {
        let err = Dataset::new(array![[1.0], [2.0]], array![1.0]).unwrap_err();
        assert!(matches!(err, ForestError::ShapeError { .. }));
    }

    #[test]
    fn test_ragged_rows_rejected() {
        let err = Dataset::from_rows(vec![vec![1.0, 2.0], vec![3.0]], vec![0.0, 1.0]).unwrap_err();
        assert!(err.to_string().contains("row 1 has width 1"));
    }

    #[test]
    fn test_empty_rejected() {
        assert!(Dataset::from_rows(Vec::new(), Vec::new()).is_err());
        assert!(Dataset::from_rows(vec![vec![], vec![]], vec![1.0, 2.0]).is_err());
    }

    #[test]
    fn test_non_finite_values_rejected() {
        let err = Dataset::new(array![[1.0, f64::NAN], [2.0, 3.0]], array![1.0, 2.0]).unwrap_err();
        assert!(matches!(err, ForestError::DataError(_)));
        assert!(err.to_string().contains("row 0, column 1"));

        let err = Dataset::new(array![[1.0], [2.0]], array![1.0, f64::INFINITY]).unwrap_err();
        assert!(err.to_string().contains("non-finite label inf at row 1"));
    }

    #[test]
    fn test_to_rows() {
        let ds = Dataset::new(array![[1.0, 2.0], [3.0, 4.0]], array![5.0, 6.0]).unwrap();
        let (rows, labels) = ds.to_rows();
        assert_eq!(rows, vec![vec![1.0, 2.0], vec![3.0, 4.0]]);
        assert_eq!(labels, vec![5.0, 6.0]);
    }
}
