//! Storage Backend for Experiment Tracking
//!
//! Provides storage backends for persisting experiments.

use crate::error::{ForestError, Result};
use parking_lot::Mutex;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use super::tracker::Experiment;

/// Storage backend trait
pub trait StorageBackend {
    /// Save experiments to storage, replacing what was there
    fn save_experiments(&self, experiments: &[Experiment]) -> Result<()>;

    /// Load experiments from storage
    fn load_experiments(&self) -> Result<Vec<Experiment>>;

    /// Delete an experiment
    fn delete_experiment(&self, experiment_id: &str) -> Result<()> {
        let mut experiments = self.load_experiments()?;
        experiments.retain(|e| e.experiment_id != experiment_id);
        self.save_experiments(&experiments)
    }
}

/// Local file system storage backend.
///
/// All experiments live in one `experiments.json` under `base_dir`.
pub struct LocalStorage {
    base_dir: PathBuf,
}

impl LocalStorage {
    /// Create a new local storage backend; the directory is created lazily
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn experiments_file(&self) -> PathBuf {
        self.base_dir.join("experiments.json")
    }
}

impl StorageBackend for LocalStorage {
    fn save_experiments(&self, experiments: &[Experiment]) -> Result<()> {
        fs::create_dir_all(&self.base_dir)?;

        // Write then rename so a crash never leaves a half-written store
        let tmp_path = self.base_dir.join("experiments.json.tmp");
        {
            let mut writer = BufWriter::new(File::create(&tmp_path)?);
            serde_json::to_writer_pretty(&mut writer, experiments)?;
            writer.flush()?;
        }
        fs::rename(&tmp_path, self.experiments_file())?;

        Ok(())
    }

    fn load_experiments(&self) -> Result<Vec<Experiment>> {
        let file_path = self.experiments_file();

        if !file_path.exists() {
            return Ok(Vec::new());
        }

        let reader = BufReader::new(File::open(&file_path)?);
        serde_json::from_reader(reader).map_err(|e| {
            ForestError::TrackingError(format!("corrupt store {}: {}", file_path.display(), e))
        })
    }
}

/// In-process backend, nothing touches disk
#[derive(Default)]
pub struct MemoryStorage {
    experiments: Mutex<Vec<Experiment>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StorageBackend for MemoryStorage {
    fn save_experiments(&self, experiments: &[Experiment]) -> Result<()> {
        *self.experiments.lock() = experiments.to_vec();
        Ok(())
    }

    fn load_experiments(&self) -> Result<Vec<Experiment>> {
        Ok(self.experiments.lock().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracking::tracker::{Run, RunStatus};
    use tempfile::TempDir;

    fn sample_experiment() -> Experiment {
        let mut exp = Experiment::new("Test Experiment");
        exp.tags.insert("env".to_string(), "test".to_string());

        let mut run = Run::new("run \"quoted\"\n");
        run.params.insert("max_depth".to_string(), "10".to_string());
        run.metrics.insert("rmse".to_string(), 5.25);
        run.status = RunStatus::Finished;
        exp.runs.push(run);
        exp
    }

    #[test]
    fn test_local_storage_round_trip() {
        let dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(dir.path().join("store"));
        let exp = sample_experiment();

        storage.save_experiments(&[exp.clone()]).unwrap();
        assert!(storage.experiments_file().exists());

        let loaded = storage.load_experiments().unwrap();
        assert_eq!(loaded, vec![exp]);
    }

    #[test]
    fn test_load_missing_is_empty() {
        let dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(dir.path());
        assert!(storage.load_experiments().unwrap().is_empty());
    }

    #[test]
    fn test_corrupt_store() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("experiments.json"), "{").unwrap();

        let err = LocalStorage::new(dir.path()).load_experiments().unwrap_err();
        assert!(matches!(err, ForestError::TrackingError(_)));
    }

    #[test]
    fn test_delete_experiment() {
        let storage = MemoryStorage::new();
        let keep = Experiment::new("keep");
        let drop = Experiment::new("drop");
        storage.save_experiments(&[keep.clone(), drop.clone()]).unwrap();

        storage.delete_experiment(&drop.experiment_id).unwrap();
        assert_eq!(storage.load_experiments().unwrap(), vec![keep]);
    }
}
