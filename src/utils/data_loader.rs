//! Split-file loading utilities
//!
//! A data directory holds one file per split. Each file is a serialized
//! 2-tuple `(features, labels)` where `features` is a list of equal-width
//! numeric vectors and `labels` has one value per vector. Two container
//! formats are understood, picked by file extension: bincode (`.bin`) and
//! JSON (`.json`).

use crate::dataset::Dataset;
use crate::error::{ForestError, Result};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// File stem of the training split
pub const TRAIN_SPLIT: &str = "train";
/// File stem of the validation split
pub const VALIDATION_SPLIT: &str = "val";

/// On-disk shape of a split
type SplitPayload = (Vec<Vec<f64>>, Vec<f64>);

/// Container format of a split file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasetFormat {
    /// bincode, `.bin`
    Bincode,
    /// JSON, `.json`
    Json,
}

impl DatasetFormat {
    /// File extension, without the dot
    pub fn extension(&self) -> &'static str {
        match self {
            DatasetFormat::Bincode => "bin",
            DatasetFormat::Json => "json",
        }
    }

    /// Detect the format from a path's extension
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "bin" | "bincode" => Some(DatasetFormat::Bincode),
            "json" => Some(DatasetFormat::Json),
            _ => None,
        }
    }
}

/// Loader for split files
#[derive(Debug, Clone)]
pub struct DataLoader {
    /// Formats probed for a split, in order
    formats: Vec<DatasetFormat>,
}

impl Default for DataLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl DataLoader {
    /// Create a loader probing bincode first, then JSON
    pub fn new() -> Self {
        Self {
            formats: vec![DatasetFormat::Bincode, DatasetFormat::Json],
        }
    }

    /// Restrict or reorder the probed formats
    pub fn with_formats(mut self, formats: Vec<DatasetFormat>) -> Self {
        self.formats = formats;
        self
    }

    /// Find the file holding split `stem` inside `dir`
    pub fn resolve_split(&self, dir: &Path, stem: &str) -> Result<PathBuf> {
        for format in &self.formats {
            let candidate = dir.join(format!("{}.{}", stem, format.extension()));
            if candidate.is_file() {
                return Ok(candidate);
            }
        }

        let tried: Vec<String> = self
            .formats
            .iter()
            .map(|f| format!("{}.{}", stem, f.extension()))
            .collect();
        Err(ForestError::data_load(
            dir.join(stem),
            format!("split file not found (tried {})", tried.join(", ")),
        ))
    }

    /// Resolve and load split `stem` from `dir`
    pub fn load_split(&self, dir: &Path, stem: &str) -> Result<Dataset> {
        let path = self.resolve_split(dir, stem)?;
        self.load_file(&path)
    }

    /// Load a single split file, detecting the format from its extension
    pub fn load_file(&self, path: &Path) -> Result<Dataset> {
        let format = DatasetFormat::from_path(path)
            .ok_or_else(|| ForestError::data_load(path, "unrecognized file extension"))?;

        let (rows, labels) = read_payload(path, format)?;
        let dataset = Dataset::from_rows(rows, labels)
            .map_err(|e| ForestError::data_load(path, e.to_string()))?;

        debug!(
            path = %path.display(),
            n_samples = dataset.n_samples(),
            n_features = dataset.n_features(),
            "Loaded split"
        );
        Ok(dataset)
    }
}

fn read_payload(path: &Path, format: DatasetFormat) -> Result<SplitPayload> {
    // Handle is dropped on return, including the error paths below.
    let file = File::open(path).map_err(|e| ForestError::data_load(path, e.to_string()))?;
    let reader = BufReader::new(file);

    match format {
        DatasetFormat::Bincode => bincode::deserialize_from(reader)
            .map_err(|e| ForestError::data_load(path, format!("corrupt bincode: {}", e))),
        DatasetFormat::Json => serde_json::from_reader(reader)
            .map_err(|e| ForestError::data_load(path, format!("corrupt JSON: {}", e))),
    }
}

/// Writer for split files
pub struct DataSaver;

impl DataSaver {
    /// Write `dataset` as split `stem` into `dir`, returning the file path
    pub fn save_split(
        dataset: &Dataset,
        dir: &Path,
        stem: &str,
        format: DatasetFormat,
    ) -> Result<PathBuf> {
        fs::create_dir_all(dir)?;
        let path = dir.join(format!("{}.{}", stem, format.extension()));
        let payload: SplitPayload = dataset.to_rows();

        let mut writer = BufWriter::new(File::create(&path)?);
        match format {
            DatasetFormat::Bincode => bincode::serialize_into(&mut writer, &payload)
                .map_err(|e| ForestError::SerializationError(e.to_string()))?,
            DatasetFormat::Json => serde_json::to_writer(&mut writer, &payload)?,
        }
        writer.flush()?;

        Ok(path)
    }
}
