//! Recorded sample history
//!
//! Timing samples are only written here when recording is switched on.
//! The history keeps the most recent samples and drops the oldest.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::TimingSample;
use crate::{LockBenchError, Result, APP_NAME, MAX_RESULTS_HISTORY, RESULTS_FILE};

/// Sample history stored as a JSON file
#[derive(Debug)]
pub struct ResultsStorage {
    results_path: PathBuf,
}

#[derive(Debug, Serialize, Deserialize)]
struct ResultsFile {
    version: u32,
    samples: Vec<TimingSample>,
}

impl ResultsStorage {
    /// Storage at the standard location
    pub fn new() -> Result<Self> {
        Ok(Self::at(Self::results_file_path()?))
    }

    /// Storage at an explicit path
    pub fn at(results_path: PathBuf) -> Self {
        Self { results_path }
    }

    /// `$DATA_HOME/lockbench/results.json`
    pub fn results_file_path() -> Result<PathBuf> {
        let data_dir = dirs::data_dir().ok_or_else(|| {
            LockBenchError::Persistence("Unable to determine data directory".to_string())
        })?;

        Ok(data_dir.join(APP_NAME).join(RESULTS_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.results_path
    }

    pub fn load(&self) -> Result<Vec<TimingSample>> {
        if !self.results_path.exists() {
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(&self.results_path).map_err(|e| {
            LockBenchError::Persistence(format!(
                "Failed to read results file {}: {}",
                self.results_path.display(),
                e
            ))
        })?;

        let file: ResultsFile = serde_json::from_str(&content)?;
        Ok(file.samples)
    }

    /// Append samples, keeping at most `MAX_RESULTS_HISTORY`
    pub fn append(&self, new_samples: &[TimingSample]) -> Result<()> {
        let mut samples = self.load()?;
        samples.extend_from_slice(new_samples);

        if samples.len() > MAX_RESULTS_HISTORY {
            let skip_count = samples.len() - MAX_RESULTS_HISTORY;
            samples.drain(..skip_count);
        }

        self.save(samples)
    }

    fn save(&self, samples: Vec<TimingSample>) -> Result<()> {
        if let Some(parent) = self.results_path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                LockBenchError::Persistence(format!(
                    "Failed to create results directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let count = samples.len();
        let content = serde_json::to_string_pretty(&ResultsFile { version: 1, samples })?;
        fs::write(&self.results_path, content).map_err(|e| {
            LockBenchError::Persistence(format!(
                "Failed to write results file {}: {}",
                self.results_path.display(),
                e
            ))
        })?;

        debug!(path = %self.results_path.display(), count, "recorded samples");
        Ok(())
    }

    pub fn clear(&self) -> Result<()> {
        if self.results_path.exists() {
            fs::remove_file(&self.results_path).map_err(|e| {
                LockBenchError::Persistence(format!(
                    "Failed to remove results file {}: {}",
                    self.results_path.display(),
                    e
                ))
            })?;
        }
        Ok(())
    }

    /// The most recent `count` samples, oldest first
    pub fn recent(&self, count: usize) -> Result<Vec<TimingSample>> {
        let mut samples = self.load()?;
        let skip_count = samples.len().saturating_sub(count);
        samples.drain(..skip_count);
        Ok(samples)
    }
}
