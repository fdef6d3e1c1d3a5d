//! Batch result collection and durable artifact store.
//!
//! The collection is the single contract with the reporting layer: one
//! entry per input patient, in input order, fully replacing the previous
//! run's artifact. `finalize` is the only publish point and uses
//! write-to-temp-then-rename, so a crashed run never leaves a
//! half-written artifact where a complete one is expected.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::info;

use crate::verdict::ScreeningEntry;

/// Errors from persisting the result collection.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("failed to serialize result collection: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to write result artifact to {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Ordered collection of per-patient screening entries.
#[derive(Debug, Default)]
pub struct BatchResults {
    entries: Vec<ScreeningEntry>,
}

impl BatchResults {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry in arrival order.
    pub fn record(&mut self, entry: ScreeningEntry) {
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[ScreeningEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of entries holding a verdict.
    pub fn assessed_count(&self) -> usize {
        self.entries.iter().filter(|e| e.is_verdict()).count()
    }

    /// Number of explicit failure markers.
    pub fn failed_count(&self) -> usize {
        self.len() - self.assessed_count()
    }

    /// Serialize the full collection and atomically publish it at `path`,
    /// replacing any previous artifact.
    pub fn finalize(&self, path: &Path) -> Result<(), StoreError> {
        let json = serde_json::to_vec_pretty(&self.entries)?;

        let tmp = path.with_extension("tmp");
        fs::write(&tmp, &json).map_err(|source| StoreError::Write {
            path: tmp.clone(),
            source,
        })?;
        fs::rename(&tmp, path).map_err(|source| StoreError::Write {
            path: path.to_path_buf(),
            source,
        })?;

        info!(
            path = %path.display(),
            entries = self.len(),
            assessed = self.assessed_count(),
            failed = self.failed_count(),
            "result artifact written"
        );

        Ok(())
    }
}
