//! Persistence of the winning result.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::SearchResult;
use crate::error::{Effect, Transience};

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum SinkError {
    #[error("failed to encode result: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to remove stale {}: {source}", path.display())]
    Clear {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl SinkError {
    pub fn transience(&self) -> Transience {
        match self {
            SinkError::Encode(_) => Transience::Permanent,
            SinkError::Write { .. } | SinkError::Read { .. } | SinkError::Clear { .. } => {
                Transience::Retryable
            },
        }
    }

    pub fn effect(&self) -> Effect {
        Effect::None
    }
}

/// Receives the winning result exactly once per search.
pub trait ResultSink: Send + Sync {
    fn persist(&self, result: &SearchResult) -> Result<(), SinkError>;
}

/// Writes the result as JSON, replacing the target atomically.
#[derive(Debug, Clone)]
pub struct FileSink {
    path: PathBuf,
}

impl FileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Remove a result left by an earlier run.
    pub fn clear(&self) -> Result<(), SinkError> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                tracing::debug!(path = %self.path.display(), "removed stale result");
                Ok(())
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(SinkError::Clear {
                path: self.path.clone(),
                source,
            }),
        }
    }

    /// Read back a persisted result.
    pub fn load(&self) -> Result<SearchResult, SinkError> {
        let bytes = fs::read(&self.path).map_err(|source| SinkError::Read {
            path: self.path.clone(),
            source,
        })?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    fn write_error(&self, source: std::io::Error) -> SinkError {
        SinkError::Write {
            path: self.path.clone(),
            source,
        }
    }
}

impl ResultSink for FileSink {
    fn persist(&self, result: &SearchResult) -> Result<(), SinkError> {
        let mut data = serde_json::to_vec_pretty(result)?;
        data.push(b'\n');

        let dir = match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir).map_err(|e| self.write_error(e))?;
        let mut temp = tempfile::NamedTempFile::new_in(dir).map_err(|e| self.write_error(e))?;
        temp.write_all(&data).map_err(|e| self.write_error(e))?;
        temp.persist(&self.path)
            .map_err(|e| self.write_error(e.error))?;
        tracing::info!(path = %self.path.display(), "result written");
        Ok(())
    }
}
