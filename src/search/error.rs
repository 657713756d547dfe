//! Search error types.

use thiserror::Error;

use super::SearchResult;
use super::sink::SinkError;
use super::worker::WorkerReport;
use crate::error::{Effect, Transience};
use crate::git::RepoError;

/// One worker's provisioning failure.
#[derive(Error, Debug)]
#[error("worker {worker}: {error}")]
pub struct ProvisionFailure {
    pub worker: usize,
    #[source]
    pub error: RepoError,
}

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum SearchError {
    #[error("worker count must be at least 1")]
    InvalidWorkerCount,

    #[error("failed to spawn worker {worker}: {source}")]
    Spawn {
        worker: usize,
        #[source]
        source: std::io::Error,
    },

    #[error("all {} workers failed to provision", failures.len())]
    AllWorkersFailed { failures: Vec<ProvisionFailure> },

    #[error("every worker stopped without a match")]
    Exhausted { reports: Vec<WorkerReport> },

    #[error("search interrupted after {attempts} attempts")]
    Interrupted { attempts: u64 },

    #[error("found {} but could not persist it: {source}", result.candidate)]
    Persist {
        result: SearchResult,
        #[source]
        source: SinkError,
    },
}

impl SearchError {
    pub fn transience(&self) -> Transience {
        match self {
            SearchError::InvalidWorkerCount => Transience::Permanent,
            SearchError::Spawn { .. } | SearchError::Interrupted { .. } => Transience::Retryable,
            SearchError::AllWorkersFailed { .. } | SearchError::Exhausted { .. } => {
                Transience::Unknown
            }
            SearchError::Persist { source, .. } => source.transience(),
        }
    }

    pub fn effect(&self) -> Effect {
        match self {
            SearchError::InvalidWorkerCount => Effect::None,
            SearchError::AllWorkersFailed { failures } => {
                if failures.iter().all(|f| f.error.effect() == Effect::None) {
                    Effect::None
                } else {
                    Effect::Unknown
                }
            }
            // Replicas were created on disk; a persist failure also left a winning commit.
            SearchError::Persist { .. } => Effect::Some,
            _ => Effect::Unknown,
        }
    }
}
