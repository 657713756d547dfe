//! The search engine.
//!
//! - `trial`: one guess/commit/compare/undo cycle
//! - `worker`: the per-replica loop and its terminal states
//! - `signal`: the shared stop condition and attempt counter
//! - `coordinator`: worker fan-out and single-winner fan-in
//! - `sink`: persistence of the result

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::candidate::Candidate;

pub mod coordinator;
pub mod error;
pub mod signal;
pub mod sink;
pub mod trial;
pub mod worker;

pub use coordinator::SearchCoordinator;
pub use error::{ProvisionFailure, SearchError};
pub use signal::{SearchState, StopSignal};
pub use sink::{FileSink, ResultSink, SinkError};
pub use trial::{Attempt, Outcome, TrialRunner};
pub use worker::{Win, Worker, WorkerExit, WorkerFailure, WorkerPolicy, WorkerReport, WorkerState};

/// The one winning record of a search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub candidate: Candidate,
    pub worker: usize,
    /// Replica holding the winning commit.
    pub location: PathBuf,
    /// The winner's own attempt number.
    pub ordinal: u64,
    /// Attempts across all workers when the win was recorded. Best effort.
    pub total_attempts: u64,
    pub elapsed_ms: u64,
}

#[derive(Debug)]
pub struct SearchSummary {
    pub result: SearchResult,
    pub workers: Vec<WorkerReport>,
}
