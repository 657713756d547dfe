#![forbid(unsafe_code)]

pub mod candidate;
pub mod cli;
pub mod config;
pub mod error;
pub mod git;
mod paths;
pub mod search;
pub mod telemetry;
#[cfg(any(test, feature = "test-harness"))]
pub mod test_harness;

pub use error::{Effect, Error, Result, Transience};

pub use crate::candidate::{Alphabet, Candidate, CandidateGenerator};
pub use crate::git::{GitProvisioner, GitRepo, Provisioner, ReplicaSource, Repository};
pub use crate::search::{
    FileSink, ResultSink, SearchCoordinator, SearchError, SearchResult, SearchSummary,
    TrialRunner, WorkerPolicy,
};
