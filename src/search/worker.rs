//! Worker loop.
//!
//! A worker repeats trials against its own replica until one of three
//! terminal states: it matches (`Succeeded`), it observes the stop signal at
//! the top of an iteration (`Cancelled`), or its replica keeps refusing writes
//! (`Failed`). An in-flight git call is never interrupted.

use std::path::PathBuf;
use std::time::Instant;

use thiserror::Error;

use super::signal::SearchState;
use super::trial::TrialRunner;
use crate::candidate::Candidate;
use crate::error::Transience;
use crate::git::{RepoError, Repository};

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum WorkerState {
    Running,
    Succeeded,
    Cancelled,
    Failed,
}

#[derive(Error, Debug)]
pub enum WorkerFailure {
    #[error(transparent)]
    Provision(RepoError),

    #[error("{count} consecutive write errors, last: {last}")]
    WriteErrors { count: u32, last: RepoError },

    #[error("worker thread panicked")]
    Panicked,
}

impl WorkerFailure {
    pub fn is_provisioning(&self) -> bool {
        matches!(self, WorkerFailure::Provision(_))
    }
}

#[derive(Debug)]
pub enum WorkerExit {
    /// Matched. `recorded` is false when a sibling had already won.
    Succeeded {
        candidate: Candidate,
        ordinal: u64,
        recorded: bool,
    },
    Cancelled,
    Failed(WorkerFailure),
}

impl WorkerExit {
    pub fn state(&self) -> WorkerState {
        match self {
            WorkerExit::Succeeded { .. } => WorkerState::Succeeded,
            WorkerExit::Cancelled => WorkerState::Cancelled,
            WorkerExit::Failed(_) => WorkerState::Failed,
        }
    }
}

#[derive(Debug)]
pub struct WorkerReport {
    pub worker: usize,
    /// `None` when provisioning never produced a replica.
    pub location: Option<PathBuf>,
    pub attempts: u64,
    pub exit: WorkerExit,
}

impl WorkerReport {
    pub fn provision_failed(worker: usize, err: RepoError) -> Self {
        Self {
            worker,
            location: None,
            attempts: 0,
            exit: WorkerExit::Failed(WorkerFailure::Provision(err)),
        }
    }

    pub fn state(&self) -> WorkerState {
        self.exit.state()
    }

    /// True for the one report whose success was recorded as the result.
    pub fn is_winner(&self) -> bool {
        matches!(self.exit, WorkerExit::Succeeded { recorded: true, .. })
    }
}

/// A confirmed match, handed to the coordinator.
#[derive(Debug, Clone)]
pub struct Win {
    pub worker: usize,
    pub candidate: Candidate,
    pub location: PathBuf,
    pub ordinal: u64,
}

#[derive(Debug, Clone, Copy)]
pub struct WorkerPolicy {
    /// Emit a progress event every n attempts; 0 disables.
    pub log_every: u64,
    /// Fail after this many consecutive write errors; 0 never fails.
    pub max_consecutive_write_errors: u32,
}

impl Default for WorkerPolicy {
    fn default() -> Self {
        Self {
            log_every: 1_000,
            max_consecutive_write_errors: 10,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Worker {
    index: usize,
    runner: TrialRunner,
    policy: WorkerPolicy,
}

impl Worker {
    pub fn new(index: usize, runner: TrialRunner, policy: WorkerPolicy) -> Self {
        Self {
            index,
            runner,
            policy,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// Drive trials on `repo` until a terminal state.
    ///
    /// `on_success` is called at most once and returns whether this worker's
    /// win was recorded.
    pub fn run<R, F>(&self, repo: &mut R, state: &SearchState, on_success: F) -> WorkerReport
    where
        R: Repository + ?Sized,
        F: FnOnce(Win) -> bool,
    {
        let location = repo.location().to_path_buf();
        let mut ordinal = 0u64;
        let mut consecutive_errors = 0u32;

        let exit = loop {
            if state.stop().is_stopped() {
                tracing::debug!(worker = self.index, attempts = ordinal, "stop observed");
                break WorkerExit::Cancelled;
            }

            ordinal += 1;
            let started = Instant::now();
            let outcome = self.runner.run_one(repo, ordinal);
            let total = state.record_attempt();

            if outcome.accepted {
                let candidate = outcome.attempt.candidate;
                let recorded = on_success(Win {
                    worker: self.index,
                    candidate: candidate.clone(),
                    location: location.clone(),
                    ordinal,
                });
                tracing::info!(
                    worker = self.index,
                    %candidate,
                    ordinal,
                    recorded,
                    "prediction confirmed"
                );
                break WorkerExit::Succeeded {
                    candidate,
                    ordinal,
                    recorded,
                };
            }

            match outcome.write_error {
                None => consecutive_errors = 0,
                Some(err) => {
                    consecutive_errors += 1;
                    tracing::warn!(
                        worker = self.index,
                        ordinal,
                        consecutive = consecutive_errors,
                        "attempt failed: {err}"
                    );
                    let limit = self.policy.max_consecutive_write_errors;
                    if err.transience() != Transience::Retryable
                        || (limit != 0 && consecutive_errors >= limit)
                    {
                        break WorkerExit::Failed(WorkerFailure::WriteErrors {
                            count: consecutive_errors,
                            last: err,
                        });
                    }
                }
            }

            if self.policy.log_every != 0 && ordinal % self.policy.log_every == 0 {
                tracing::info!(
                    worker = self.index,
                    attempt = ordinal,
                    total,
                    elapsed = ?started.elapsed(),
                    "progress"
                );
            }
        };

        WorkerReport {
            worker: self.index,
            location: Some(location),
            attempts: ordinal,
            exit,
        }
    }
}
