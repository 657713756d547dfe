//! Fan-out of workers over isolated replicas, fan-in of the first match.
//!
//! Each worker thread provisions its own replica and runs until it wins, sees
//! the stop signal, or fails. The winner is elected by compare-and-set on the
//! shared `StopSignal`; only the elected worker sends on the bounded(1) result
//! channel, so the coordinator receives and persists exactly one result.

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam::channel::{self, Sender};

use super::error::{ProvisionFailure, SearchError};
use super::signal::SearchState;
use super::sink::ResultSink;
use super::trial::TrialRunner;
use super::worker::{Worker, WorkerExit, WorkerFailure, WorkerPolicy, WorkerReport};
use super::{SearchResult, SearchSummary};
use crate::git::{Provisioner, Repository};

pub struct SearchCoordinator<P> {
    provisioner: Arc<P>,
    runner: TrialRunner,
    policy: WorkerPolicy,
    state: Arc<SearchState>,
}

impl<P> SearchCoordinator<P>
where
    P: Provisioner + 'static,
{
    pub fn new(provisioner: P, runner: TrialRunner, policy: WorkerPolicy) -> Self {
        Self {
            provisioner: Arc::new(provisioner),
            runner,
            policy,
            state: Arc::new(SearchState::new()),
        }
    }

    pub fn provisioner(&self) -> &P {
        &self.provisioner
    }

    /// Shared state; signal handlers hook into `state().stop()`.
    pub fn state(&self) -> &Arc<SearchState> {
        &self.state
    }

    /// Run one search. Each call starts from an empty winner slot and a zero
    /// attempt count; a pending interrupt still cancels it.
    pub fn search(
        &mut self,
        worker_count: usize,
        sink: &dyn ResultSink,
    ) -> Result<SearchSummary, SearchError> {
        if worker_count == 0 {
            return Err(SearchError::InvalidWorkerCount);
        }
        self.state.begin();
        tracing::info!(workers = worker_count, "search started");

        let (result_tx, result_rx) = channel::bounded::<SearchResult>(1);
        let mut joins = Vec::with_capacity(worker_count);
        for index in 0..worker_count {
            match self.spawn_worker(index, result_tx.clone()) {
                Ok(join) => joins.push(join),
                Err(source) => {
                    self.state.stop().interrupt();
                    join_all(joins);
                    return Err(SearchError::Spawn {
                        worker: index,
                        source,
                    });
                }
            }
        }
        drop(result_tx);

        // Disconnects once every worker has exited without sending.
        let Ok(result) = result_rx.recv() else {
            return Err(self.no_winner(join_all(joins)));
        };

        tracing::info!(
            candidate = %result.candidate,
            worker = result.worker,
            location = %result.location.display(),
            "winner elected"
        );
        let persisted = sink.persist(&result);
        let workers = join_all(joins);
        tracing::info!(
            total_attempts = self.state.total_attempts(),
            elapsed = ?self.state.elapsed(),
            "all workers stopped"
        );

        match persisted {
            Ok(()) => Ok(SearchSummary { result, workers }),
            Err(source) => Err(SearchError::Persist { result, source }),
        }
    }

    fn spawn_worker(
        &self,
        index: usize,
        result_tx: Sender<SearchResult>,
    ) -> std::io::Result<JoinHandle<WorkerReport>> {
        let provisioner = Arc::clone(&self.provisioner);
        let state = Arc::clone(&self.state);
        let worker = Worker::new(index, self.runner.clone(), self.policy);

        thread::Builder::new()
            .name(format!("worker-{index}"))
            .spawn(move || {
                let span = tracing::info_span!("worker", index);
                let _guard = span.enter();

                let mut repo = match provisioner.provision(index) {
                    Ok(repo) => repo,
                    Err(err) => {
                        tracing::warn!("provisioning failed: {err}");
                        return WorkerReport::provision_failed(index, err);
                    }
                };
                tracing::info!(
                    location = %repo.location().display(),
                    branch = repo.branch(),
                    "replica ready"
                );

                let report = worker.run(&mut repo, &state, |win| {
                    if !state.stop().claim(win.worker) {
                        return false;
                    }
                    let result = SearchResult {
                        candidate: win.candidate,
                        worker: win.worker,
                        location: win.location,
                        ordinal: win.ordinal,
                        total_attempts: state.total_attempts(),
                        elapsed_ms: u64::try_from(state.elapsed().as_millis())
                            .unwrap_or(u64::MAX),
                    };
                    // Capacity 1 and a single elected sender: never blocks.
                    if result_tx.send(result).is_err() {
                        tracing::warn!("coordinator gone before result hand-off");
                    }
                    true
                });

                if !report.is_winner() {
                    provisioner.release(repo);
                }
                report
            })
    }

    fn no_winner(&self, reports: Vec<WorkerReport>) -> SearchError {
        if self.state.stop().is_interrupted() {
            return SearchError::Interrupted {
                attempts: self.state.total_attempts(),
            };
        }

        let all_provisioning = reports.iter().all(|report| {
            matches!(&report.exit, WorkerExit::Failed(failure) if failure.is_provisioning())
        });
        if !all_provisioning {
            return SearchError::Exhausted { reports };
        }

        let failures = reports
            .into_iter()
            .filter_map(|report| match report.exit {
                WorkerExit::Failed(WorkerFailure::Provision(error)) => Some(ProvisionFailure {
                    worker: report.worker,
                    error,
                }),
                _ => None,
            })
            .collect();
        SearchError::AllWorkersFailed { failures }
    }
}

fn join_all(joins: Vec<JoinHandle<WorkerReport>>) -> Vec<WorkerReport> {
    joins
        .into_iter()
        .enumerate()
        .map(|(index, join)| {
            join.join().unwrap_or_else(|_| {
                tracing::error!(worker = index, "worker panicked");
                WorkerReport {
                    worker: index,
                    location: None,
                    attempts: 0,
                    exit: WorkerExit::Failed(WorkerFailure::Panicked),
                }
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::candidate::{Alphabet, CandidateGenerator};
    use crate::test_harness::{MemorySink, Script, ScriptedProvisioner};

    fn coordinator(plans: Vec<Result<Script, String>>) -> SearchCoordinator<ScriptedProvisioner> {
        SearchCoordinator::new(
            ScriptedProvisioner::new(plans),
            TrialRunner::new(CandidateGenerator::hex(), 0),
            WorkerPolicy {
                log_every: 0,
                max_consecutive_write_errors: 5,
            },
        )
    }

    #[test]
    fn zero_workers_is_rejected() {
        let err = coordinator(vec![])
            .search(0, &MemorySink::new())
            .unwrap_err();
        assert!(matches!(err, SearchError::InvalidWorkerCount));
    }

    #[test]
    fn single_worker_is_the_sequential_variant() {
        let mut coordinator = coordinator(vec![Ok(Script::MatchOn(3))]);
        let sink = MemorySink::new();
        let summary = coordinator.search(1, &sink).expect("winner");
        assert_eq!(summary.result.worker, 0);
        assert_eq!(summary.result.ordinal, 3);
        assert_eq!(summary.result.total_attempts, 3);
        assert_eq!(sink.results(), vec![summary.result.clone()]);
        assert!(coordinator.provisioner().released().is_empty());
    }

    #[test]
    fn write_failures_everywhere_exhaust_the_search() {
        let mut coordinator = coordinator(vec![Ok(Script::FailCommits), Err("offline".into())]);
        let sink = MemorySink::new();
        let err = coordinator.search(2, &sink).unwrap_err();
        let SearchError::Exhausted { reports } = err else {
            panic!("expected exhaustion, got {err:?}");
        };
        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].attempts, 5);
        assert!(sink.results().is_empty());
    }

    #[test]
    fn persist_failure_still_reports_the_result() {
        let mut coordinator = coordinator(vec![Ok(Script::MatchOn(1))]);
        let err = coordinator.search(1, &MemorySink::failing()).unwrap_err();
        let SearchError::Persist { result, .. } = err else {
            panic!("expected persist error, got {err:?}");
        };
        assert_eq!(result.location, ScriptedProvisioner::location(0));
    }

    #[test]
    fn repeated_search_starts_from_a_clean_state() {
        let generator =
            CandidateGenerator::new(Alphabet::new("a").expect("alphabet"), 1).expect("generator");
        let mut coordinator = SearchCoordinator::new(
            ScriptedProvisioner::new(vec![Ok(Script::Fixed(
                "[main a] attempt 1: a".to_string(),
            ))]),
            TrialRunner::new(generator, 0),
            WorkerPolicy::default(),
        );
        let sink = MemorySink::new();

        let first = coordinator.search(1, &sink).expect("first winner");
        let second = coordinator.search(1, &sink).expect("second winner");

        assert_eq!(first.result.ordinal, 1);
        assert_eq!(second.result.ordinal, 1);
        assert_eq!(second.result.total_attempts, 1);
        assert!(second.workers[0].is_winner());
        assert_eq!(sink.results().len(), 2);
    }

    #[test]
    fn interrupt_before_start_cancels_every_worker() {
        let mut coordinator = coordinator(vec![Ok(Script::Never), Ok(Script::Never)]);
        coordinator.state().stop().interrupt();
        let err = coordinator.search(2, &MemorySink::new()).unwrap_err();
        assert!(matches!(err, SearchError::Interrupted { attempts: 0 }));
        assert_eq!(coordinator.provisioner().released().len(), 2);
    }
}
