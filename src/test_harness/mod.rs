//! Scripted replicas and sinks for exercising the search without git.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::git::{CommandError, Provisioner, RepoError, RepoOp, Repository};
use crate::search::SearchResult;
use crate::search::sink::{ResultSink, SinkError};
use crate::search::trial::predicted_summary;

/// How a scripted replica answers `commit`.
#[derive(Debug, Clone)]
pub enum Script {
    /// Never confirm a prediction.
    Never,
    /// Confirm the prediction on the n-th commit call (1-based).
    MatchOn(u64),
    /// Always return this text.
    Fixed(String),
    /// Every commit fails to execute.
    FailCommits,
}

/// Counters recorded by a [`ScriptedRepo`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepoLog {
    pub commits: u64,
    pub undos: u64,
    pub compactions: u64,
    /// Records above the base; mirrors how far the head has moved.
    pub depth: u64,
    pub messages: Vec<String>,
}

type CommitHook = Box<dyn FnMut(u64) + Send>;

pub struct ScriptedRepo {
    location: PathBuf,
    branch: String,
    script: Script,
    log: Arc<Mutex<RepoLog>>,
    fail_compaction: bool,
    hook: Option<CommitHook>,
}

impl ScriptedRepo {
    pub fn new(location: impl Into<PathBuf>, branch: &str, script: Script) -> Self {
        Self {
            location: location.into(),
            branch: branch.to_string(),
            script,
            log: Arc::new(Mutex::new(RepoLog::default())),
            fail_compaction: false,
            hook: None,
        }
    }

    pub fn failing_compaction(mut self) -> Self {
        self.fail_compaction = true;
        self
    }

    /// Run `hook(call)` before every commit.
    pub fn with_commit_hook(mut self, hook: impl FnMut(u64) + Send + 'static) -> Self {
        self.hook = Some(Box::new(hook));
        self
    }

    pub fn log(&self) -> RepoLog {
        lock(&self.log).clone()
    }

    fn command_error(&self, what: &str) -> CommandError {
        CommandError::Exit {
            code: Some(128),
            output: format!("scripted {what} failure"),
        }
    }
}

impl Repository for ScriptedRepo {
    fn location(&self) -> &Path {
        &self.location
    }

    fn branch(&self) -> &str {
        &self.branch
    }

    fn commit(&mut self, message: &str) -> Result<String, RepoError> {
        let call = {
            let mut log = lock(&self.log);
            log.commits += 1;
            log.messages.push(message.to_string());
            log.commits
        };
        if let Some(hook) = self.hook.as_mut() {
            hook(call);
        }
        let text = match &self.script {
            Script::Fixed(text) => text.clone(),
            Script::MatchOn(n) if *n == call => {
                let candidate = message
                    .rsplit_once(": ")
                    .map(|(_, candidate)| candidate)
                    .unwrap_or_default();
                predicted_summary(&self.branch, candidate, message)
            }
            Script::Never | Script::MatchOn(_) => format!("[{} no-match] {message}", self.branch),
            Script::FailCommits => {
                return Err(RepoError::Write {
                    op: RepoOp::Commit,
                    location: self.location.clone(),
                    source: self.command_error("commit"),
                });
            }
        };
        lock(&self.log).depth += 1;
        Ok(text)
    }

    fn undo_last(&mut self) -> Result<(), RepoError> {
        let mut log = lock(&self.log);
        log.undos += 1;
        log.depth = 0;
        Ok(())
    }

    fn compact(&mut self) -> Result<(), RepoError> {
        lock(&self.log).compactions += 1;
        if self.fail_compaction {
            return Err(RepoError::Maintenance {
                location: self.location.clone(),
                source: self.command_error("gc"),
            });
        }
        Ok(())
    }
}

/// Hands out one scripted replica per worker.
pub struct ScriptedProvisioner {
    plans: Vec<Result<Script, String>>,
    logs: Vec<Arc<Mutex<RepoLog>>>,
    released: Mutex<Vec<PathBuf>>,
}

impl ScriptedProvisioner {
    /// `plans[i]` is worker i's script, or the reason its provisioning fails.
    pub fn new(plans: Vec<Result<Script, String>>) -> Self {
        let logs = plans
            .iter()
            .map(|_| Arc::new(Mutex::new(RepoLog::default())))
            .collect();
        Self {
            plans,
            logs,
            released: Mutex::new(Vec::new()),
        }
    }

    pub fn location(worker: usize) -> PathBuf {
        PathBuf::from(format!("stub-{worker}"))
    }

    pub fn log(&self, worker: usize) -> RepoLog {
        lock(&self.logs[worker]).clone()
    }

    pub fn released(&self) -> Vec<PathBuf> {
        let mut released = lock(&self.released).clone();
        released.sort();
        released
    }
}

impl Provisioner for ScriptedProvisioner {
    type Repo = ScriptedRepo;

    fn provision(&self, worker: usize) -> Result<ScriptedRepo, RepoError> {
        let location = Self::location(worker);
        match self.plans.get(worker) {
            Some(Ok(script)) => {
                let mut repo = ScriptedRepo::new(location, "main", script.clone());
                repo.log = Arc::clone(&self.logs[worker]);
                Ok(repo)
            }
            Some(Err(reason)) => Err(RepoError::provision(location, reason)),
            None => Err(RepoError::provision(location, "no plan for worker")),
        }
    }

    fn release(&self, repo: ScriptedRepo) {
        lock(&self.released).push(repo.location);
    }
}

/// Collects persisted results in memory.
#[derive(Default)]
pub struct MemorySink {
    results: Mutex<Vec<SearchResult>>,
    fail: bool,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            results: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn results(&self) -> Vec<SearchResult> {
        lock(&self.results).clone()
    }
}

impl ResultSink for MemorySink {
    fn persist(&self, result: &SearchResult) -> Result<(), SinkError> {
        if self.fail {
            return Err(SinkError::Write {
                path: PathBuf::from("memory"),
                source: std::io::Error::other("scripted sink failure"),
            });
        }
        lock(&self.results).push(result.clone());
        Ok(())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
