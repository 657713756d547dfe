//! Replica provisioning.
//!
//! Each worker gets its own replica at its own location. Provisioning runs on
//! the worker's thread, so a slow clone only delays that worker.

use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use super::command::GitCommand;
use super::error::RepoError;
use super::repo::{GitRepo, Repository};

/// Creates and disposes of per-worker replicas.
pub trait Provisioner: Send + Sync {
    type Repo: Repository + 'static;

    /// Create the replica for `worker`. Distinct workers get distinct locations.
    fn provision(&self, worker: usize) -> Result<Self::Repo, RepoError>;

    /// Called with every replica that did not produce the winning record.
    fn release(&self, _repo: Self::Repo) {}
}

/// Where replicas come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplicaSource {
    /// Clone a canonical remote once per worker.
    Clone { remote: String },
    /// Initialise an empty repository with one seed commit per worker.
    Fresh,
    /// Search directly in an existing repository. Single worker only.
    InPlace { path: PathBuf },
}

#[derive(Debug, Clone)]
pub struct GitProvisioner {
    git: GitCommand,
    source: ReplicaSource,
    root: PathBuf,
    branch: Option<String>,
    keep: bool,
}

impl GitProvisioner {
    pub fn new(git: GitCommand, source: ReplicaSource, root: PathBuf) -> Self {
        Self {
            git,
            source,
            root,
            branch: None,
            keep: false,
        }
    }

    pub fn with_branch(mut self, branch: Option<String>) -> Self {
        self.branch = branch;
        self
    }

    pub fn keep_replicas(mut self, keep: bool) -> Self {
        self.keep = keep;
        self
    }

    /// Per-run directory under `base`, named after the start time.
    pub fn run_root(base: &Path, started: SystemTime) -> PathBuf {
        let secs = started
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        base.join(secs.to_string())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn replica_path(&self, worker: usize) -> PathBuf {
        self.root.join(format!("{worker}-replica"))
    }

    fn prepare(&self, location: &Path) -> Result<(), RepoError> {
        if location.exists() {
            return Err(RepoError::provision(location, "location already exists"));
        }
        fs::create_dir_all(&self.root)
            .map_err(|e| RepoError::provision(location, format!("create {}: {e}", self.root.display())))
    }

    fn clone_from(&self, remote: &str, location: &Path) -> Result<(), RepoError> {
        self.prepare(location)?;
        self.git
            .run_here([
                OsStr::new("clone"),
                OsStr::new("--quiet"),
                OsStr::new(remote),
                location.as_os_str(),
            ])
            .map(|_| ())
            .map_err(|e| RepoError::provision(location, format!("clone {remote}: {e}")))
    }

    fn init_fresh(&self, location: &Path) -> Result<(), RepoError> {
        self.prepare(location)?;
        fs::create_dir_all(location)
            .map_err(|e| RepoError::provision(location, format!("create: {e}")))?;
        let mut init = vec!["init", "--quiet"];
        if let Some(branch) = self.branch.as_deref() {
            init.extend(["--initial-branch", branch]);
        }
        self.git
            .run(location, init)
            .map_err(|e| RepoError::provision(location, format!("init: {e}")))?;
        self.git
            .run(location, ["commit", "--allow-empty", "--quiet", "-m", "seed"])
            .map(|_| ())
            .map_err(|e| RepoError::provision(location, format!("seed commit: {e}")))
    }
}

impl Provisioner for GitProvisioner {
    type Repo = GitRepo;

    fn provision(&self, worker: usize) -> Result<GitRepo, RepoError> {
        let location = match &self.source {
            ReplicaSource::InPlace { path } => {
                if worker != 0 {
                    return Err(RepoError::provision(
                        path,
                        format!("in-place replica is reserved for worker 0, not {worker}"),
                    ));
                }
                path.clone()
            }
            ReplicaSource::Clone { remote } => {
                let location = self.replica_path(worker);
                self.clone_from(remote, &location)?;
                location
            }
            ReplicaSource::Fresh => {
                let location = self.replica_path(worker);
                self.init_fresh(&location)?;
                location
            }
        };
        GitRepo::open(self.git.clone(), location, self.branch.clone())
    }

    fn release(&self, repo: GitRepo) {
        if self.keep || matches!(self.source, ReplicaSource::InPlace { .. }) {
            return;
        }
        let location = repo.location().to_path_buf();
        drop(repo);
        match fs::remove_dir_all(&location) {
            Ok(()) => tracing::debug!(location = %location.display(), "replica removed"),
            Err(err) => {
                tracing::warn!(location = %location.display(), "failed to remove replica: {err}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::time::Duration;

    #[test]
    fn replica_paths_are_distinct_per_worker() {
        let provisioner = GitProvisioner::new(
            GitCommand::default(),
            ReplicaSource::Fresh,
            PathBuf::from("/tmp/runs/42"),
        );
        assert_eq!(
            provisioner.replica_path(0),
            PathBuf::from("/tmp/runs/42/0-replica")
        );
        assert_ne!(provisioner.replica_path(1), provisioner.replica_path(2));
    }

    #[test]
    fn run_root_uses_unix_seconds() {
        let started = UNIX_EPOCH + Duration::from_secs(1_700_000_000);
        assert_eq!(
            GitProvisioner::run_root(Path::new("clones"), started),
            PathBuf::from("clones/1700000000")
        );
    }

    #[test]
    fn in_place_refuses_second_worker() {
        let dir = tempfile::tempdir().expect("tempdir");
        let provisioner = GitProvisioner::new(
            GitCommand::default(),
            ReplicaSource::InPlace {
                path: dir.path().to_path_buf(),
            },
            dir.path().join("unused"),
        );
        let err = provisioner.provision(1).expect_err("worker 1 must not share");
        assert!(err.is_provisioning());
        assert!(err.to_string().contains("reserved for worker 0"), "{err}");
    }

    #[test]
    fn existing_location_is_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let provisioner =
            GitProvisioner::new(GitCommand::default(), ReplicaSource::Fresh, dir.path().into());
        fs::create_dir_all(provisioner.replica_path(0)).expect("mkdir");
        let err = provisioner.provision(0).expect_err("stale replica");
        assert!(err.to_string().contains("already exists"), "{err}");
    }
}
