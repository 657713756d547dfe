//! One replica of the log.

use std::path::{Path, PathBuf};

use super::command::GitCommand;
use super::error::{CommandError, RepoError, RepoOp};

/// Exclusive handle to one replica.
///
/// Handles are moved onto a single worker thread and never shared, so
/// methods take `&mut self` and no internal locking is needed.
pub trait Repository: Send {
    /// Identifies the replica in results and logs.
    fn location(&self) -> &Path;

    /// Branch name the log prints in its commit confirmation.
    fn branch(&self) -> &str;

    /// Append an empty record with `message` and return the log's confirmation
    /// text verbatim.
    fn commit(&mut self, message: &str) -> Result<String, RepoError>;

    /// Discard the record written by the preceding `commit`.
    fn undo_last(&mut self) -> Result<(), RepoError>;

    /// Reclaim storage held by discarded records.
    fn compact(&mut self) -> Result<(), RepoError>;
}

impl<R: Repository + ?Sized> Repository for Box<R> {
    fn location(&self) -> &Path {
        (**self).location()
    }

    fn branch(&self) -> &str {
        (**self).branch()
    }

    fn commit(&mut self, message: &str) -> Result<String, RepoError> {
        (**self).commit(message)
    }

    fn undo_last(&mut self) -> Result<(), RepoError> {
        (**self).undo_last()
    }

    fn compact(&mut self) -> Result<(), RepoError> {
        (**self).compact()
    }
}

/// Replica backed by a git working tree, driven through the `git` binary.
#[derive(Debug)]
pub struct GitRepo {
    git: GitCommand,
    location: PathBuf,
    branch: String,
    /// Head at open time. Every rejected attempt rewinds here.
    base: String,
}

impl GitRepo {
    /// Open an existing working tree that has at least one commit.
    ///
    /// `branch` overrides detection via `git symbolic-ref`.
    pub fn open(
        git: GitCommand,
        location: PathBuf,
        branch: Option<String>,
    ) -> Result<Self, RepoError> {
        let base = git
            .run(&location, ["rev-parse", "--verify", "HEAD"])
            .map_err(|e| RepoError::provision(&location, format!("no head commit: {e}")))?;
        let branch = match branch {
            Some(branch) => branch,
            None => git
                .run(&location, ["symbolic-ref", "--short", "HEAD"])
                .map_err(|e| RepoError::provision(&location, format!("detached head: {e}")))?,
        };
        tracing::debug!(location = %location.display(), %branch, %base, "replica opened");
        Ok(Self {
            git,
            location,
            branch,
            base,
        })
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    /// Current head identifier.
    pub fn head(&self) -> Result<String, CommandError> {
        self.git.run(&self.location, ["rev-parse", "HEAD"])
    }

    fn write_error(&self, op: RepoOp, source: CommandError) -> RepoError {
        RepoError::Write {
            op,
            location: self.location.clone(),
            source,
        }
    }
}

impl Repository for GitRepo {
    fn location(&self) -> &Path {
        &self.location
    }

    fn branch(&self) -> &str {
        &self.branch
    }

    fn commit(&mut self, message: &str) -> Result<String, RepoError> {
        self.git
            .run(&self.location, ["commit", "--allow-empty", "-m", message])
            .map_err(|e| self.write_error(RepoOp::Commit, e))
    }

    // Resetting to the recorded base rather than `HEAD~` is the same move after
    // a successful commit, and a no-op when the commit never landed.
    fn undo_last(&mut self) -> Result<(), RepoError> {
        self.git
            .run(&self.location, ["reset", "--hard", "--quiet", &self.base])
            .map(|_| ())
            .map_err(|e| self.write_error(RepoOp::Undo, e))
    }

    fn compact(&mut self) -> Result<(), RepoError> {
        self.git
            .run(&self.location, ["gc", "--quiet"])
            .map(|_| ())
            .map_err(|source| RepoError::Maintenance {
                location: self.location.clone(),
                source,
            })
    }
}
