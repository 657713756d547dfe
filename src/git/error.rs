//! Git replica error types.

use std::path::PathBuf;

use thiserror::Error;

use crate::error::{Effect, Transience};

/// A single `git` invocation that did not complete successfully.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum CommandError {
    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("exited with {}: {output}", exit_label(.code))]
    Exit { code: Option<i32>, output: String },

    #[error("non-UTF-8 output: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("status {code}"),
        None => "signal".to_string(),
    }
}

/// Which replica operation failed.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum RepoOp {
    Commit,
    Undo,
}

impl RepoOp {
    pub fn as_str(self) -> &'static str {
        match self {
            RepoOp::Commit => "commit",
            RepoOp::Undo => "undo",
        }
    }
}

/// Errors raised by a replica of the log.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum RepoError {
    /// Replica setup failed; the worker never starts its loop.
    #[error("failed to provision replica at {}: {reason}", location.display())]
    Provision { location: PathBuf, reason: String },

    /// An individual commit or undo could not be executed.
    #[error("{} failed in {}: {source}", op.as_str(), location.display())]
    Write {
        op: RepoOp,
        location: PathBuf,
        #[source]
        source: CommandError,
    },

    /// Garbage collection failed. Never fatal to a search.
    #[error("gc failed in {}: {source}", location.display())]
    Maintenance {
        location: PathBuf,
        #[source]
        source: CommandError,
    },
}

impl RepoError {
    pub fn provision(location: impl Into<PathBuf>, reason: impl std::fmt::Display) -> Self {
        RepoError::Provision {
            location: location.into(),
            reason: reason.to_string(),
        }
    }

    /// Whether retrying on the same replica may succeed.
    pub fn transience(&self) -> Transience {
        match self {
            RepoError::Provision { .. } => Transience::Permanent,
            RepoError::Write { .. } | RepoError::Maintenance { .. } => Transience::Retryable,
        }
    }

    /// What we know about side effects when this error is returned.
    pub fn effect(&self) -> Effect {
        match self {
            // A commit may have written a record before the process failed.
            RepoError::Provision { .. } | RepoError::Write { .. } => Effect::Unknown,
            RepoError::Maintenance { .. } => Effect::None,
        }
    }

    pub fn is_provisioning(&self) -> bool {
        matches!(self, RepoError::Provision { .. })
    }
}
