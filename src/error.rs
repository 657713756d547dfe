use thiserror::Error;

use crate::candidate::CandidateError;
use crate::config::ConfigError;
use crate::git::RepoError;
use crate::search::{SearchError, SinkError};

/// Whether retrying this operation may succeed.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Transience {
    /// Retry will never help without changing inputs/state.
    Permanent,
    /// Retry may help (transient contention/outage).
    Retryable,
    /// Unknown if retry will help.
    Unknown,
}

impl Transience {
    pub fn is_retryable(self) -> bool {
        matches!(self, Transience::Retryable)
    }
}

/// What we know about side effects when an error is returned.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Effect {
    /// Definitely no side effects occurred.
    None,
    /// Side effects definitely occurred (locally or remotely).
    Some,
    /// We don't know if side effects occurred.
    Unknown,
}

impl Effect {
    pub fn as_str(self) -> &'static str {
        match self {
            Effect::None => "none",
            Effect::Some => "some",
            Effect::Unknown => "unknown",
        }
    }
}

/// Crate-level convenience error over the per-module errors.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Candidate(#[from] CandidateError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Repo(#[from] RepoError),

    #[error(transparent)]
    Search(#[from] SearchError),

    #[error(transparent)]
    Sink(#[from] SinkError),
}

impl Error {
    pub fn transience(&self) -> Transience {
        match self {
            Error::Candidate(e) => e.transience(),
            Error::Config(e) => e.transience(),
            Error::Repo(e) => e.transience(),
            Error::Search(e) => e.transience(),
            Error::Sink(e) => e.transience(),
        }
    }

    pub fn effect(&self) -> Effect {
        match self {
            Error::Candidate(e) => e.effect(),
            Error::Config(e) => e.effect(),
            Error::Repo(e) => e.effect(),
            Error::Search(e) => e.effect(),
            Error::Sink(e) => e.effect(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
