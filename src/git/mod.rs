//! Git integration module.
//!
//! Provides:
//! - `Repository`: one exclusively owned replica of the log
//! - `GitRepo` / `GitProvisioner`: replicas driven through the `git` binary
//! - Error taxonomy for provisioning, writes and maintenance

pub mod command;
pub mod error;
pub mod provision;
pub mod repo;

pub use command::{ABBREV_RANGE, GitCommand};
pub use error::{CommandError, RepoError, RepoOp};
pub use provision::{GitProvisioner, Provisioner, ReplicaSource};
pub use repo::{GitRepo, Repository};
