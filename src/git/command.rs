//! Thin wrapper over the `git` executable.
//!
//! Every replica operation is one blocking child process. Output is returned
//! as text with a single trailing line terminator removed and nothing else
//! touched, because callers compare it byte for byte.

use std::ffi::OsStr;
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use super::error::CommandError;

/// Lengths git accepts for `core.abbrev` and ever prints as a short id.
pub const ABBREV_RANGE: RangeInclusive<usize> = 4..=40;

#[derive(Debug, Clone)]
pub struct GitCommand {
    program: PathBuf,
    /// `-c key=value` pairs passed to every invocation.
    overrides: Vec<(String, String)>,
}

impl GitCommand {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            overrides: Vec::new(),
        }
    }

    pub fn with_override(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.overrides.push((key.into(), value.into()));
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Run `git -C <dir> <args>`.
    pub fn run<I, S>(&self, dir: &Path, args: I) -> Result<String, CommandError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.invoke(Some(dir), args)
    }

    /// Run git from the current directory (used by `clone`).
    pub fn run_here<I, S>(&self, args: I) -> Result<String, CommandError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.invoke(None, args)
    }

    fn invoke<I, S>(&self, dir: Option<&Path>, args: I) -> Result<String, CommandError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let mut cmd = Command::new(&self.program);
        if let Some(dir) = dir {
            cmd.arg("-C").arg(dir);
        }
        for (key, value) in &self.overrides {
            cmd.arg("-c").arg(format!("{key}={value}"));
        }
        cmd.args(args);
        cmd.env("GIT_TERMINAL_PROMPT", "0");
        tracing::trace!(?cmd, "git");

        let output = cmd.output().map_err(|source| CommandError::Spawn {
            program: self.program.display().to_string(),
            source,
        })?;
        finish(output)
    }
}

impl Default for GitCommand {
    fn default() -> Self {
        Self::new("git")
    }
}

fn finish(output: Output) -> Result<String, CommandError> {
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let text = if stderr.trim().is_empty() {
            String::from_utf8_lossy(&output.stdout)
        } else {
            stderr
        };
        return Err(CommandError::Exit {
            code: output.status.code(),
            output: text.trim().to_string(),
        });
    }
    Ok(chomp(String::from_utf8(output.stdout)?))
}

/// Strip exactly one trailing `\n` (or `\r\n`).
pub(crate) fn chomp(mut text: String) -> String {
    if text.ends_with('\n') {
        text.pop();
        if text.ends_with('\r') {
            text.pop();
        }
    }
    text
}
