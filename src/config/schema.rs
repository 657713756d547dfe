use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::candidate::{Alphabet, CandidateError, CandidateGenerator, DEFAULT_LENGTH, HEX_ALPHABET};
use crate::git::{ABBREV_RANGE, GitCommand, ReplicaSource};
use crate::search::WorkerPolicy;

use super::ConfigError;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub search: SearchConfig,
    pub replicas: ReplicaConfig,
    pub output: OutputConfig,
    pub logging: LoggingConfig,
}

impl Config {
    /// Reject search parameters a git replica can never confirm.
    pub fn validate_for_git(&self) -> Result<(), ConfigError> {
        let search = &self.search;
        if let Some(symbol) = search
            .alphabet
            .chars()
            .find(|symbol| !HEX_ALPHABET.contains(*symbol))
        {
            return Err(ConfigError::Invalid {
                field: "search.alphabet",
                reason: format!("{symbol:?} never appears in a git short id"),
            });
        }
        if !ABBREV_RANGE.contains(&search.candidate_length) {
            return Err(ConfigError::Invalid {
                field: "search.candidate_length",
                reason: format!(
                    "git short ids are {} to {} characters, got {}",
                    ABBREV_RANGE.start(),
                    ABBREV_RANGE.end(),
                    search.candidate_length
                ),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub workers: usize,
    pub log_every: u64,
    pub compact_every: u64,
    pub max_consecutive_write_errors: u32,
    pub alphabet: String,
    pub candidate_length: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            workers: 1,
            log_every: 1_000,
            compact_every: 100,
            max_consecutive_write_errors: 10,
            alphabet: HEX_ALPHABET.to_string(),
            candidate_length: DEFAULT_LENGTH,
        }
    }
}

impl SearchConfig {
    pub fn generator(&self) -> Result<CandidateGenerator, CandidateError> {
        CandidateGenerator::new(Alphabet::new(&self.alphabet)?, self.candidate_length)
    }

    pub fn worker_policy(&self) -> WorkerPolicy {
        WorkerPolicy {
            log_every: self.log_every,
            max_consecutive_write_errors: self.max_consecutive_write_errors,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Clone,
    Fresh,
    InPlace,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplicaConfig {
    pub source: SourceKind,
    /// Canonical remote for `clone`.
    pub remote: Option<String>,
    /// Parent of per-run replica directories (default: data dir `clones/`).
    pub root: Option<PathBuf>,
    /// Existing repository for `in_place` (default: current directory).
    pub path: Option<PathBuf>,
    /// Overrides branch detection.
    pub branch: Option<String>,
    pub git: PathBuf,
    /// Force git's abbreviation length to the candidate length.
    pub pin_abbrev: bool,
    pub author_name: Option<String>,
    pub author_email: Option<String>,
    /// Keep replicas that did not win.
    pub keep: bool,
}

impl Default for ReplicaConfig {
    fn default() -> Self {
        Self {
            source: SourceKind::Clone,
            remote: None,
            root: None,
            path: None,
            branch: None,
            git: PathBuf::from("git"),
            pin_abbrev: true,
            author_name: None,
            author_email: None,
            keep: false,
        }
    }
}

impl ReplicaConfig {
    pub fn replica_source(&self) -> Result<ReplicaSource, ConfigError> {
        match self.source {
            SourceKind::Clone => match self.remote.as_deref().map(str::trim) {
                Some(remote) if !remote.is_empty() => Ok(ReplicaSource::Clone {
                    remote: remote.to_string(),
                }),
                _ => Err(ConfigError::Invalid {
                    field: "replicas.remote",
                    reason: "required when replicas.source = \"clone\"".to_string(),
                }),
            },
            SourceKind::Fresh => Ok(ReplicaSource::Fresh),
            SourceKind::InPlace => Ok(ReplicaSource::InPlace {
                path: self.path.clone().unwrap_or_else(|| PathBuf::from(".")),
            }),
        }
    }

    pub fn root_dir(&self) -> PathBuf {
        self.root.clone().unwrap_or_else(crate::paths::clones_dir)
    }

    pub fn git_command(&self, candidate_length: usize) -> GitCommand {
        let mut git = GitCommand::new(&self.git);
        if self.pin_abbrev {
            git = git.with_override("core.abbrev", candidate_length.to_string());
        }
        if let Some(name) = &self.author_name {
            git = git.with_override("user.name", name);
        }
        if let Some(email) = &self.author_email {
            git = git.with_override("user.email", email);
        }
        git
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub result_path: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            result_path: PathBuf::from("lucky-sha.json"),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Tree,
    Pretty,
    Compact,
    Json,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogRotation {
    Daily,
    Hourly,
    Minutely,
    Never,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub stdout: bool,
    pub stdout_format: LogFormat,
    pub filter: Option<String>,
    pub file: FileLoggingConfig,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            stdout: true,
            stdout_format: LogFormat::Compact,
            filter: None,
            file: FileLoggingConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileLoggingConfig {
    pub enabled: bool,
    pub dir: Option<PathBuf>,
    pub format: LogFormat,
    pub rotation: LogRotation,
}

impl Default for FileLoggingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            dir: None,
            format: LogFormat::Json,
            rotation: LogRotation::Daily,
        }
    }
}

// =============================================================================
// Override layers (user file, project file)
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ConfigLayer {
    pub search: SearchConfigOverride,
    pub replicas: ReplicaConfigOverride,
    pub output: OutputConfigOverride,
    pub logging: LoggingConfigOverride,
}

impl ConfigLayer {
    pub fn apply_to(&self, base: &mut Config) {
        self.search.apply_to(&mut base.search);
        self.replicas.apply_to(&mut base.replicas);
        self.output.apply_to(&mut base.output);
        self.logging.apply_to(&mut base.logging);
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SearchConfigOverride {
    pub workers: Option<usize>,
    pub log_every: Option<u64>,
    pub compact_every: Option<u64>,
    pub max_consecutive_write_errors: Option<u32>,
    pub alphabet: Option<String>,
    pub candidate_length: Option<usize>,
}

impl SearchConfigOverride {
    pub fn apply_to(&self, target: &mut SearchConfig) {
        if let Some(workers) = self.workers {
            target.workers = workers;
        }
        if let Some(log_every) = self.log_every {
            target.log_every = log_every;
        }
        if let Some(compact_every) = self.compact_every {
            target.compact_every = compact_every;
        }
        if let Some(limit) = self.max_consecutive_write_errors {
            target.max_consecutive_write_errors = limit;
        }
        if let Some(alphabet) = self.alphabet.as_ref() {
            target.alphabet = alphabet.clone();
        }
        if let Some(length) = self.candidate_length {
            target.candidate_length = length;
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ReplicaConfigOverride {
    pub source: Option<SourceKind>,
    pub remote: Option<String>,
    pub root: Option<PathBuf>,
    pub path: Option<PathBuf>,
    pub branch: Option<String>,
    pub git: Option<PathBuf>,
    pub pin_abbrev: Option<bool>,
    pub author_name: Option<String>,
    pub author_email: Option<String>,
    pub keep: Option<bool>,
}

impl ReplicaConfigOverride {
    pub fn apply_to(&self, target: &mut ReplicaConfig) {
        if let Some(source) = self.source {
            target.source = source;
        }
        if let Some(remote) = self.remote.as_ref() {
            target.remote = Some(remote.clone());
        }
        if let Some(root) = self.root.as_ref() {
            target.root = Some(root.clone());
        }
        if let Some(path) = self.path.as_ref() {
            target.path = Some(path.clone());
        }
        if let Some(branch) = self.branch.as_ref() {
            target.branch = Some(branch.clone());
        }
        if let Some(git) = self.git.as_ref() {
            target.git = git.clone();
        }
        if let Some(pin) = self.pin_abbrev {
            target.pin_abbrev = pin;
        }
        if let Some(name) = self.author_name.as_ref() {
            target.author_name = Some(name.clone());
        }
        if let Some(email) = self.author_email.as_ref() {
            target.author_email = Some(email.clone());
        }
        if let Some(keep) = self.keep {
            target.keep = keep;
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct OutputConfigOverride {
    pub result_path: Option<PathBuf>,
}

impl OutputConfigOverride {
    pub fn apply_to(&self, target: &mut OutputConfig) {
        if let Some(path) = self.result_path.as_ref() {
            target.result_path = path.clone();
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct LoggingConfigOverride {
    pub stdout: Option<bool>,
    pub stdout_format: Option<LogFormat>,
    pub filter: Option<String>,
    pub file: Option<FileLoggingConfigOverride>,
}

impl LoggingConfigOverride {
    pub fn apply_to(&self, target: &mut LoggingConfig) {
        if let Some(stdout) = self.stdout {
            target.stdout = stdout;
        }
        if let Some(format) = self.stdout_format {
            target.stdout_format = format;
        }
        if let Some(filter) = self.filter.as_ref() {
            target.filter = Some(filter.clone());
        }
        if let Some(file) = self.file.as_ref() {
            file.apply_to(&mut target.file);
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct FileLoggingConfigOverride {
    pub enabled: Option<bool>,
    pub dir: Option<PathBuf>,
    pub format: Option<LogFormat>,
    pub rotation: Option<LogRotation>,
}

impl FileLoggingConfigOverride {
    pub fn apply_to(&self, target: &mut FileLoggingConfig) {
        if let Some(enabled) = self.enabled {
            target.enabled = enabled;
        }
        if let Some(dir) = self.dir.as_ref() {
            target.dir = Some(dir.clone());
        }
        if let Some(format) = self.format {
            target.format = format;
        }
        if let Some(rotation) = self.rotation {
            target.rotation = rotation;
        }
    }
}
