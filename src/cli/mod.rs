//! CLI surface for lucky-sha.
//!
//! Thin handlers over the library: flags become a config layer applied on top
//! of defaults, user file, project file and environment.

use std::ffi::OsString;
use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand, builder::BoolishValueParser};

use crate::config::{Config, SourceKind};
use crate::search::SearchError;
use crate::{Error, Result};

mod commands;
mod render;

pub use render::{error_lines, success_line};

/// Exit status for a run stopped by SIGINT/SIGTERM.
pub const EXIT_INTERRUPTED: i32 = 130;

// =============================================================================
// Entry + global options
// =============================================================================

#[derive(Parser, Debug)]
#[command(
    name = "lucky-sha",
    version,
    about = "Search for a commit whose short id equals the id it announces",
    infer_subcommands = true,
    infer_long_args = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Errors only.
    #[arg(
        short = 'q',
        long,
        global = true,
        default_value_t = false,
        num_args = 0..=1,
        value_parser = BoolishValueParser::new()
    )]
    pub quiet: bool,

    /// Debug output (repeat for more).
    #[arg(short = 'v', long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the search until one worker finds a lucky commit.
    #[command(alias = "run")]
    Search(SearchArgs),

    /// Print the effective configuration.
    Config(ConfigArgs),
}

#[derive(Args, Debug, Default, Clone)]
pub struct SearchArgs {
    /// Number of parallel workers.
    #[arg(short = 'w', long, value_name = "N")]
    pub workers: Option<usize>,

    /// Progress line every N attempts per worker (0 disables).
    #[arg(short = 'l', long, value_name = "N")]
    pub log_every: Option<u64>,

    /// Remote to clone replicas from.
    #[arg(long, value_name = "URL")]
    pub remote: Option<String>,

    /// Where replicas come from: clone, fresh, in-place.
    #[arg(long, value_name = "SOURCE", value_parser = parse_source)]
    pub source: Option<SourceKind>,

    /// Parent directory for per-run replica directories.
    #[arg(long, value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// Repository to search in with `--source in-place`.
    #[arg(long, value_name = "DIR")]
    pub path: Option<PathBuf>,

    /// Branch name to expect in commit summaries.
    #[arg(long, value_name = "NAME")]
    pub branch: Option<String>,

    /// Run `git gc` every N failed attempts (0 disables).
    #[arg(long, value_name = "N")]
    pub compact_every: Option<u64>,

    /// Keep replicas that did not win.
    #[arg(long)]
    pub keep: bool,

    /// Where to write the result JSON.
    #[arg(long, value_name = "PATH")]
    pub result: Option<PathBuf>,
}

impl SearchArgs {
    /// Highest-precedence config layer.
    pub fn apply_to(&self, config: &mut Config) {
        if let Some(workers) = self.workers {
            config.search.workers = workers;
        }
        if let Some(every) = self.log_every {
            config.search.log_every = every;
        }
        if let Some(every) = self.compact_every {
            config.search.compact_every = every;
        }
        if let Some(remote) = self.remote.as_ref() {
            config.replicas.remote = Some(remote.clone());
        }
        if let Some(source) = self.source {
            config.replicas.source = source;
        }
        if let Some(root) = self.root.as_ref() {
            config.replicas.root = Some(root.clone());
        }
        if let Some(path) = self.path.as_ref() {
            config.replicas.path = Some(path.clone());
        }
        if let Some(branch) = self.branch.as_ref() {
            config.replicas.branch = Some(branch.clone());
        }
        if self.keep {
            config.replicas.keep = true;
        }
        if let Some(result) = self.result.as_ref() {
            config.output.result_path = result.clone();
        }
    }
}

#[derive(Args, Debug, Default, Clone)]
pub struct ConfigArgs {
    /// Write the default config to the user config path if none exists.
    #[arg(long)]
    pub init: bool,
}

// =============================================================================
// Public API
// =============================================================================

/// Parse CLI from raw args, applying flag normalization.
pub fn parse_from<I, T>(args: I) -> Cli
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let raw: Vec<OsString> = args.into_iter().map(|t| t.into()).collect();
    Cli::parse_from(normalize_args(raw))
}

/// Run the CLI (used by bin).
pub fn run(cli: Cli, config: Config) -> Result<()> {
    match cli.command {
        Commands::Search(args) => commands::search::handle(config, &args),
        Commands::Config(args) => commands::config::handle(&config, &args),
    }
}

/// Process exit status for a failed run.
pub fn exit_code(err: &Error) -> i32 {
    match err {
        Error::Search(SearchError::Interrupted { .. }) => EXIT_INTERRUPTED,
        _ => 1,
    }
}

// =============================================================================
// Parsing helpers
// =============================================================================

fn normalize_args(mut raw: Vec<OsString>) -> Vec<OsString> {
    if raw.is_empty() {
        return raw;
    }

    let mut out = Vec::with_capacity(raw.len());
    out.push(raw.remove(0)); // program name

    for arg in raw {
        let s = arg.to_string_lossy();
        if s.starts_with("--") {
            let mut pieces = s.splitn(2, '=');
            let flag = pieces.next().unwrap_or("");
            let val = pieces.next();
            let mut canon = flag.to_lowercase().replace('_', "-");
            canon = canonical_flag(&canon).to_string();
            if let Some(v) = val {
                out.push(OsString::from(format!("{canon}={v}")));
            } else {
                out.push(OsString::from(canon));
            }
        } else {
            out.push(arg);
        }
    }
    out
}

fn canonical_flag(flag: &str) -> &str {
    match flag {
        "--result-path" | "--output" => "--result",
        "--clone-root" | "--clones" => "--root",
        "--remote-url" | "--url" => "--remote",
        "--keep-replicas" => "--keep",
        "--gc-every" => "--compact-every",
        other => other,
    }
}

fn parse_source(raw: &str) -> std::result::Result<SourceKind, String> {
    let s = raw.trim().to_lowercase().replace('_', "-");
    match s.as_str() {
        "clone" | "clones" | "parallel" => Ok(SourceKind::Clone),
        "fresh" | "init" | "empty" => Ok(SourceKind::Fresh),
        "in-place" | "inplace" | "here" | "sequential" => Ok(SourceKind::InPlace),
        _ => Err(format!("unknown replica source `{raw}`")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        let mut all = vec!["lucky-sha"];
        all.extend_from_slice(args);
        Cli::try_parse_from(normalize_args(all.into_iter().map(OsString::from).collect()))
            .expect("parse")
    }

    #[test]
    fn search_flags_parse() {
        let cli = parse(&["-vv", "search", "-w", "4", "-l", "50", "--source", "in_place"]);
        assert_eq!(cli.verbose, 2);
        let Commands::Search(args) = cli.command else {
            panic!("expected search");
        };
        assert_eq!(args.workers, Some(4));
        assert_eq!(args.log_every, Some(50));
        assert_eq!(args.source, Some(SourceKind::InPlace));
    }

    #[test]
    fn flag_aliases_are_normalized() {
        let cli = parse(&["search", "--Result_Path=/tmp/x.json", "--gc-every", "5"]);
        let Commands::Search(args) = cli.command else {
            panic!("expected search");
        };
        assert_eq!(args.result, Some(PathBuf::from("/tmp/x.json")));
        assert_eq!(args.compact_every, Some(5));
    }

    #[test]
    fn unknown_source_is_rejected() {
        assert!(parse_source("svn").is_err());
        assert_eq!(parse_source("Fresh"), Ok(SourceKind::Fresh));
    }

    #[test]
    fn flags_override_config() {
        let mut config = Config::default();
        let args = SearchArgs {
            workers: Some(3),
            remote: Some("https://example.com/r.git".into()),
            keep: true,
            result: Some(PathBuf::from("out.json")),
            ..SearchArgs::default()
        };
        args.apply_to(&mut config);
        assert_eq!(config.search.workers, 3);
        assert_eq!(
            config.replicas.remote.as_deref(),
            Some("https://example.com/r.git")
        );
        assert!(config.replicas.keep);
        assert_eq!(config.output.result_path, PathBuf::from("out.json"));
        assert_eq!(config.search.log_every, 1_000);
    }

    #[test]
    fn interrupt_maps_to_130() {
        let err = Error::from(SearchError::Interrupted { attempts: 3 });
        assert_eq!(exit_code(&err), EXIT_INTERRUPTED);
        assert_eq!(exit_code(&Error::from(SearchError::InvalidWorkerCount)), 1);
    }
}
