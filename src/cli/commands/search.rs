//! `lucky-sha search` - run workers until one commit announces its own id.

use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::time::SystemTime;

use super::super::{SearchArgs, success_line};
use crate::Result;
use crate::config::Config;
use crate::git::GitProvisioner;
use crate::search::{FileSink, SearchCoordinator, TrialRunner};

pub(crate) fn handle(mut config: Config, args: &SearchArgs) -> Result<()> {
    args.apply_to(&mut config);
    config.validate_for_git()?;

    let generator = config.search.generator()?;
    let source = config.replicas.replica_source()?;
    let git = config.replicas.git_command(generator.length());
    let root = GitProvisioner::run_root(&config.replicas.root_dir(), SystemTime::now());
    tracing::debug!(root = %root.display(), ?source, "replica layout");

    let provisioner = GitProvisioner::new(git, source, root)
        .with_branch(config.replicas.branch.clone())
        .keep_replicas(config.replicas.keep);
    let runner = TrialRunner::new(generator, config.search.compact_every);
    let mut coordinator =
        SearchCoordinator::new(provisioner, runner, config.search.worker_policy());
    register_interrupts(coordinator.state().stop().interrupt_flag());

    let sink = FileSink::new(&config.output.result_path);
    sink.clear()?;

    let summary = coordinator.search(config.search.workers, &sink)?;
    println!("{}", success_line(&summary.result));
    Ok(())
}

fn register_interrupts(flag: Arc<AtomicBool>) {
    for signal in [signal_hook::consts::SIGINT, signal_hook::consts::SIGTERM] {
        if let Err(err) = signal_hook::flag::register(signal, Arc::clone(&flag)) {
            tracing::warn!(signal, "failed to register signal handler: {err}");
        }
    }
}
