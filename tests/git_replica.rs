//! Replica operations against real git repositories in temp dirs.
//!
//! Skipped when `git` is not on PATH.

use std::path::Path;

use lucky_sha::git::{GitCommand, GitProvisioner, Provisioner, ReplicaSource, Repository};
use lucky_sha::search::trial::{attempt_message, predicted_summary};

fn git_available() -> bool {
    std::process::Command::new("git")
        .arg("--version")
        .output()
        .is_ok_and(|out| out.status.success())
}

fn git() -> GitCommand {
    GitCommand::new("git")
        .with_override("core.abbrev", "7")
        .with_override("user.name", "Test User")
        .with_override("user.email", "test@test.com")
        .with_override("commit.gpgsign", "false")
}

fn fresh(root: &Path) -> GitProvisioner {
    GitProvisioner::new(git(), ReplicaSource::Fresh, root.to_path_buf())
        .with_branch(Some("main".into()))
}

fn short_head(dir: &Path) -> String {
    git()
        .run(dir, ["rev-parse", "--short=7", "HEAD"])
        .expect("rev-parse")
}

#[test]
fn commit_text_follows_summary_format() {
    if !git_available() {
        eprintln!("git not found, skipping");
        return;
    }
    let root = tempfile::tempdir().expect("tempdir");
    let provisioner = fresh(root.path());
    let mut repo = provisioner.provision(0).expect("provision");
    assert_eq!(repo.branch(), "main");
    assert_eq!(repo.location(), provisioner.replica_path(0));

    let message = attempt_message(1, "0000000");
    let text = repo.commit(&message).expect("commit");
    let short = short_head(repo.location());

    assert_eq!(text, predicted_summary("main", &short, &message));
    assert!(!text.ends_with('\n'));
}

#[test]
fn undo_rewinds_to_base_and_compaction_succeeds() {
    if !git_available() {
        eprintln!("git not found, skipping");
        return;
    }
    let root = tempfile::tempdir().expect("tempdir");
    let mut repo = fresh(root.path()).provision(0).expect("provision");
    let base = repo.base().to_string();

    for ordinal in 1..=3 {
        repo.commit(&attempt_message(ordinal, "abcdef0"))
            .expect("commit");
        assert_ne!(repo.head().expect("head"), base);
        repo.undo_last().expect("undo");
        assert_eq!(repo.head().expect("head"), base);
    }

    // Undo with nothing committed stays on base.
    repo.undo_last().expect("idle undo");
    assert_eq!(repo.head().expect("head"), base);

    repo.compact().expect("gc");
}

#[test]
fn clone_source_gives_each_worker_its_own_replica() {
    if !git_available() {
        eprintln!("git not found, skipping");
        return;
    }
    let seed_root = tempfile::tempdir().expect("tempdir");
    let seed = fresh(seed_root.path()).provision(0).expect("seed");

    let root = tempfile::tempdir().expect("tempdir");
    let provisioner = GitProvisioner::new(
        git(),
        ReplicaSource::Clone {
            remote: seed.location().display().to_string(),
        },
        root.path().join("run"),
    );
    let first = provisioner.provision(0).expect("clone 0");
    let second = provisioner.provision(1).expect("clone 1");

    assert_ne!(first.location(), second.location());
    assert_eq!(first.branch(), "main");
    assert_eq!(first.base(), seed.base());

    let location = second.location().to_path_buf();
    provisioner.release(second);
    assert!(!location.exists());
    assert!(first.location().exists());
}

#[test]
fn kept_replicas_survive_release() {
    if !git_available() {
        eprintln!("git not found, skipping");
        return;
    }
    let root = tempfile::tempdir().expect("tempdir");
    let provisioner = fresh(root.path()).keep_replicas(true);
    let repo = provisioner.provision(0).expect("provision");
    let location = repo.location().to_path_buf();
    provisioner.release(repo);
    assert!(location.exists());
}

#[test]
fn directory_without_history_fails_provisioning() {
    if !git_available() {
        eprintln!("git not found, skipping");
        return;
    }
    let dir = tempfile::tempdir().expect("tempdir");
    let provisioner = GitProvisioner::new(
        git(),
        ReplicaSource::InPlace {
            path: dir.path().to_path_buf(),
        },
        dir.path().join("unused"),
    );
    let err = provisioner.provision(0).expect_err("no repository");
    assert!(err.is_provisioning(), "{err}");
}
