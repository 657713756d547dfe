//! One attempt: guess, commit, compare, roll back.

use crate::candidate::{Candidate, CandidateGenerator};
use crate::git::{RepoError, Repository};

/// Commit message for attempt `ordinal`.
pub fn attempt_message(ordinal: u64, candidate: &str) -> String {
    format!("attempt {ordinal}: {candidate}")
}

/// Exact confirmation line git prints when the guess is right.
pub fn predicted_summary(branch: &str, candidate: &str, message: &str) -> String {
    format!("[{branch} {candidate}] {message}")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attempt {
    pub ordinal: u64,
    pub candidate: Candidate,
    pub message: String,
}

impl Attempt {
    pub fn new(ordinal: u64, candidate: Candidate) -> Self {
        let message = attempt_message(ordinal, candidate.as_str());
        Self {
            ordinal,
            candidate,
            message,
        }
    }

    pub fn predicted(&self, branch: &str) -> String {
        predicted_summary(branch, self.candidate.as_str(), &self.message)
    }
}

#[derive(Debug)]
pub struct Outcome {
    pub attempt: Attempt,
    /// Confirmation text, or `None` when the commit could not run.
    pub raw_text: Option<String>,
    /// `raw_text` equals the predicted summary, byte for byte.
    pub accepted: bool,
    /// First commit or undo failure during this attempt.
    pub write_error: Option<RepoError>,
}

impl Outcome {
    pub fn candidate(&self) -> &Candidate {
        &self.attempt.candidate
    }
}

#[derive(Debug, Clone)]
pub struct TrialRunner {
    generator: CandidateGenerator,
    compact_every: u64,
}

impl TrialRunner {
    /// `compact_every` of 0 disables compaction.
    pub fn new(generator: CandidateGenerator, compact_every: u64) -> Self {
        Self {
            generator,
            compact_every,
        }
    }

    pub fn generator(&self) -> &CandidateGenerator {
        &self.generator
    }

    pub fn run_one<R: Repository + ?Sized>(&self, repo: &mut R, ordinal: u64) -> Outcome {
        let attempt = Attempt::new(ordinal, self.generator.generate());
        self.evaluate(repo, attempt)
    }

    /// Commit `attempt` and keep it only if the log confirms the prediction.
    pub fn evaluate<R: Repository + ?Sized>(&self, repo: &mut R, attempt: Attempt) -> Outcome {
        let predicted = attempt.predicted(repo.branch());
        let (raw_text, mut write_error) = match repo.commit(&attempt.message) {
            Ok(text) => (Some(text), None),
            Err(err) => (None, Some(err)),
        };
        let accepted = raw_text.as_deref() == Some(predicted.as_str());

        if !accepted {
            match repo.undo_last() {
                Ok(()) => {
                    if self.compaction_due(attempt.ordinal)
                        && let Err(err) = repo.compact()
                    {
                        tracing::warn!(ordinal = attempt.ordinal, "compaction failed: {err}");
                    }
                }
                Err(err) => match write_error {
                    None => write_error = Some(err),
                    Some(_) => tracing::warn!(ordinal = attempt.ordinal, "undo failed: {err}"),
                },
            }
        }

        Outcome {
            attempt,
            raw_text,
            accepted,
            write_error,
        }
    }

    fn compaction_due(&self, ordinal: u64) -> bool {
        self.compact_every != 0 && ordinal % self.compact_every == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::candidate::Alphabet;
    use crate::test_harness::{Script, ScriptedRepo};

    fn runner(compact_every: u64) -> TrialRunner {
        TrialRunner::new(CandidateGenerator::hex(), compact_every)
    }

    #[test]
    fn message_and_prediction_embed_candidate() {
        let attempt = Attempt::new(12, candidate("0badf00"));
        assert_eq!(attempt.message, "attempt 12: 0badf00");
        assert_eq!(
            attempt.predicted("main"),
            "[main 0badf00] attempt 12: 0badf00"
        );
    }

    #[test]
    fn exact_match_is_accepted_and_kept() {
        let mut repo = ScriptedRepo::new("stub", "main", Script::MatchOn(1));
        let outcome = runner(1).run_one(&mut repo, 1);
        assert!(outcome.accepted);
        assert_eq!(
            outcome.raw_text.as_deref(),
            Some(outcome.attempt.predicted("main").as_str())
        );
        let log = repo.log();
        assert_eq!((log.commits, log.undos, log.compactions), (1, 0, 0));
        assert_eq!(log.depth, 1);
    }

    #[test]
    fn near_misses_are_rejected() {
        let attempt = Attempt::new(3, candidate("abcdef0"));
        let predicted = attempt.predicted("main");
        for raw in [
            format!("{predicted}\n"),
            format!(" {predicted}"),
            predicted.to_uppercase(),
            predicted.replace("[main", "[master"),
            "[main abcdef01] attempt 3: abcdef0".to_string(),
        ] {
            let mut repo = ScriptedRepo::new("stub", "main", Script::Fixed(raw.clone()));
            let outcome = runner(0).evaluate(&mut repo, attempt.clone());
            assert!(!outcome.accepted, "accepted {raw:?}");
            assert_eq!(repo.log().undos, 1);
        }
    }

    #[test]
    fn mismatch_is_undone_and_compacted_on_cadence() {
        let mut repo = ScriptedRepo::new("stub", "main", Script::Never);
        let runner = runner(3);
        for ordinal in 1..=7 {
            let outcome = runner.run_one(&mut repo, ordinal);
            assert!(!outcome.accepted);
            assert!(outcome.write_error.is_none());
        }
        let log = repo.log();
        assert_eq!(log.commits, 7);
        assert_eq!(log.undos, 7);
        assert_eq!(log.compactions, 2);
        assert_eq!(log.depth, 0, "head returns to base after each miss");
    }

    #[test]
    fn failed_commit_still_undoes() {
        let mut repo = ScriptedRepo::new("stub", "main", Script::FailCommits);
        let outcome = runner(0).run_one(&mut repo, 1);
        assert!(!outcome.accepted);
        assert!(outcome.raw_text.is_none());
        assert!(matches!(
            outcome.write_error,
            Some(RepoError::Write {
                op: crate::git::RepoOp::Commit,
                ..
            })
        ));
        assert_eq!(repo.log().undos, 1);
        assert_eq!(repo.log().depth, 0);
    }

    #[test]
    fn compaction_failure_is_not_a_write_error() {
        let mut repo = ScriptedRepo::new("stub", "main", Script::Never).failing_compaction();
        let outcome = runner(1).run_one(&mut repo, 1);
        assert!(outcome.write_error.is_none());
        assert_eq!(repo.log().compactions, 1);
    }

    #[test]
    fn single_symbol_alphabet_always_matches_scripted_prediction() {
        let generator = CandidateGenerator::new(Alphabet::new("z").unwrap(), 3).unwrap();
        let mut repo = ScriptedRepo::new("stub", "trunk", Script::MatchOn(1));
        let outcome = TrialRunner::new(generator, 0).run_one(&mut repo, 9);
        assert!(outcome.accepted);
        assert_eq!(outcome.candidate().as_str(), "zzz");
        assert_eq!(
            outcome.raw_text.as_deref(),
            Some("[trunk zzz] attempt 9: zzz")
        );
    }

    fn candidate(text: &str) -> Candidate {
        Alphabet::hex().parse(text).expect("hex candidate")
    }
}
