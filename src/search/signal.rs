//! Shared stop condition for a search.
//!
//! This is the only state workers share. The winner slot is written once with
//! a compare-and-set; every later claim observes the existing winner and
//! loses.

use std::sync::{Arc, Mutex, PoisonError};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

const RUNNING: usize = usize::MAX;

#[derive(Debug)]
pub struct StopSignal {
    winner: AtomicUsize,
    interrupted: Arc<AtomicBool>,
}

impl StopSignal {
    pub fn new() -> Self {
        Self {
            winner: AtomicUsize::new(RUNNING),
            interrupted: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Flag for signal handlers to set. Setting it stops every worker without
    /// naming a winner.
    pub fn interrupt_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.interrupted)
    }

    pub fn interrupt(&self) {
        self.interrupted.store(true, Ordering::Release);
    }

    pub fn is_interrupted(&self) -> bool {
        self.interrupted.load(Ordering::Acquire)
    }

    /// Record `worker` as the winner. Returns true for exactly one caller.
    pub fn claim(&self, worker: usize) -> bool {
        debug_assert_ne!(worker, RUNNING, "worker index collides with sentinel");
        self.winner
            .compare_exchange(RUNNING, worker, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub fn winner(&self) -> Option<usize> {
        match self.winner.load(Ordering::Acquire) {
            RUNNING => None,
            worker => Some(worker),
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.winner().is_some() || self.is_interrupted()
    }

    /// Empty the winner slot. The interrupt flag is left as is.
    fn clear_winner(&self) {
        self.winner.store(RUNNING, Ordering::Release);
    }
}

impl Default for StopSignal {
    fn default() -> Self {
        Self::new()
    }
}

/// Everything a worker may touch outside its own replica.
#[derive(Debug)]
pub struct SearchState {
    stop: StopSignal,
    attempts: AtomicU64,
    started: Mutex<Instant>,
}

impl SearchState {
    pub fn new() -> Self {
        Self {
            stop: StopSignal::new(),
            attempts: AtomicU64::new(0),
            started: Mutex::new(Instant::now()),
        }
    }

    pub fn stop(&self) -> &StopSignal {
        &self.stop
    }

    /// Count one attempt and return the new global total.
    pub fn record_attempt(&self) -> u64 {
        self.attempts.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Best-effort total across workers.
    pub fn total_attempts(&self) -> u64 {
        self.attempts.load(Ordering::Relaxed)
    }

    pub fn elapsed(&self) -> Duration {
        self.started
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .elapsed()
    }

    /// Start a new run: no winner, no attempts, clock at zero.
    pub(crate) fn begin(&self) {
        self.stop.clear_winner();
        self.attempts.store(0, Ordering::Relaxed);
        *self.started.lock().unwrap_or_else(PoisonError::into_inner) = Instant::now();
    }
}

impl Default for SearchState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Barrier;

    #[test]
    fn claim_succeeds_once() {
        let stop = StopSignal::new();
        assert!(!stop.is_stopped());
        assert!(stop.claim(3));
        assert!(!stop.claim(1));
        assert!(!stop.claim(3));
        assert_eq!(stop.winner(), Some(3));
        assert!(stop.is_stopped());
    }

    #[test]
    fn racing_claims_elect_a_single_winner() {
        for _ in 0..50 {
            let stop = StopSignal::new();
            let barrier = Barrier::new(8);
            let wins: Vec<bool> = std::thread::scope(|scope| {
                let handles: Vec<_> = (0..8)
                    .map(|worker| {
                        let stop = &stop;
                        let barrier = &barrier;
                        scope.spawn(move || {
                            barrier.wait();
                            stop.claim(worker)
                        })
                    })
                    .collect();
                handles.into_iter().map(|h| h.join().unwrap()).collect()
            });
            assert_eq!(wins.iter().filter(|won| **won).count(), 1);
            let winner = stop.winner().expect("winner recorded");
            assert!(wins[winner]);
        }
    }

    #[test]
    fn interrupt_stops_without_winner() {
        let stop = StopSignal::new();
        stop.interrupt_flag().store(true, Ordering::SeqCst);
        assert!(stop.is_stopped());
        assert_eq!(stop.winner(), None);
        assert!(stop.claim(0), "interrupt does not consume the winner slot");
    }

    #[test]
    fn attempts_accumulate_across_threads() {
        let state = SearchState::new();
        std::thread::scope(|scope| {
            for _ in 0..4 {
                scope.spawn(|| {
                    for _ in 0..250 {
                        state.record_attempt();
                    }
                });
            }
        });
        assert_eq!(state.total_attempts(), 1_000);
    }

    #[test]
    fn begin_clears_winner_and_attempts_but_not_interrupt() {
        let state = SearchState::new();
        state.record_attempt();
        assert!(state.stop().claim(2));
        state.begin();
        assert_eq!(state.stop().winner(), None);
        assert_eq!(state.total_attempts(), 0);
        assert!(!state.stop().is_stopped());

        state.stop().interrupt();
        state.begin();
        assert!(state.stop().is_interrupted());
    }
}
