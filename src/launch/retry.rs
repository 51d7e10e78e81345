//! Launch retry orchestration
//!
//! One launch operation is a sequence of independent attempts. The
//! progression is an explicit state machine with a pure transition
//! function, so the short-circuit-on-success and fail-after-N behavior
//! is testable without touching ports or processes.

use crate::error::{CacheupError, CacheupResult};
use crate::launch::{LaunchResult, ServerHandle};
use async_trait::async_trait;
use tracing::{debug, warn};

/// Progress of a launch operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchState {
    /// No attempt has started
    Pending,
    /// Attempt `attempt` (1-based) is executing
    Attempting { attempt: u32 },
    /// Attempt `attempt` produced a reachable server
    Ready { attempt: u32 },
    /// All `attempts` iterations failed
    Exhausted { attempts: u32 },
}

/// Outcome of a single attempt, fed into [`LaunchState::advance`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptOutcome {
    Succeeded,
    Failed,
}

impl LaunchState {
    /// Enter the first attempt
    pub fn begin() -> Self {
        LaunchState::Attempting { attempt: 1 }
    }

    /// Pure transition function. Terminal states absorb all outcomes.
    pub fn advance(self, outcome: AttemptOutcome, max_attempts: u32) -> Self {
        match (self, outcome) {
            (LaunchState::Pending, _) => LaunchState::begin(),
            (LaunchState::Attempting { attempt }, AttemptOutcome::Succeeded) => {
                LaunchState::Ready { attempt }
            }
            (LaunchState::Attempting { attempt }, AttemptOutcome::Failed)
                if attempt >= max_attempts =>
            {
                LaunchState::Exhausted {
                    attempts: max_attempts,
                }
            }
            (LaunchState::Attempting { attempt }, AttemptOutcome::Failed) => {
                LaunchState::Attempting {
                    attempt: attempt + 1,
                }
            }
            (terminal, _) => terminal,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, LaunchState::Ready { .. } | LaunchState::Exhausted { .. })
    }
}

/// A failed attempt, possibly leaving behind a process that spawned but
/// never became reachable
#[derive(Debug)]
pub struct AttemptFailure {
    pub error: CacheupError,
    pub orphan: Option<ServerHandle>,
}

impl AttemptFailure {
    pub fn new(error: CacheupError) -> Self {
        Self {
            error,
            orphan: None,
        }
    }

    pub fn with_orphan(error: CacheupError, orphan: ServerHandle) -> Self {
        Self {
            error,
            orphan: Some(orphan),
        }
    }
}

/// One full launch attempt: allocate a port, spawn the server, wait for
/// it to accept connections
#[async_trait]
pub trait LaunchStrategy: Send {
    async fn attempt(&mut self, attempt: u32) -> Result<ServerHandle, AttemptFailure>;
}

/// Everything known about one attempt after it finished
#[derive(Debug)]
pub struct AttemptRecord {
    /// 1-based attempt index
    pub attempt: u32,
    /// Handle of the process this attempt spawned, if any. Failed
    /// attempts keep theirs here: those processes are never terminated,
    /// only surfaced (see [`RetryOrchestrator::orphaned_pids`]).
    pub handle: Option<ServerHandle>,
    /// Why the attempt failed, rendered for display
    pub failure: Option<String>,
}

/// Drives [`LaunchStrategy`] attempts sequentially until one succeeds or
/// the attempt budget runs out
pub struct RetryOrchestrator<S> {
    strategy: S,
    max_attempts: u32,
    records: Vec<AttemptRecord>,
}

impl<S: LaunchStrategy> RetryOrchestrator<S> {
    pub fn new(strategy: S, max_attempts: u32) -> Self {
        Self {
            strategy,
            // An attempt budget below 1 would never launch anything
            max_attempts: max_attempts.max(1),
            records: Vec::new(),
        }
    }

    /// Run attempts until the first success or exhaustion.
    ///
    /// Each iteration is independent: a fresh port and a fresh process.
    /// Stage failures are warnings; only exhaustion is an error.
    pub async fn run(&mut self) -> CacheupResult<LaunchResult> {
        let mut state = LaunchState::begin();

        while let LaunchState::Attempting { attempt } = state {
            debug!(attempt, max_attempts = self.max_attempts, "starting launch attempt");

            match self.strategy.attempt(attempt).await {
                Ok(handle) => {
                    let result = LaunchResult {
                        pid: handle.pid,
                        port: handle.port,
                        attempt,
                    };
                    self.records.push(AttemptRecord {
                        attempt,
                        handle: Some(handle),
                        failure: None,
                    });
                    state = state.advance(AttemptOutcome::Succeeded, self.max_attempts);
                    debug!(?state, "launch succeeded");
                    return Ok(result);
                }
                Err(failure) => {
                    warn!(attempt, error = %failure.error, "launch attempt failed");
                    self.records.push(AttemptRecord {
                        attempt,
                        handle: failure.orphan,
                        failure: Some(failure.error.to_string()),
                    });
                    state = state.advance(AttemptOutcome::Failed, self.max_attempts);
                }
            }
        }

        Err(CacheupError::LaunchExhausted {
            attempts: self.max_attempts,
        })
    }

    /// Records of every attempt that ran, in order
    pub fn records(&self) -> &[AttemptRecord] {
        &self.records
    }

    /// Pids of processes spawned by failed attempts.
    ///
    /// These were started but never became reachable; nothing terminates
    /// them, so callers should at least report them.
    pub fn orphaned_pids(&self) -> Vec<u32> {
        self.records
            .iter()
            .filter(|r| r.failure.is_some())
            .filter_map(|r| r.handle.as_ref().map(|h| h.pid))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ---- pure state machine ----

    #[test]
    fn success_short_circuits() {
        let state = LaunchState::begin().advance(AttemptOutcome::Succeeded, 3);
        assert_eq!(state, LaunchState::Ready { attempt: 1 });
        assert!(state.is_terminal());
    }

    #[test]
    fn failures_increment_until_exhaustion() {
        let mut state = LaunchState::begin();
        state = state.advance(AttemptOutcome::Failed, 3);
        assert_eq!(state, LaunchState::Attempting { attempt: 2 });
        state = state.advance(AttemptOutcome::Failed, 3);
        assert_eq!(state, LaunchState::Attempting { attempt: 3 });
        state = state.advance(AttemptOutcome::Failed, 3);
        assert_eq!(state, LaunchState::Exhausted { attempts: 3 });
        assert!(state.is_terminal());
    }

    #[test]
    fn single_attempt_budget() {
        let state = LaunchState::begin().advance(AttemptOutcome::Failed, 1);
        assert_eq!(state, LaunchState::Exhausted { attempts: 1 });
    }

    #[test]
    fn late_success_records_attempt_index() {
        let mut state = LaunchState::begin();
        state = state.advance(AttemptOutcome::Failed, 3);
        state = state.advance(AttemptOutcome::Succeeded, 3);
        assert_eq!(state, LaunchState::Ready { attempt: 2 });
    }

    #[test]
    fn terminal_states_absorb_outcomes() {
        let ready = LaunchState::Ready { attempt: 2 };
        assert_eq!(ready.advance(AttemptOutcome::Failed, 3), ready);

        let exhausted = LaunchState::Exhausted { attempts: 3 };
        assert_eq!(exhausted.advance(AttemptOutcome::Succeeded, 3), exhausted);
    }

    #[test]
    fn pending_begins_on_any_outcome() {
        let state = LaunchState::Pending.advance(AttemptOutcome::Failed, 3);
        assert_eq!(state, LaunchState::Attempting { attempt: 1 });
    }

    // ---- orchestrator against scripted strategies ----

    /// Plays back a fixed script of attempt outcomes
    struct Scripted {
        outcomes: Vec<Result<ServerHandle, AttemptFailure>>,
        calls: u32,
    }

    impl Scripted {
        fn new(outcomes: Vec<Result<ServerHandle, AttemptFailure>>) -> Self {
            Self {
                outcomes: {
                    let mut o = outcomes;
                    o.reverse();
                    o
                },
                calls: 0,
            }
        }
    }

    #[async_trait]
    impl LaunchStrategy for Scripted {
        async fn attempt(&mut self, _attempt: u32) -> Result<ServerHandle, AttemptFailure> {
            self.calls += 1;
            self.outcomes.pop().expect("script exhausted")
        }
    }

    fn timeout_failure(port: u16, pid: u32) -> AttemptFailure {
        AttemptFailure::with_orphan(
            CacheupError::ReadinessTimeout {
                port,
                waited_ms: 5000,
            },
            ServerHandle::detached(pid, port),
        )
    }

    fn spawn_failure() -> AttemptFailure {
        AttemptFailure::new(CacheupError::spawn(
            "cache-server",
            std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        ))
    }

    #[tokio::test]
    async fn first_success_runs_exactly_one_attempt() {
        let mut orchestrator = RetryOrchestrator::new(
            Scripted::new(vec![Ok(ServerHandle::detached(100, 9000))]),
            3,
        );

        let result = orchestrator.run().await.unwrap();
        assert_eq!(result.pid, 100);
        assert_eq!(result.port, 9000);
        assert_eq!(result.attempt, 1);
        assert_eq!(orchestrator.strategy.calls, 1);
        assert_eq!(orchestrator.records().len(), 1);
    }

    #[tokio::test]
    async fn two_timeouts_then_success() {
        let mut orchestrator = RetryOrchestrator::new(
            Scripted::new(vec![
                Err(timeout_failure(9101, 201)),
                Err(timeout_failure(9102, 202)),
                Ok(ServerHandle::detached(203, 9229)),
            ]),
            3,
        );

        let result = orchestrator.run().await.unwrap();
        assert_eq!(result.port, 9229);
        assert_eq!(result.pid, 203);
        assert_eq!(result.attempt, 3);

        // Failed attempts keep their handles in the arena
        assert_eq!(orchestrator.records().len(), 3);
        assert_eq!(orchestrator.orphaned_pids(), vec![201, 202]);
        let failures: Vec<_> = orchestrator
            .records()
            .iter()
            .filter(|r| r.failure.is_some())
            .collect();
        assert_eq!(failures.len(), 2);
    }

    #[tokio::test]
    async fn exhaustion_after_exact_attempt_count() {
        let mut orchestrator = RetryOrchestrator::new(
            Scripted::new(vec![Err(spawn_failure()), Err(spawn_failure())]),
            2,
        );

        let err = orchestrator.run().await.unwrap_err();
        match err {
            CacheupError::LaunchExhausted { attempts } => assert_eq!(attempts, 2),
            other => panic!("expected LaunchExhausted, got {other}"),
        }
        assert_eq!(orchestrator.strategy.calls, 2);
        // Spawn failures leave no orphans behind
        assert!(orchestrator.orphaned_pids().is_empty());
    }

    #[tokio::test]
    async fn zero_budget_is_clamped_to_one() {
        let mut orchestrator =
            RetryOrchestrator::new(Scripted::new(vec![Err(spawn_failure())]), 0);

        let err = orchestrator.run().await.unwrap_err();
        assert!(matches!(err, CacheupError::LaunchExhausted { attempts: 1 }));
    }
}
