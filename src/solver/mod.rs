//! Solver boundary.
//!
//! A [`Solver`] takes a built [`MilpModel`] and returns a [`SolveOutcome`]:
//! a status, the objective value and a dense value vector indexed by
//! [`VarId::index`](crate::milp::VarId::index). Engines never see
//! scheduling types, and the rest of the crate never sees engine types.
//!
//! Failures are never panics: time limits, cancellation, engine errors
//! and engine panics all come back as a status plus a [`SolverFailure`].

mod engine;

pub use engine::GoodLpSolver;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::milp::MilpModel;
use crate::models::ResponseStatus;

/// An engine capable of solving a [`MilpModel`].
pub trait Solver {
    /// Engine name for logs.
    fn name(&self) -> &str;

    /// Solves `model` to optimality or until a stop condition.
    ///
    /// Returning on a stop condition does not have to stop the engine:
    /// [`GoodLpSolver`] leaves its worker thread running to completion.
    fn solve(&self, model: &MilpModel, options: &SolveOptions) -> SolveOutcome;
}

/// Shared flag that asks a running solve to stop.
///
/// Clones share the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    /// Creates an untriggered token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// Whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Per-solve stop conditions.
#[derive(Debug, Clone, Default)]
pub struct SolveOptions {
    /// Wall-clock limit; `None` waits for the engine.
    pub time_limit: Option<Duration>,
    /// External cancellation.
    pub cancel: CancellationToken,
}

impl SolveOptions {
    /// Options with a time limit.
    pub fn with_time_limit(mut self, limit: Duration) -> Self {
        self.time_limit = Some(limit);
        self
    }

    /// Options observing `token`.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }
}

/// Outcome class of a solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SolveStatus {
    /// Proven optimal; values are available.
    Optimal,
    /// No assignment satisfies the constraints.
    Infeasible,
    /// The objective can decrease without bound.
    Unbounded,
    /// Stopped by time limit or cancellation before a result.
    NotSolved,
    /// The engine failed.
    Error,
    /// The engine vanished without reporting.
    Undefined,
}

impl SolveStatus {
    /// Whether the outcome carries solution values.
    pub fn has_solution(self) -> bool {
        self == SolveStatus::Optimal
    }
}

impl From<SolveStatus> for ResponseStatus {
    fn from(status: SolveStatus) -> Self {
        match status {
            SolveStatus::Optimal => ResponseStatus::Optimal,
            SolveStatus::Infeasible => ResponseStatus::Infeasible,
            SolveStatus::Unbounded => ResponseStatus::Unbounded,
            SolveStatus::NotSolved => ResponseStatus::NotSolved,
            SolveStatus::Error | SolveStatus::Undefined => ResponseStatus::Undefined,
        }
    }
}

/// Why a solve produced no solution beyond the model itself being
/// infeasible or unbounded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SolverFailure {
    #[error("time limit of {0:?} reached")]
    TimedOut(Duration),

    #[error("solve cancelled")]
    Cancelled,

    #[error("engine error: {0}")]
    Engine(String),

    #[error("engine worker exited without a result")]
    Disconnected,
}

impl SolverFailure {
    /// Status reported for this failure.
    pub fn status(&self) -> SolveStatus {
        match self {
            SolverFailure::TimedOut(_) | SolverFailure::Cancelled => SolveStatus::NotSolved,
            SolverFailure::Engine(_) => SolveStatus::Error,
            SolverFailure::Disconnected => SolveStatus::Undefined,
        }
    }
}

/// Result of a solve.
#[derive(Debug, Clone, PartialEq)]
pub struct SolveOutcome {
    /// Outcome class.
    pub status: SolveStatus,
    /// Objective value when optimal.
    pub objective_value: Option<f64>,
    /// Variable values, indexed by `VarId::index`. Empty without a solution.
    pub values: Vec<f64>,
    /// Failure detail for `NotSolved`, `Error` and `Undefined`.
    pub failure: Option<SolverFailure>,
    /// Wall-clock time spent in the solver.
    pub elapsed: Duration,
}

impl SolveOutcome {
    /// An optimal outcome.
    pub fn optimal(objective_value: f64, values: Vec<f64>, elapsed: Duration) -> Self {
        Self {
            status: SolveStatus::Optimal,
            objective_value: Some(objective_value),
            values,
            failure: None,
            elapsed,
        }
    }

    /// An outcome without values (infeasible or unbounded).
    pub fn without_solution(status: SolveStatus, elapsed: Duration) -> Self {
        Self {
            status,
            objective_value: None,
            values: Vec::new(),
            failure: None,
            elapsed,
        }
    }

    /// A failed outcome.
    pub fn failed(failure: SolverFailure, elapsed: Duration) -> Self {
        Self {
            status: failure.status(),
            objective_value: None,
            values: Vec::new(),
            failure: Some(failure),
            elapsed,
        }
    }

    /// Whether solution values are available.
    pub fn has_solution(&self) -> bool {
        self.status.has_solution()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancellation_token_shared() {
        let token = CancellationToken::new();
        let clone = token.clone();
        assert!(!clone.is_cancelled());
        token.cancel();
        assert!(clone.is_cancelled());
    }

    #[test]
    fn test_failure_status_mapping() {
        assert_eq!(
            SolverFailure::TimedOut(Duration::from_secs(1)).status(),
            SolveStatus::NotSolved
        );
        assert_eq!(SolverFailure::Cancelled.status(), SolveStatus::NotSolved);
        assert_eq!(
            SolverFailure::Engine("boom".into()).status(),
            SolveStatus::Error
        );
        assert_eq!(SolverFailure::Disconnected.status(), SolveStatus::Undefined);
    }

    #[test]
    fn test_response_status_mapping() {
        assert_eq!(
            ResponseStatus::from(SolveStatus::Optimal),
            ResponseStatus::Optimal
        );
        assert_eq!(
            ResponseStatus::from(SolveStatus::NotSolved),
            ResponseStatus::NotSolved
        );
        assert_eq!(
            ResponseStatus::from(SolveStatus::Error),
            ResponseStatus::Undefined
        );
    }

    #[test]
    fn test_outcome_constructors() {
        let ok = SolveOutcome::optimal(2.0, vec![1.0, 0.0], Duration::ZERO);
        assert!(ok.has_solution());
        assert_eq!(ok.objective_value, Some(2.0));

        let failed = SolveOutcome::failed(SolverFailure::Cancelled, Duration::ZERO);
        assert_eq!(failed.status, SolveStatus::NotSolved);
        assert!(failed.values.is_empty());
        assert_eq!(failed.failure, Some(SolverFailure::Cancelled));

        let infeasible = SolveOutcome::without_solution(SolveStatus::Infeasible, Duration::ZERO);
        assert!(!infeasible.has_solution());
        assert!(infeasible.failure.is_none());
    }
}
