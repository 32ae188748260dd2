//! `good_lp` engine adapter (pure-Rust `microlp` backend).
//!
//! The engine call blocks and offers no interruption, so each solve runs
//! on a dedicated worker thread. The calling thread waits on a channel in
//! short slices, checking the cancellation token and the deadline between
//! slices. On timeout or cancellation the worker is abandoned: it keeps
//! running the engine to completion in the background and its reply is
//! dropped. Abandoned workers still hold a thread and their copy of the
//! model, so a caller that times out repeatedly on large models should
//! watch [`GoodLpSolver::live_workers`].

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{channel, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use ::good_lp::{
    constraint, default_solver, variable, Expression, ResolutionError, Solution, SolverModel,
    Variable,
};
use tracing::{debug, info, warn};

use super::{SolveOptions, SolveOutcome, SolveStatus, Solver, SolverFailure};
use crate::milp::{Comparison, LinearExpr, MilpModel, VarKind};

/// Polling slice between cancellation checks.
const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Solver backed by `good_lp` with the `microlp` backend.
///
/// Clones share the live-worker count.
#[derive(Debug, Clone, Default)]
pub struct GoodLpSolver {
    live: Arc<AtomicUsize>,
}

/// Decrements the live-worker count when the worker thread exits.
struct WorkerGuard(Arc<AtomicUsize>);

impl Drop for WorkerGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

enum EngineReply {
    Solved(Vec<f64>),
    Infeasible,
    Unbounded,
    Failed(String),
}

impl GoodLpSolver {
    /// Creates a solver.
    pub fn new() -> Self {
        Self::default()
    }

    /// Worker threads still running, including ones abandoned after a
    /// timeout or cancellation.
    pub fn live_workers(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }
}

impl Solver for GoodLpSolver {
    fn name(&self) -> &str {
        "good_lp/microlp"
    }

    fn solve(&self, model: &MilpModel, options: &SolveOptions) -> SolveOutcome {
        let start = Instant::now();
        info!(
            event = "solve_start",
            solver = self.name(),
            model = %model.name,
            variables = model.variable_count(),
            constraints = model.constraint_count(),
            time_limit_ms = options.time_limit.map(|d| d.as_millis() as u64),
        );

        let outcome = self.run(model, options, start);

        info!(
            event = "solve_end",
            status = ?outcome.status,
            objective = outcome.objective_value,
            elapsed_ms = outcome.elapsed.as_millis() as u64,
        );
        if let Some(failure) = &outcome.failure {
            warn!(event = "solve_failed", %failure);
        }
        outcome
    }
}

impl GoodLpSolver {
    fn run(&self, model: &MilpModel, options: &SolveOptions, start: Instant) -> SolveOutcome {
        if options.cancel.is_cancelled() {
            return SolveOutcome::failed(SolverFailure::Cancelled, start.elapsed());
        }
        let deadline = options.time_limit.map(|limit| start + limit);

        let (tx, rx) = channel();
        let job = model.clone();
        self.live.fetch_add(1, Ordering::SeqCst);
        let guard = WorkerGuard(Arc::clone(&self.live));
        let spawned = thread::Builder::new()
            .name("milp-worker".into())
            .spawn(move || {
                let _guard = guard;
                let reply = catch_unwind(AssertUnwindSafe(|| solve_blocking(&job)))
                    .unwrap_or_else(|panic| EngineReply::Failed(panic_message(panic)));
                // receiver is gone after a timeout or cancellation
                let _ = tx.send(reply);
            });
        if let Err(e) = spawned {
            return SolveOutcome::failed(
                SolverFailure::Engine(format!("failed to spawn worker: {e}")),
                start.elapsed(),
            );
        }

        loop {
            if options.cancel.is_cancelled() {
                debug!(
                    event = "solve_abandoned",
                    reason = "cancelled",
                    live_workers = self.live_workers(),
                );
                return SolveOutcome::failed(SolverFailure::Cancelled, start.elapsed());
            }
            let wait = match (deadline, options.time_limit) {
                (Some(deadline), Some(limit)) => {
                    let now = Instant::now();
                    if now >= deadline {
                        debug!(
                            event = "solve_abandoned",
                            reason = "time_limit",
                            live_workers = self.live_workers(),
                        );
                        return SolveOutcome::failed(
                            SolverFailure::TimedOut(limit),
                            start.elapsed(),
                        );
                    }
                    (deadline - now).min(POLL_INTERVAL)
                }
                _ => POLL_INTERVAL,
            };

            match rx.recv_timeout(wait) {
                Ok(reply) => return into_outcome(model, reply, start.elapsed()),
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => {
                    return SolveOutcome::failed(SolverFailure::Disconnected, start.elapsed());
                }
            }
        }
    }
}

fn into_outcome(model: &MilpModel, reply: EngineReply, elapsed: Duration) -> SolveOutcome {
    match reply {
        EngineReply::Solved(values) => {
            let objective = model.objective_value(&values);
            SolveOutcome::optimal(objective, values, elapsed)
        }
        EngineReply::Infeasible => SolveOutcome::without_solution(SolveStatus::Infeasible, elapsed),
        EngineReply::Unbounded => SolveOutcome::without_solution(SolveStatus::Unbounded, elapsed),
        EngineReply::Failed(message) => {
            SolveOutcome::failed(SolverFailure::Engine(message), elapsed)
        }
    }
}

/// Translates the model into `good_lp` and solves it on the current thread.
fn solve_blocking(model: &MilpModel) -> EngineReply {
    let mut vars = ::good_lp::ProblemVariables::new();
    let handles: Vec<Variable> = model
        .variables()
        .iter()
        .map(|decl| {
            let def = match decl.kind {
                VarKind::Binary => variable().binary(),
                VarKind::Continuous { lower, upper } => variable().min(lower).max(upper),
            };
            vars.add(def.name(decl.name.clone()))
        })
        .collect();

    let objective = to_expression(model.objective(), &handles);
    let mut problem = vars.minimise(objective).using(default_solver);

    for row in model.constraints() {
        let lhs = to_expression(&row.expr, &handles);
        let c = match row.cmp {
            Comparison::LessEq => constraint::leq(lhs, row.rhs),
            Comparison::GreaterEq => constraint::geq(lhs, row.rhs),
            Comparison::Equal => constraint::eq(lhs, row.rhs),
        };
        problem.add_constraint(c);
    }

    match problem.solve() {
        Ok(solution) => EngineReply::Solved(handles.iter().map(|&v| solution.value(v)).collect()),
        Err(ResolutionError::Infeasible) => EngineReply::Infeasible,
        Err(ResolutionError::Unbounded) => EngineReply::Unbounded,
        Err(e) => EngineReply::Failed(e.to_string()),
    }
}

fn to_expression(expr: &LinearExpr, handles: &[Variable]) -> Expression {
    expr.terms()
        .iter()
        .fold(Expression::from(expr.constant_term()), |acc, &(var, coef)| {
            acc + coef * handles[var.index()]
        })
}

fn panic_message(panic: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        format!("engine panicked: {s}")
    } else if let Some(s) = panic.downcast_ref::<String>() {
        format!("engine panicked: {s}")
    } else {
        "engine panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formulation::ScheduleModelBuilder;
    use crate::models::ScheduleRequest;
    use crate::solver::CancellationToken;
    use crate::validation::validate_request;

    fn pick_one() -> MilpModel {
        // min 3a + 2b + 4c  s.t.  a + b + c >= 1
        let mut m = MilpModel::new("pick_one");
        let a = m.add_binary("a");
        let b = m.add_binary("b");
        let c = m.add_binary("c");
        m.add_constraint("cover", LinearExpr::sum([a, b, c]), Comparison::GreaterEq, 1.0);
        m.set_objective(LinearExpr::weighted([(a, 3.0), (b, 2.0), (c, 4.0)]));
        m
    }

    #[test]
    fn test_solves_small_binary_model() {
        crate::logging::init_test();
        let outcome = GoodLpSolver::new().solve(&pick_one(), &SolveOptions::default());

        assert_eq!(outcome.status, SolveStatus::Optimal);
        assert!((outcome.objective_value.unwrap() - 2.0).abs() < 1e-6);
        assert_eq!(outcome.values.len(), 3);
        assert!(outcome.values[1] > 0.5);
        assert!(outcome.values[0] < 0.5 && outcome.values[2] < 0.5);
    }

    #[test]
    fn test_continuous_bounds_respected() {
        // min -x  s.t.  x in [0, 2.5]
        let mut m = MilpModel::new("bounded");
        let x = m.add_continuous("x", 0.0, 2.5);
        m.set_objective(LinearExpr::weighted([(x, -1.0)]));

        let outcome = GoodLpSolver::new().solve(&m, &SolveOptions::default());
        assert_eq!(outcome.status, SolveStatus::Optimal);
        assert!((outcome.values[0] - 2.5).abs() < 1e-6);
    }

    #[test]
    fn test_infeasible_model() {
        let mut m = MilpModel::new("infeasible");
        let a = m.add_binary("a");
        m.add_constraint("too_much", LinearExpr::sum([a]), Comparison::GreaterEq, 2.0);

        let outcome = GoodLpSolver::new().solve(&m, &SolveOptions::default());
        assert_eq!(outcome.status, SolveStatus::Infeasible);
        assert!(outcome.values.is_empty());
        assert!(outcome.objective_value.is_none());
        assert!(outcome.failure.is_none());
    }

    #[test]
    fn test_pre_cancelled_returns_not_solved() {
        let token = CancellationToken::new();
        token.cancel();
        let options = SolveOptions::default().with_cancellation(token);

        let outcome = GoodLpSolver::new().solve(&pick_one(), &options);
        assert_eq!(outcome.status, SolveStatus::NotSolved);
        assert_eq!(outcome.failure, Some(SolverFailure::Cancelled));
    }

    #[test]
    fn test_zero_time_limit_times_out() {
        let options = SolveOptions::default().with_time_limit(Duration::ZERO);

        let outcome = GoodLpSolver::new().solve(&pick_one(), &options);
        assert_eq!(outcome.status, SolveStatus::NotSolved);
        assert_eq!(outcome.failure, Some(SolverFailure::TimedOut(Duration::ZERO)));
        assert!(outcome.values.is_empty());
    }

    #[test]
    fn test_abandoned_worker_is_counted_until_it_exits() {
        let solver = GoodLpSolver::new();
        assert_eq!(solver.live_workers(), 0);

        let options = SolveOptions::default().with_time_limit(Duration::ZERO);
        let outcome = solver.solve(&pick_one(), &options);
        assert_eq!(outcome.status, SolveStatus::NotSolved);

        let deadline = Instant::now() + Duration::from_secs(10);
        while solver.live_workers() > 0 && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(solver.live_workers(), 0);
    }

    #[test]
    fn test_finished_solve_leaves_no_worker() {
        let solver = GoodLpSolver::new();
        let outcome = solver.solve(&pick_one(), &SolveOptions::default());
        assert_eq!(outcome.status, SolveStatus::Optimal);

        // the reply is sent before the guard drops
        let deadline = Instant::now() + Duration::from_secs(10);
        while solver.live_workers() > 0 && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(solver.live_workers(), 0);
    }

    #[test]
    fn test_schedule_model_minimum_changeovers() {
        let request = ScheduleRequest::new(4)
            .with_customer("A")
            .with_customer("B")
            .with_machine("M1", 10.0)
            .with_specification("S1")
            .with_specification("S2")
            .with_demand("A", "S1", 10.0)
            .with_demand("B", "S2", 10.0)
            .with_cleaning_time(1.0);
        let instance = validate_request(&request).unwrap();
        let model = ScheduleModelBuilder::new(&instance).build();

        let outcome = GoodLpSolver::new().solve(&model.milp, &SolveOptions::default());
        assert_eq!(outcome.status, SolveStatus::Optimal);
        assert!((outcome.objective_value.unwrap() - 1.0).abs() < 1e-6);
        assert!(model.milp.violated_constraints(&outcome.values, 1e-6).is_empty());
    }
}
