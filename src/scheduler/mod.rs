//! End-to-end scheduling pipeline and KPI evaluation.
//!
//! `ProductionScheduler` runs validate → build → solve → extract for one
//! request and assembles the API response. Each call builds a fresh
//! model; the scheduler itself holds only configuration and the engine.
//!
//! # KPI
//!
//! `ScheduleKpi` computes shop-floor metrics: utilization, idle hours,
//! changeovers and demand fill rate.
//!
//! # References
//!
//! - Pochet & Wolsey (2006), "Production Planning by Mixed Integer Programming"
//! - Pinedo (2016), "Scheduling: Theory, Algorithms, and Systems", Ch. 1

mod kpi;

pub use kpi::ScheduleKpi;

use std::time::Instant;

use tracing::{debug, info, warn};

use crate::config::SchedulerConfig;
use crate::error::Result;
use crate::extract::ScheduleExtractor;
use crate::formulation::{ScheduleModel, ScheduleModelBuilder};
use crate::models::{
    ProblemInstance, ProductionSchedule, ResponseStatus, ScheduleRequest, ScheduleResponse,
};
use crate::solver::{CancellationToken, GoodLpSolver, SolveOptions, Solver};
use crate::validation::validate_request;

/// Optimizing production scheduler.
///
/// # Example
/// ```no_run
/// use u_shopfloor::models::ScheduleRequest;
/// use u_shopfloor::scheduler::ProductionScheduler;
///
/// let request = ScheduleRequest::new(4)
///     .with_customer("A")
///     .with_machine("M1", 10.0)
///     .with_specification("S1")
///     .with_demand("A", "S1", 10.0);
///
/// let response = ProductionScheduler::new().schedule(&request).unwrap();
/// assert!(response.is_optimal());
/// ```
#[derive(Debug, Clone)]
pub struct ProductionScheduler<S: Solver = GoodLpSolver> {
    solver: S,
    config: SchedulerConfig,
}

impl ProductionScheduler<GoodLpSolver> {
    /// Creates a scheduler on the default engine and configuration.
    pub fn new() -> Self {
        Self::with_solver(GoodLpSolver::new())
    }
}

impl Default for ProductionScheduler<GoodLpSolver> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Solver> ProductionScheduler<S> {
    /// Creates a scheduler on a custom engine.
    pub fn with_solver(solver: S) -> Self {
        Self {
            solver,
            config: SchedulerConfig::default(),
        }
    }

    /// Sets the configuration.
    pub fn with_config(mut self, config: SchedulerConfig) -> Self {
        self.config = config;
        self
    }

    /// Active configuration.
    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Validates and solves a request.
    ///
    /// # Errors
    /// Returns [`ScheduleError::Validation`](crate::ScheduleError::Validation)
    /// with every problem found in
    /// the request. Solver outcomes are reported through the response
    /// status, never as errors.
    pub fn schedule(&self, request: &ScheduleRequest) -> Result<ScheduleResponse> {
        self.schedule_with_cancel(request, CancellationToken::new())
    }

    /// [`schedule`](Self::schedule) observing a cancellation token.
    pub fn schedule_with_cancel(
        &self,
        request: &ScheduleRequest,
        cancel: CancellationToken,
    ) -> Result<ScheduleResponse> {
        let instance = validate_request(request)?;
        Ok(self.solve_instance(&instance, cancel))
    }

    /// Builds the model for a validated instance with the configured options.
    pub fn build_model(&self, instance: &ProblemInstance) -> ScheduleModel {
        ScheduleModelBuilder::new(instance)
            .with_options(self.config.model)
            .build()
    }

    /// Builds, solves and extracts a validated instance.
    ///
    /// Demand above the total machine capacity of the horizon is reported
    /// as infeasible without building a model.
    pub fn solve_instance(
        &self,
        instance: &ProblemInstance,
        cancel: CancellationToken,
    ) -> ScheduleResponse {
        let start = Instant::now();
        let demand = instance.total_demand();
        let capacity = instance.total_capacity();
        if demand > capacity + 1e-9 {
            debug!(event = "capacity_shortfall", demand, capacity);
            let response =
                ScheduleResponse::empty(ResponseStatus::Infeasible, start.elapsed().as_secs_f64());
            info!(event = "schedule_done", status = ?response.status, entries = 0);
            return response;
        }

        let model = self.build_model(instance);
        let options = SolveOptions::default()
            .with_time_limit(self.config.time_limit())
            .with_cancellation(cancel);

        let outcome = self.solver.solve(&model.milp, &options);

        let plan = if outcome.has_solution() {
            ScheduleExtractor::new(&model)
                .with_threshold(self.config.extraction.threshold)
                .extract(&outcome.values)
        } else {
            ProductionSchedule::default()
        };

        if outcome.has_solution() {
            let violations = plan.violations(instance);
            if !violations.is_empty() {
                warn!(
                    event = "schedule_violations",
                    count = violations.len(),
                    first = %violations[0].message,
                );
            }
        }

        let response = ScheduleResponse {
            objective_value: outcome.objective_value,
            plan,
            computation_time: start.elapsed().as_secs_f64(),
            status: outcome.status.into(),
            message: outcome.failure.as_ref().map(ToString::to_string),
        };
        info!(
            event = "schedule_done",
            status = ?response.status,
            entries = response.plan.entries.len(),
            changeovers = response.plan.changeovers.len(),
            seconds = response.computation_time,
        );
        response
    }
}
