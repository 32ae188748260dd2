//! Request and response shapes exchanged with the API layer.
//!
//! Field names match the JSON contract of the scheduling endpoint, so
//! these types serialize directly to and from the wire.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::{Demand, ProductionSchedule};

/// A scheduling request as received from the API layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleRequest {
    /// Declared customer identifiers.
    pub customers: Vec<String>,
    /// Declared machine identifiers.
    pub machines: Vec<String>,
    /// Declared specification identifiers.
    pub specifications: Vec<String>,
    /// Production targets.
    pub demands: Vec<Demand>,
    /// Hourly capacity per machine.
    pub machine_capacity_per_hour: HashMap<String, f64>,
    /// Cleaning duration after a changeover (hours, fractional part ignored).
    pub cleaning_time: f64,
    /// Length of the day in hours.
    pub hours_per_day: u32,
    /// Per-changeover penalty used by the weighted objective.
    pub changeover_cost: f64,
    /// Minimum continuous run length. Declared, not enforced.
    #[serde(default)]
    pub min_run_time: u32,
    /// First working hour (inclusive).
    #[serde(default)]
    pub shift_start_hour: u32,
    /// End of working hours (exclusive).
    pub shift_end_hour: u32,
}

/// Status reported to the API layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResponseStatus {
    Optimal,
    Infeasible,
    Unbounded,
    #[serde(rename = "Not Solved")]
    NotSolved,
    Undefined,
}

/// A scheduling response for the API layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleResponse {
    /// Objective value; `None` when no solution was produced.
    pub objective_value: Option<f64>,
    /// Extracted schedule and changeovers (flattened into the response).
    #[serde(flatten)]
    pub plan: ProductionSchedule,
    /// Wall-clock seconds spent building, solving and extracting.
    pub computation_time: f64,
    /// Solve status.
    pub status: ResponseStatus,
    /// Failure detail when the solve did not succeed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ScheduleRequest {
    /// Builds a request with a full-day shift and no demands.
    pub fn new(hours_per_day: u32) -> Self {
        Self {
            customers: Vec::new(),
            machines: Vec::new(),
            specifications: Vec::new(),
            demands: Vec::new(),
            machine_capacity_per_hour: HashMap::new(),
            cleaning_time: 0.0,
            hours_per_day,
            changeover_cost: 0.0,
            min_run_time: 0,
            shift_start_hour: 0,
            shift_end_hour: hours_per_day,
        }
    }

    /// Declares a customer.
    pub fn with_customer(mut self, id: impl Into<String>) -> Self {
        self.customers.push(id.into());
        self
    }

    /// Declares a machine with its hourly capacity.
    pub fn with_machine(mut self, id: impl Into<String>, capacity_per_hour: f64) -> Self {
        let id = id.into();
        self.machine_capacity_per_hour
            .insert(id.clone(), capacity_per_hour);
        self.machines.push(id);
        self
    }

    /// Declares a specification.
    pub fn with_specification(mut self, id: impl Into<String>) -> Self {
        self.specifications.push(id.into());
        self
    }

    /// Adds a demand.
    pub fn with_demand(
        mut self,
        customer: impl Into<String>,
        spec: impl Into<String>,
        quantity: f64,
    ) -> Self {
        self.demands.push(Demand::new(customer, spec, quantity));
        self
    }

    /// Sets the cleaning time.
    pub fn with_cleaning_time(mut self, hours: f64) -> Self {
        self.cleaning_time = hours;
        self
    }

    /// Sets the changeover cost.
    pub fn with_changeover_cost(mut self, cost: f64) -> Self {
        self.changeover_cost = cost;
        self
    }

    /// Sets the working-hours window.
    pub fn with_shift(mut self, start_hour: u32, end_hour: u32) -> Self {
        self.shift_start_hour = start_hour;
        self.shift_end_hour = end_hour;
        self
    }

    /// Sets the declared minimum run time.
    pub fn with_min_run_time(mut self, hours: u32) -> Self {
        self.min_run_time = hours;
        self
    }
}

impl ScheduleResponse {
    /// A response carrying no schedule.
    pub fn empty(status: ResponseStatus, computation_time: f64) -> Self {
        Self {
            objective_value: None,
            plan: ProductionSchedule::default(),
            computation_time,
            status,
            message: None,
        }
    }

    /// Whether a schedule was produced.
    pub fn is_optimal(&self) -> bool {
        self.status == ResponseStatus::Optimal
    }
}
