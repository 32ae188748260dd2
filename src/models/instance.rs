//! Validated problem instance.
//!
//! A `ProblemInstance` is what the model builder consumes. It is only
//! produced by validation (see [`crate::validation`]), so every demand
//! references a declared customer and spec, and every machine has a
//! positive capacity.

use serde::{Deserialize, Serialize};

use super::{Demand, Horizon, Machine};

/// A structurally valid scheduling instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProblemInstance {
    /// Customer identifiers (variable index order).
    pub customers: Vec<String>,
    /// Machines with capacities (variable index order).
    pub machines: Vec<Machine>,
    /// Specification identifiers (variable index order).
    pub specifications: Vec<String>,
    /// Demands, one per (customer, spec) pair.
    pub demands: Vec<Demand>,
    /// Working hours.
    pub horizon: Horizon,
    /// Cleaning duration after a changeover, in hours.
    pub cleaning_time: f64,
    /// Per-changeover penalty for the weighted objective.
    pub changeover_cost: f64,
    /// Declared minimum run length (not enforced).
    pub min_run_time: u32,
}

impl ProblemInstance {
    /// Index of a customer.
    pub fn customer_index(&self, id: &str) -> Option<usize> {
        self.customers.iter().position(|c| c == id)
    }

    /// Index of a specification.
    pub fn spec_index(&self, id: &str) -> Option<usize> {
        self.specifications.iter().position(|s| s == id)
    }

    /// Looks up a machine by ID.
    pub fn machine(&self, id: &str) -> Option<&Machine> {
        self.machines.iter().find(|m| m.id == id)
    }

    /// Whole cleaning hours (`floor(cleaning_time)`).
    pub fn cleaning_hours(&self) -> usize {
        self.cleaning_time.max(0.0).floor() as usize
    }

    /// Total quantity all machines can produce over the horizon.
    pub fn total_capacity(&self) -> f64 {
        self.machines
            .iter()
            .map(|m| m.capacity_over(self.horizon.len()))
            .sum()
    }

    /// Total demanded quantity.
    pub fn total_demand(&self) -> f64 {
        self.demands.iter().map(|d| d.quantity).sum()
    }
}
