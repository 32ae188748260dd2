//! Machine model.
//!
//! A machine produces one specification at a time at a constant
//! per-hour rate. Capacity does not vary by shift.

use serde::{Deserialize, Serialize};

/// A production machine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Machine {
    /// Unique machine identifier.
    pub id: String,
    /// Quantity produced in one fully assigned hour.
    pub capacity_per_hour: f64,
}

impl Machine {
    /// Creates a machine with the given hourly capacity.
    pub fn new(id: impl Into<String>, capacity_per_hour: f64) -> Self {
        Self {
            id: id.into(),
            capacity_per_hour,
        }
    }

    /// Total quantity this machine can produce over `hours` slots.
    pub fn capacity_over(&self, hours: usize) -> f64 {
        self.capacity_per_hour * hours as f64
    }
}
