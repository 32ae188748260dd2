//! Order and demand models.
//!
//! An order is what arrives from a customer; a demand is what the model
//! must satisfy. Orders are the unit of incremental replanning, demands
//! are the unit of the demand-satisfaction constraint.

use serde::{Deserialize, Serialize};

/// A confirmed production order.
///
/// Orders are immutable once solved against. A new arrival is a new
/// `Order`; an existing one is never edited in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    /// Customer identifier.
    pub customer: String,
    /// Product specification identifier.
    pub spec: String,
    /// Requested quantity (capacity units, e.g. tons).
    pub quantity: f64,
    /// Deadline in time units. Recorded, not enforced by the model.
    #[serde(default)]
    pub deadline: u32,
}

/// A (customer, specification, quantity) production target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Demand {
    /// Customer identifier.
    pub customer: String,
    /// Product specification identifier.
    pub spec: String,
    /// Quantity to produce. Zero is legal and trivially satisfied.
    pub quantity: f64,
}

impl Order {
    /// Creates a new order with no deadline.
    pub fn new(customer: impl Into<String>, spec: impl Into<String>, quantity: f64) -> Self {
        Self {
            customer: customer.into(),
            spec: spec.into(),
            quantity,
            deadline: 0,
        }
    }

    /// Sets the deadline.
    pub fn with_deadline(mut self, deadline: u32) -> Self {
        self.deadline = deadline;
        self
    }

    /// The demand this order contributes.
    pub fn to_demand(&self) -> Demand {
        Demand::new(&self.customer, &self.spec, self.quantity)
    }
}

impl Demand {
    /// Creates a new demand.
    pub fn new(customer: impl Into<String>, spec: impl Into<String>, quantity: f64) -> Self {
        Self {
            customer: customer.into(),
            spec: spec.into(),
            quantity,
        }
    }

    /// Whether this demand targets the same (customer, spec) pair.
    pub fn same_target(&self, other: &Demand) -> bool {
        self.customer == other.customer && self.spec == other.spec
    }
}

/// Merges demands sharing a (customer, spec) pair by summing quantities.
///
/// Assignment variables are indexed by customer, so two separate demand
/// rows for the same pair would both be satisfied by the same production.
/// First-seen order is preserved.
pub fn merge_demands<'a>(demands: impl IntoIterator<Item = &'a Demand>) -> Vec<Demand> {
    let mut merged: Vec<Demand> = Vec::new();
    for demand in demands {
        match merged.iter_mut().find(|d| d.same_target(demand)) {
            Some(existing) => existing.quantity += demand.quantity,
            None => merged.push(demand.clone()),
        }
    }
    merged
}
