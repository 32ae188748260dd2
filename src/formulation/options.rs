//! Formulation and objective policies.

use serde::{Deserialize, Serialize};

/// How assignment variables measure production.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Formulation {
    /// Binary assignment: one assigned hour yields the machine's full
    /// hourly capacity.
    #[default]
    BinaryAssignment,
    /// Continuous quantity in `[0, capacity]` per (customer, machine,
    /// hour, spec), gated by binary setup variables.
    ContinuousQuantity,
}

/// What the model minimizes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectivePolicy {
    /// `Σ changeover` with unit weight.
    #[default]
    ChangeoverCount,
    /// `changeover_cost · Σ changeover + Σ hour · produced quantity`.
    WeightedCompletion,
}

/// Options controlling model construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelOptions {
    /// Assignment-variable semantics.
    pub formulation: Formulation,
    /// Objective policy.
    pub objective: ObjectivePolicy,
    /// Keep every machine in exactly one setup state per hour, so a spec
    /// change through an idle hour still counts as a changeover.
    ///
    /// When `false` the binary formulation only detects changeovers
    /// between two consecutive producing hours.
    pub track_setup_state: bool,
}

impl Default for ModelOptions {
    fn default() -> Self {
        Self {
            formulation: Formulation::default(),
            objective: ObjectivePolicy::default(),
            track_setup_state: true,
        }
    }
}

impl ModelOptions {
    /// Whether the built model carries setup-state variables.
    pub fn needs_setup_state(&self) -> bool {
        self.track_setup_state || self.formulation == Formulation::ContinuousQuantity
    }
}
