//! Typed variable index for the time-indexed formulation.
//!
//! Replaces tuple-keyed dictionaries with dense arenas: every
//! (customer, machine, slot, spec) key maps to exactly one `VarId` by
//! arithmetic, so constraint code reads as index math, not lookups.
//!
//! Layout is machine-major: `((machine * slots + slot) * customers +
//! customer) * specs + spec`. Iterating the arena therefore visits
//! entries in schedule order (machine, hour, customer, spec).

use crate::milp::VarId;

/// Sizes of the four index dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub customers: usize,
    pub machines: usize,
    pub slots: usize,
    pub specs: usize,
}

/// Key of an assignment variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AssignmentKey {
    pub customer: usize,
    pub machine: usize,
    pub slot: usize,
    pub spec: usize,
}

/// Dense maps from composite keys to model variables.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableIndex {
    dims: Dimensions,
    assignment: Vec<VarId>,
    setup: Vec<VarId>,
    changeover: Vec<VarId>,
}

impl Dimensions {
    /// Number of assignment variables (full cross-product).
    pub fn assignment_len(&self) -> usize {
        self.customers * self.machines * self.slots * self.specs
    }

    /// Number of setup variables.
    pub fn setup_len(&self) -> usize {
        self.machines * self.slots * self.specs
    }

    /// Number of changeover variables (no changeover after the last slot).
    pub fn changeover_len(&self) -> usize {
        self.machines * self.slots.saturating_sub(1)
    }
}

impl VariableIndex {
    /// Assembles an index from arenas laid out as described in the module docs.
    ///
    /// `setup` is either empty (no setup-state variables) or full.
    pub(crate) fn new(
        dims: Dimensions,
        assignment: Vec<VarId>,
        setup: Vec<VarId>,
        changeover: Vec<VarId>,
    ) -> Self {
        debug_assert_eq!(assignment.len(), dims.assignment_len());
        debug_assert!(setup.is_empty() || setup.len() == dims.setup_len());
        debug_assert_eq!(changeover.len(), dims.changeover_len());
        Self {
            dims,
            assignment,
            setup,
            changeover,
        }
    }

    /// Index dimensions.
    pub fn dims(&self) -> Dimensions {
        self.dims
    }

    /// Assignment variable for a key.
    ///
    /// # Panics
    /// If any key component is out of range.
    #[inline]
    pub fn assignment(&self, key: AssignmentKey) -> VarId {
        let d = &self.dims;
        assert!(
            key.customer < d.customers
                && key.machine < d.machines
                && key.slot < d.slots
                && key.spec < d.specs,
            "assignment key out of range: {key:?}"
        );
        let flat = ((key.machine * d.slots + key.slot) * d.customers + key.customer) * d.specs
            + key.spec;
        self.assignment[flat]
    }

    /// Assignment variables for `(machine, slot, spec)` across customers.
    pub fn spec_assignments(&self, machine: usize, slot: usize, spec: usize) -> Vec<VarId> {
        (0..self.dims.customers)
            .map(|customer| {
                self.assignment(AssignmentKey {
                    customer,
                    machine,
                    slot,
                    spec,
                })
            })
            .collect()
    }

    /// All assignment variables on `machine` during `slot`.
    pub fn slot_assignments(&self, machine: usize, slot: usize) -> Vec<VarId> {
        let d = &self.dims;
        let start = (machine * d.slots + slot) * d.customers * d.specs;
        self.assignment[start..start + d.customers * d.specs].to_vec()
    }

    /// Changeover variable between `slot` and `slot + 1`, if one exists.
    pub fn changeover(&self, machine: usize, slot: usize) -> Option<VarId> {
        let per_machine = self.dims.slots.saturating_sub(1);
        (machine < self.dims.machines && slot < per_machine)
            .then(|| self.changeover[machine * per_machine + slot])
    }

    /// Setup-state variable, if the formulation tracks setup state.
    pub fn setup(&self, machine: usize, slot: usize, spec: usize) -> Option<VarId> {
        if self.setup.is_empty()
            || machine >= self.dims.machines
            || slot >= self.dims.slots
            || spec >= self.dims.specs
        {
            return None;
        }
        Some(self.setup[(machine * self.dims.slots + slot) * self.dims.specs + spec])
    }

    /// Whether setup-state variables exist.
    pub fn has_setup_state(&self) -> bool {
        !self.setup.is_empty()
    }

    /// All assignment keys with their variables, in schedule order.
    pub fn assignments(&self) -> impl Iterator<Item = (AssignmentKey, VarId)> + '_ {
        let d = self.dims;
        self.assignment.iter().enumerate().map(move |(flat, &var)| {
            let spec = flat % d.specs;
            let rest = flat / d.specs;
            let customer = rest % d.customers;
            let rest = rest / d.customers;
            let slot = rest % d.slots;
            let machine = rest / d.slots;
            (
                AssignmentKey {
                    customer,
                    machine,
                    slot,
                    spec,
                },
                var,
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::milp::MilpModel;

    fn build(dims: Dimensions, with_setup: bool) -> VariableIndex {
        let mut m = MilpModel::new("index");
        let assignment = (0..dims.assignment_len())
            .map(|i| m.add_binary(format!("x{i}")))
            .collect();
        let setup = if with_setup {
            (0..dims.setup_len())
                .map(|i| m.add_binary(format!("y{i}")))
                .collect()
        } else {
            Vec::new()
        };
        let changeover = (0..dims.changeover_len())
            .map(|i| m.add_binary(format!("c{i}")))
            .collect();
        VariableIndex::new(dims, assignment, setup, changeover)
    }

    const DIMS: Dimensions = Dimensions {
        customers: 2,
        machines: 2,
        slots: 3,
        specs: 2,
    };

    #[test]
    fn test_lengths() {
        assert_eq!(DIMS.assignment_len(), 24);
        assert_eq!(DIMS.setup_len(), 12);
        assert_eq!(DIMS.changeover_len(), 4);
    }

    #[test]
    fn test_assignment_keys_round_trip_through_iteration() {
        let idx = build(DIMS, false);
        for (key, var) in idx.assignments() {
            assert_eq!(idx.assignment(key), var);
        }
        // schedule order: machine-major, then slot
        let keys: Vec<AssignmentKey> = idx.assignments().map(|(k, _)| k).collect();
        assert!(keys.windows(2).all(|w| (w[0].machine, w[0].slot) <= (w[1].machine, w[1].slot)));
    }

    #[test]
    fn test_slot_and_spec_groups() {
        let idx = build(DIMS, false);
        let slot = idx.slot_assignments(1, 2);
        assert_eq!(slot.len(), 4);
        for c in 0..2 {
            for s in 0..2 {
                let key = AssignmentKey {
                    customer: c,
                    machine: 1,
                    slot: 2,
                    spec: s,
                };
                assert!(slot.contains(&idx.assignment(key)));
            }
        }
        let spec = idx.spec_assignments(0, 1, 1);
        assert_eq!(spec.len(), 2);
        assert!(spec.iter().all(|v| slot.iter().all(|o| o != v)));
    }

    #[test]
    fn test_changeover_excludes_last_slot() {
        let idx = build(DIMS, false);
        assert!(idx.changeover(0, 0).is_some());
        assert!(idx.changeover(1, 1).is_some());
        assert!(idx.changeover(1, 2).is_none());
        assert!(idx.changeover(2, 0).is_none());
        assert_ne!(idx.changeover(0, 1), idx.changeover(1, 1));
    }

    #[test]
    fn test_setup_optional() {
        assert!(!build(DIMS, false).has_setup_state());
        assert!(build(DIMS, false).setup(0, 0, 0).is_none());

        let idx = build(DIMS, true);
        assert!(idx.has_setup_state());
        assert!(idx.setup(1, 2, 1).is_some());
        assert!(idx.setup(1, 3, 0).is_none());
    }
}
