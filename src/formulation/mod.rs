//! Time-indexed MILP formulation of the shop-floor problem.
//!
//! Translates a validated [`ProblemInstance`] into a [`MilpModel`]:
//!
//! - `x[c,m,h,s]`: customer `c`'s spec `s` runs on machine `m` in hour `h`
//!   (binary, or a quantity in `[0, capacity]`)
//! - `y[m,h,s]`: machine `m` is set up for spec `s` in hour `h` (binary,
//!   present when setup state is tracked or quantities are continuous)
//! - `C[m,h]`: a spec change on `m` between `h` and `h+1` (binary, no
//!   variable after the last hour)
//!
//! Constraint families are listed in [`groups`]. Changeover rows only
//! force `C` up to 1 when a transition is proven; nothing forces it to 0.
//! The objective is the only pressure keeping `C` low.
//!
//! Building is a pure function of the instance and options: every call
//! produces a fresh, self-contained [`ScheduleModel`].
//!
//! # Reference
//! - Pochet & Wolsey (2006), "Production Planning by Mixed Integer
//!   Programming", Ch. 11 (small-bucket lot sizing with setups)
//! - Allahverdi et al. (2008), "A survey of scheduling problems with
//!   setup times or costs"

mod index;
mod options;

pub use index::{AssignmentKey, Dimensions, VariableIndex};
pub use options::{Formulation, ModelOptions, ObjectivePolicy};

use tracing::info;

use crate::milp::{Comparison, LinearExpr, MilpModel, VarId};
use crate::models::ProblemInstance;

/// Constraint family names used by the builder.
pub mod groups {
    /// Σ assignments ≤ 1 per machine-hour (binary formulation).
    pub const SINGLE_SPEC: &str = "single_spec";
    /// Σ quantity ≤ capacity per machine-hour (continuous formulation).
    pub const MACHINE_CAPACITY: &str = "machine_capacity";
    /// Produced quantity ≥ demand.
    pub const DEMAND: &str = "demand";
    /// `C[m,h] ≥ Σx[s1,h] + Σx[s2,h+1] − 1`.
    pub const CHANGEOVER: &str = "changeover";
    /// No production for `cleaning_hours` after a changeover.
    pub const CLEANING: &str = "cleaning";
    /// Exactly one (tracked) or at most one (untracked) setup per machine-hour.
    pub const SETUP_STATE: &str = "setup_state";
    /// Production only in the spec the machine is set up for.
    pub const SETUP_LINK: &str = "setup_link";
    /// `C[m,h] ≥ y[s1,h] + y[s2,h+1] − 1`.
    pub const SETUP_CHANGEOVER: &str = "setup_changeover";
}

/// A built model together with everything needed to read its solution.
#[derive(Debug, Clone)]
pub struct ScheduleModel {
    /// The engine-neutral MILP.
    pub milp: MilpModel,
    /// Key → variable maps.
    pub index: VariableIndex,
    /// The instance the model was built from.
    pub instance: ProblemInstance,
    /// Options the model was built with.
    pub options: ModelOptions,
}

impl ScheduleModel {
    /// Absolute hour of a slot offset.
    pub fn hour(&self, slot: usize) -> u32 {
        self.instance.horizon.hour(slot)
    }
}

/// Builds a MILP from a validated instance.
///
/// # Example
/// ```
/// use u_shopfloor::formulation::ScheduleModelBuilder;
/// use u_shopfloor::models::ScheduleRequest;
/// use u_shopfloor::validation::validate_request;
///
/// let request = ScheduleRequest::new(4)
///     .with_customer("A")
///     .with_machine("M1", 10.0)
///     .with_specification("S1")
///     .with_demand("A", "S1", 10.0);
/// let instance = validate_request(&request).unwrap();
/// let model = ScheduleModelBuilder::new(&instance).build();
/// assert_eq!(model.index.dims().slots, 4);
/// ```
pub struct ScheduleModelBuilder<'a> {
    instance: &'a ProblemInstance,
    options: ModelOptions,
}

impl<'a> ScheduleModelBuilder<'a> {
    /// Creates a builder with default options.
    pub fn new(instance: &'a ProblemInstance) -> Self {
        Self {
            instance,
            options: ModelOptions::default(),
        }
    }

    /// Replaces all options.
    pub fn with_options(mut self, options: ModelOptions) -> Self {
        self.options = options;
        self
    }

    /// Sets the formulation.
    pub fn with_formulation(mut self, formulation: Formulation) -> Self {
        self.options.formulation = formulation;
        self
    }

    /// Sets the objective policy.
    pub fn with_objective(mut self, objective: ObjectivePolicy) -> Self {
        self.options.objective = objective;
        self
    }

    /// Enables or disables setup-state tracking.
    pub fn with_setup_tracking(mut self, track: bool) -> Self {
        self.options.track_setup_state = track;
        self
    }

    /// Builds the model.
    ///
    /// Creates variables, then constraint families in order: slot
    /// occupancy, setup state, demand, changeover detection, cleaning
    /// lockout; finally the objective.
    pub fn build(&self) -> ScheduleModel {
        let inst = self.instance;
        let dims = Dimensions {
            customers: inst.customers.len(),
            machines: inst.machines.len(),
            slots: inst.horizon.len(),
            specs: inst.specifications.len(),
        };
        let continuous = self.options.formulation == Formulation::ContinuousQuantity;
        let mut milp = MilpModel::new("production_schedule");

        // Assignment variables, machine-major (see index layout)
        let mut assignment = Vec::with_capacity(dims.assignment_len());
        for machine in &inst.machines {
            for slot in 0..dims.slots {
                let hour = inst.horizon.hour(slot);
                for customer in &inst.customers {
                    for spec in &inst.specifications {
                        let name = format!("x[{customer},{},{hour},{spec}]", machine.id);
                        let var = if continuous {
                            milp.add_continuous(name, 0.0, machine.capacity_per_hour)
                        } else {
                            milp.add_binary(name)
                        };
                        assignment.push(var);
                    }
                }
            }
        }

        let mut setup = Vec::new();
        if self.options.needs_setup_state() {
            setup.reserve(dims.setup_len());
            for machine in &inst.machines {
                for slot in 0..dims.slots {
                    let hour = inst.horizon.hour(slot);
                    for spec in &inst.specifications {
                        setup.push(milp.add_binary(format!("y[{},{hour},{spec}]", machine.id)));
                    }
                }
            }
        }

        let mut changeover = Vec::with_capacity(dims.changeover_len());
        for machine in &inst.machines {
            for slot in inst.horizon.transition_slots() {
                let hour = inst.horizon.hour(slot);
                changeover.push(milp.add_binary(format!("C[{},{hour}]", machine.id)));
            }
        }

        let index = VariableIndex::new(dims, assignment, setup, changeover);

        self.add_slot_occupancy(&mut milp, &index);
        if index.has_setup_state() {
            self.add_setup_state(&mut milp, &index);
        }
        self.add_demand(&mut milp, &index);
        self.add_changeover_detection(&mut milp, &index);
        self.add_cleaning_lockout(&mut milp, &index);
        milp.set_objective(self.objective(&index));

        info!(
            event = "model_built",
            formulation = ?self.options.formulation,
            objective = ?self.options.objective,
            setup_state = index.has_setup_state(),
            variables = milp.variable_count(),
            binaries = milp.binary_count(),
            constraints = milp.constraint_count(),
        );

        ScheduleModel {
            milp,
            index,
            instance: inst.clone(),
            options: self.options,
        }
    }

    fn capacity(&self, machine: usize) -> f64 {
        self.instance.machines[machine].capacity_per_hour
    }

    fn continuous(&self) -> bool {
        self.options.formulation == Formulation::ContinuousQuantity
    }

    /// One spec per slot (binary) or hourly capacity (continuous).
    fn add_slot_occupancy(&self, milp: &mut MilpModel, index: &VariableIndex) {
        let dims = index.dims();
        for m in 0..dims.machines {
            for t in 0..dims.slots {
                let occupied = LinearExpr::sum(index.slot_assignments(m, t));
                if self.continuous() {
                    milp.add_constraint(
                        groups::MACHINE_CAPACITY,
                        occupied,
                        Comparison::LessEq,
                        self.capacity(m),
                    );
                } else {
                    milp.add_constraint(groups::SINGLE_SPEC, occupied, Comparison::LessEq, 1.0);
                }
            }
        }
    }

    fn add_setup_state(&self, milp: &mut MilpModel, index: &VariableIndex) {
        let dims = index.dims();
        let state_cmp = if self.options.track_setup_state {
            Comparison::Equal
        } else {
            Comparison::LessEq
        };

        for m in 0..dims.machines {
            for t in 0..dims.slots {
                let setups: Vec<VarId> = (0..dims.specs)
                    .filter_map(|s| index.setup(m, t, s))
                    .collect();
                if !setups.is_empty() {
                    milp.add_constraint(
                        groups::SETUP_STATE,
                        LinearExpr::sum(setups),
                        state_cmp,
                        1.0,
                    );
                }

                for s in 0..dims.specs {
                    let Some(y) = index.setup(m, t, s) else {
                        continue;
                    };
                    let produced = index.spec_assignments(m, t, s);
                    if self.continuous() {
                        // x[c,m,t,s] <= capacity * y[m,t,s]
                        let cap = self.capacity(m);
                        for x in produced {
                            milp.add_constraint(
                                groups::SETUP_LINK,
                                LinearExpr::sum([x]).with_term(y, -cap),
                                Comparison::LessEq,
                                0.0,
                            );
                        }
                    } else {
                        // Σ_c x[c,m,t,s] <= y[m,t,s]
                        milp.add_constraint(
                            groups::SETUP_LINK,
                            LinearExpr::sum(produced).with_term(y, -1.0),
                            Comparison::LessEq,
                            0.0,
                        );
                    }
                }
            }
        }
    }

    /// Σ_{m,t} yield · x[c,m,t,s] >= quantity for every demand.
    fn add_demand(&self, milp: &mut MilpModel, index: &VariableIndex) {
        let dims = index.dims();
        for demand in &self.instance.demands {
            let (Some(customer), Some(spec)) = (
                self.instance.customer_index(&demand.customer),
                self.instance.spec_index(&demand.spec),
            ) else {
                // validation guarantees declared references
                continue;
            };

            let mut produced = LinearExpr::new();
            for machine in 0..dims.machines {
                let yield_per_unit = if self.continuous() {
                    1.0
                } else {
                    self.capacity(machine)
                };
                for slot in 0..dims.slots {
                    let x = index.assignment(AssignmentKey {
                        customer,
                        machine,
                        slot,
                        spec,
                    });
                    produced.add_term(x, yield_per_unit);
                }
            }
            milp.add_constraint(groups::DEMAND, produced, Comparison::GreaterEq, demand.quantity);
        }
    }

    /// For each consecutive pair and ordered pair of distinct specs:
    /// `active(s1, t) + active(s2, t+1) - C[m,t] <= 1`.
    fn add_changeover_detection(&self, milp: &mut MilpModel, index: &VariableIndex) {
        let dims = index.dims();
        for m in 0..dims.machines {
            for t in 0..dims.slots.saturating_sub(1) {
                let Some(c) = index.changeover(m, t) else {
                    continue;
                };
                for s1 in 0..dims.specs {
                    for s2 in 0..dims.specs {
                        if s1 == s2 {
                            continue;
                        }
                        if !self.continuous() {
                            let mut expr = LinearExpr::sum(index.spec_assignments(m, t, s1));
                            expr.extend(LinearExpr::sum(index.spec_assignments(m, t + 1, s2)));
                            expr.add_term(c, -1.0);
                            milp.add_constraint(groups::CHANGEOVER, expr, Comparison::LessEq, 1.0);
                        }
                        if let (Some(from), Some(to)) =
                            (index.setup(m, t, s1), index.setup(m, t + 1, s2))
                        {
                            milp.add_constraint(
                                groups::SETUP_CHANGEOVER,
                                LinearExpr::sum([from, to]).with_term(c, -1.0),
                                Comparison::LessEq,
                                1.0,
                            );
                        }
                    }
                }
            }
        }
    }

    /// `occupied(m, t+k) + C[m,t] <= 1` for k in 1..=cleaning_hours,
    /// clipped to the horizon (scaled by capacity when continuous).
    fn add_cleaning_lockout(&self, milp: &mut MilpModel, index: &VariableIndex) {
        let dims = index.dims();
        let cleaning_hours = self.instance.cleaning_hours();
        if cleaning_hours == 0 {
            return;
        }
        for m in 0..dims.machines {
            let scale = if self.continuous() { self.capacity(m) } else { 1.0 };
            for t in 0..dims.slots.saturating_sub(1) {
                let Some(c) = index.changeover(m, t) else {
                    continue;
                };
                for k in 1..=cleaning_hours {
                    if t + k >= dims.slots {
                        break;
                    }
                    let expr = LinearExpr::sum(index.slot_assignments(m, t + k)).with_term(c, scale);
                    milp.add_constraint(groups::CLEANING, expr, Comparison::LessEq, scale);
                }
            }
        }
    }

    fn objective(&self, index: &VariableIndex) -> LinearExpr {
        let dims = index.dims();
        let changeovers = (0..dims.machines)
            .flat_map(|m| (0..dims.slots).filter_map(move |t| index.changeover(m, t)));

        match self.options.objective {
            ObjectivePolicy::ChangeoverCount => LinearExpr::sum(changeovers),
            ObjectivePolicy::WeightedCompletion => {
                let penalty = self.instance.changeover_cost;
                let mut expr = LinearExpr::weighted(changeovers.map(|c| (c, penalty)));
                for (key, x) in index.assignments() {
                    let hour = f64::from(self.instance.horizon.hour(key.slot));
                    let quantity = if self.continuous() {
                        1.0
                    } else {
                        self.capacity(key.machine)
                    };
                    if hour > 0.0 {
                        expr.add_term(x, hour * quantity);
                    }
                }
                expr
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::milp::VarKind;
    use crate::models::ScheduleRequest;
    use crate::validation::validate_request;

    /// Two customers, one machine, two specs, four hours, one cleaning hour.
    fn scenario() -> ProblemInstance {
        let request = ScheduleRequest::new(4)
            .with_customer("A")
            .with_customer("B")
            .with_machine("M1", 10.0)
            .with_specification("S1")
            .with_specification("S2")
            .with_demand("A", "S1", 10.0)
            .with_demand("B", "S2", 10.0)
            .with_cleaning_time(1.0)
            .with_changeover_cost(1000.0);
        validate_request(&request).unwrap()
    }

    fn key(customer: usize, machine: usize, slot: usize, spec: usize) -> AssignmentKey {
        AssignmentKey {
            customer,
            machine,
            slot,
            spec,
        }
    }

    #[test]
    fn test_variable_counts_untracked() {
        let model = ScheduleModelBuilder::new(&scenario())
            .with_setup_tracking(false)
            .build();

        // x: 2 customers * 1 machine * 4 hours * 2 specs; C: 1 machine * 3
        assert_eq!(model.milp.variable_count(), 16 + 3);
        assert_eq!(model.milp.binary_count(), 19);
        assert!(!model.index.has_setup_state());
    }

    #[test]
    fn test_constraint_families_untracked() {
        let model = ScheduleModelBuilder::new(&scenario())
            .with_setup_tracking(false)
            .build();
        let milp = &model.milp;

        assert_eq!(milp.constraint_count_in(groups::SINGLE_SPEC), 4);
        assert_eq!(milp.constraint_count_in(groups::DEMAND), 2);
        // 3 transitions * 2 ordered spec pairs
        assert_eq!(milp.constraint_count_in(groups::CHANGEOVER), 6);
        // 3 changeover slots * 1 cleaning hour
        assert_eq!(milp.constraint_count_in(groups::CLEANING), 3);
        assert_eq!(milp.constraint_count_in(groups::SETUP_STATE), 0);
        assert_eq!(milp.constraint_count(), 15);
    }

    #[test]
    fn test_constraint_families_tracked() {
        let model = ScheduleModelBuilder::new(&scenario()).build();
        let milp = &model.milp;

        assert_eq!(milp.variable_count(), 16 + 8 + 3);
        assert_eq!(milp.constraint_count_in(groups::SETUP_STATE), 4);
        assert_eq!(milp.constraint_count_in(groups::SETUP_LINK), 8);
        assert_eq!(milp.constraint_count_in(groups::SETUP_CHANGEOVER), 6);
        assert!(milp
            .constraints()
            .iter()
            .filter(|c| c.group == groups::SETUP_STATE)
            .all(|c| c.cmp == Comparison::Equal));
    }

    #[test]
    fn test_demand_row_uses_capacity_yield() {
        let inst = scenario();
        let model = ScheduleModelBuilder::new(&inst).build();
        let demand = model
            .milp
            .constraints()
            .iter()
            .find(|c| c.group == groups::DEMAND)
            .unwrap();

        assert_eq!(demand.cmp, Comparison::GreaterEq);
        assert!((demand.rhs - 10.0).abs() < 1e-12);
        assert_eq!(demand.expr.len(), 4);
        assert!(demand.expr.terms().iter().all(|(_, c)| (*c - 10.0).abs() < 1e-12));
    }

    #[test]
    fn test_changeover_is_lower_bound_only() {
        let inst = scenario();
        let model = ScheduleModelBuilder::new(&inst)
            .with_setup_tracking(false)
            .build();
        let idx = &model.index;
        let mut values = vec![0.0; model.milp.variable_count()];

        // A/S1 at hour 0, B/S2 at hour 2, nothing in between: no row forces C
        values[idx.assignment(key(0, 0, 0, 0)).index()] = 1.0;
        values[idx.assignment(key(1, 0, 2, 1)).index()] = 1.0;
        assert!(model.milp.violated_constraints(&values, 1e-9).is_empty());

        // Setting C to 1 anyway stays feasible: the relaxation never forces 0
        let c1 = idx.changeover(0, 1).unwrap();
        values[c1.index()] = 1.0;
        let violated = model.milp.violated_constraints(&values, 1e-9);
        // ...except that cleaning now locks hour 2
        assert!(violated.iter().all(|c| c.group == groups::CLEANING));
    }

    #[test]
    fn test_adjacent_spec_change_forces_changeover() {
        let inst = scenario();
        let model = ScheduleModelBuilder::new(&inst)
            .with_setup_tracking(false)
            .build();
        let idx = &model.index;
        let mut values = vec![0.0; model.milp.variable_count()];

        values[idx.assignment(key(0, 0, 0, 0)).index()] = 1.0;
        values[idx.assignment(key(1, 0, 1, 1)).index()] = 1.0;
        let violated = model.milp.violated_constraints(&values, 1e-9);
        assert!(violated.iter().any(|c| c.group == groups::CHANGEOVER));

        // Forcing C=1 satisfies detection but then cleaning locks hour 1
        values[idx.changeover(0, 0).unwrap().index()] = 1.0;
        let violated = model.milp.violated_constraints(&values, 1e-9);
        assert!(violated.iter().all(|c| c.group == groups::CLEANING));
        assert!(!violated.is_empty());
    }

    #[test]
    fn test_tracked_setup_counts_change_through_idle_hour() {
        let inst = scenario();
        let model = ScheduleModelBuilder::new(&inst).build();
        let idx = &model.index;
        let mut values = vec![0.0; model.milp.variable_count()];

        // S1 set up at hours 0-1, S2 at 2-3; production at 0 and 3
        values[idx.assignment(key(0, 0, 0, 0)).index()] = 1.0;
        values[idx.assignment(key(1, 0, 3, 1)).index()] = 1.0;
        for t in 0..4 {
            let spec = if t < 2 { 0 } else { 1 };
            values[idx.setup(0, t, spec).unwrap().index()] = 1.0;
        }
        let violated = model.milp.violated_constraints(&values, 1e-9);
        assert!(violated.iter().any(|c| c.group == groups::SETUP_CHANGEOVER));

        values[idx.changeover(0, 1).unwrap().index()] = 1.0;
        assert!(model.milp.violated_constraints(&values, 1e-9).is_empty());
        assert!((model.milp.objective_value(&values) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_cleaning_clipped_to_horizon() {
        let mut inst = scenario();
        inst.cleaning_time = 10.0;
        let model = ScheduleModelBuilder::new(&inst).build();
        // slot 0: k=1..3, slot 1: k=1..2, slot 2: k=1
        assert_eq!(model.milp.constraint_count_in(groups::CLEANING), 6);

        inst.cleaning_time = 0.5;
        let model = ScheduleModelBuilder::new(&inst).build();
        assert_eq!(model.milp.constraint_count_in(groups::CLEANING), 0);
    }

    #[test]
    fn test_continuous_formulation() {
        let inst = scenario();
        let model = ScheduleModelBuilder::new(&inst)
            .with_formulation(Formulation::ContinuousQuantity)
            .with_setup_tracking(false)
            .build();
        let milp = &model.milp;

        assert!(model.index.has_setup_state());
        let x = model.index.assignment(key(0, 0, 0, 0));
        assert_eq!(
            milp.variables()[x.index()].kind,
            VarKind::Continuous {
                lower: 0.0,
                upper: 10.0
            }
        );
        assert_eq!(milp.constraint_count_in(groups::MACHINE_CAPACITY), 4);
        assert_eq!(milp.constraint_count_in(groups::SINGLE_SPEC), 0);
        assert_eq!(milp.constraint_count_in(groups::CHANGEOVER), 0);
        // per customer per spec per hour
        assert_eq!(milp.constraint_count_in(groups::SETUP_LINK), 16);
        assert!(milp
            .constraints()
            .iter()
            .filter(|c| c.group == groups::SETUP_STATE)
            .all(|c| c.cmp == Comparison::LessEq));

        let cleaning = milp
            .constraints()
            .iter()
            .find(|c| c.group == groups::CLEANING)
            .unwrap();
        assert!((cleaning.rhs - 10.0).abs() < 1e-12);
    }

    #[test]
    fn test_weighted_objective() {
        let inst = scenario();
        let model = ScheduleModelBuilder::new(&inst)
            .with_objective(ObjectivePolicy::WeightedCompletion)
            .build();
        let idx = &model.index;
        let mut values = vec![0.0; model.milp.variable_count()];

        values[idx.changeover(0, 0).unwrap().index()] = 1.0;
        values[idx.assignment(key(1, 0, 2, 1)).index()] = 1.0;
        // 1000 * 1 + hour 2 * capacity 10
        assert!((model.milp.objective_value(&values) - 1020.0).abs() < 1e-9);
    }

    #[test]
    fn test_changeover_count_objective() {
        let model = ScheduleModelBuilder::new(&scenario()).build();
        assert_eq!(model.milp.objective().len(), 3);
        assert!(model
            .milp
            .objective()
            .terms()
            .iter()
            .all(|(_, c)| (*c - 1.0).abs() < 1e-12));
    }

    #[test]
    fn test_shifted_horizon_names_absolute_hours() {
        let mut inst = scenario();
        inst.horizon = crate::models::Horizon::new(8, 12);
        let model = ScheduleModelBuilder::new(&inst).build();
        assert_eq!(model.hour(0), 8);
        assert_eq!(model.milp.variables()[0].name, "x[A,M1,8,S1]");
    }

    #[test]
    fn test_rebuild_is_pure() {
        let inst = scenario();
        let a = ScheduleModelBuilder::new(&inst).build();
        let b = ScheduleModelBuilder::new(&inst).build();
        assert_eq!(a.milp, b.milp);
        assert_eq!(a.index, b.index);
    }
}
