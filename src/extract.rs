//! Schedule extraction.
//!
//! Reads a solved value vector back into a [`ProductionSchedule`]. The
//! extractor only reads: it never mutates the model, and extracting the
//! same values twice yields the same schedule.
//!
//! - Binary formulation: an assignment is active when its value exceeds
//!   the threshold (0.5 by default) and produces the machine's full
//!   hourly capacity.
//! - Continuous formulation: the assignment holds a quantity, so the
//!   threshold applies to the machine's setup state instead. An entry is
//!   listed when the machine is set up for its spec and the quantity
//!   survives rounding to two decimals.
//! - A changeover is listed when its variable exceeds 0.5. Its
//!   `from_spec`/`to_spec` are the specs active at `h` and `h + 1`, or
//!   `None` for an idle side.

use tracing::debug;

use crate::formulation::{AssignmentKey, Formulation, ScheduleModel};
use crate::models::{ChangeoverEntry, ProductionSchedule, ScheduleEntry};

/// Default activity threshold.
pub const DEFAULT_THRESHOLD: f64 = 0.5;

const CHANGEOVER_THRESHOLD: f64 = 0.5;

/// Smallest continuous quantity that does not round to zero.
const MIN_QUANTITY: f64 = 0.005;

/// Converts solver values into a schedule.
#[derive(Debug, Clone, Copy)]
pub struct ScheduleExtractor<'a> {
    model: &'a ScheduleModel,
    threshold: f64,
}

impl<'a> ScheduleExtractor<'a> {
    /// Creates an extractor with the default threshold.
    pub fn new(model: &'a ScheduleModel) -> Self {
        Self {
            model,
            threshold: DEFAULT_THRESHOLD,
        }
    }

    /// Overrides the activity threshold for assignment variables.
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    /// Builds the schedule from a dense value vector.
    ///
    /// Missing values read as 0, so an empty vector yields an empty
    /// schedule.
    pub fn extract(&self, values: &[f64]) -> ProductionSchedule {
        let model = self.model;
        let inst = &model.instance;
        let dims = model.index.dims();

        let mut entries = Vec::new();
        for (key, var) in model.index.assignments() {
            if !self.is_active(values, key) {
                continue;
            }
            let machine = &inst.machines[key.machine];
            let quantity = match model.options.formulation {
                Formulation::BinaryAssignment => machine.capacity_per_hour,
                Formulation::ContinuousQuantity => round2(value_of(values, var.index())),
            };
            entries.push(ScheduleEntry::new(
                inst.customers[key.customer].as_str(),
                machine.id.as_str(),
                model.hour(key.slot),
                quantity,
                inst.specifications[key.spec].as_str(),
            ));
        }

        let mut changeovers = Vec::new();
        for m in 0..dims.machines {
            for t in 0..dims.slots {
                let Some(c) = model.index.changeover(m, t) else {
                    continue;
                };
                if value_of(values, c.index()) <= CHANGEOVER_THRESHOLD {
                    continue;
                }
                changeovers.push(ChangeoverEntry::new(
                    inst.machines[m].id.as_str(),
                    model.hour(t),
                    self.active_spec(values, m, t),
                    self.active_spec(values, m, t + 1),
                ));
            }
        }

        debug!(
            event = "schedule_extracted",
            entries = entries.len(),
            changeovers = changeovers.len(),
        );
        ProductionSchedule {
            entries,
            changeovers,
        }
    }

    /// First spec with an active assignment on `machine` during `slot`.
    fn active_spec(&self, values: &[f64], machine: usize, slot: usize) -> Option<String> {
        let dims = self.model.index.dims();
        if slot >= dims.slots {
            return None;
        }
        (0..dims.specs)
            .find(|&spec| {
                (0..dims.customers).any(|customer| {
                    self.is_active(
                        values,
                        AssignmentKey {
                            customer,
                            machine,
                            slot,
                            spec,
                        },
                    )
                })
            })
            .map(|spec| self.model.instance.specifications[spec].clone())
    }

    fn is_active(&self, values: &[f64], key: AssignmentKey) -> bool {
        let index = &self.model.index;
        let value = value_of(values, index.assignment(key).index());
        match self.model.options.formulation {
            Formulation::BinaryAssignment => value > self.threshold,
            Formulation::ContinuousQuantity => {
                value >= MIN_QUANTITY
                    && index
                        .setup(key.machine, key.slot, key.spec)
                        .map_or(true, |y| value_of(values, y.index()) > self.threshold)
            }
        }
    }
}

fn value_of(values: &[f64], index: usize) -> f64 {
    values.get(index).copied().unwrap_or(0.0)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
