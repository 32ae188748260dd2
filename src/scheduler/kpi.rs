//! Schedule quality metrics (KPIs).
//!
//! Computes shop-floor performance indicators from an extracted
//! production schedule and the instance it was solved for.
//!
//! # Metrics
//!
//! | Metric | Definition |
//! |--------|-----------|
//! | Completion hour | Latest producing hour + 1 |
//! | Production hours | Distinct (machine, hour) slots with output |
//! | Idle hours | Machine-hours in the horizon without output |
//! | Changeovers | Listed spec changes across all machines |
//! | Utilization | Producing hours / horizon length, per machine |
//! | Fill rate | Σ min(produced, demanded) / Σ demanded |
//! | Overproduction | Σ max(0, produced - demanded) |
//!
//! # Reference
//! Pinedo (2016), "Scheduling", Ch. 1.2: Performance Measures

use std::collections::HashMap;

use crate::models::{ProblemInstance, ProductionSchedule};

/// Schedule performance indicators.
///
/// Time values are in hours.
#[derive(Debug, Clone)]
pub struct ScheduleKpi {
    /// Latest producing hour + 1 (0 when nothing is produced).
    pub completion_hour: u32,
    /// Machine-hours with production.
    pub production_hours: usize,
    /// Machine-hours without production.
    pub idle_hours: usize,
    /// Number of changeovers.
    pub changeovers: usize,
    /// Average machine utilization (0.0..1.0).
    pub avg_utilization: f64,
    /// Per-machine utilization.
    pub utilization_by_machine: HashMap<String, f64>,
    /// Fraction of demanded quantity produced (0.0..1.0).
    pub fill_rate: f64,
    /// Quantity produced beyond demand.
    pub overproduction: f64,
}

impl ScheduleKpi {
    /// Computes KPIs from a schedule and its instance.
    pub fn calculate(schedule: &ProductionSchedule, instance: &ProblemInstance) -> Self {
        let horizon = instance.horizon.len();

        let mut utilization_by_machine = HashMap::with_capacity(instance.machines.len());
        let mut production_hours = 0;
        for machine in &instance.machines {
            let mut hours: Vec<u32> = schedule
                .entries_for_machine(&machine.id)
                .iter()
                .map(|e| e.hour)
                .collect();
            hours.sort_unstable();
            hours.dedup();
            production_hours += hours.len();

            let utilization = if horizon == 0 {
                0.0
            } else {
                hours.len() as f64 / horizon as f64
            };
            utilization_by_machine.insert(machine.id.clone(), utilization);
        }

        let avg_utilization = if utilization_by_machine.is_empty() {
            0.0
        } else {
            utilization_by_machine.values().sum::<f64>() / utilization_by_machine.len() as f64
        };

        let mut demanded = 0.0;
        let mut filled = 0.0;
        let mut overproduction = 0.0;
        for d in &instance.demands {
            let produced = schedule.produced_quantity(&d.customer, &d.spec);
            demanded += d.quantity;
            filled += produced.min(d.quantity);
            overproduction += (produced - d.quantity).max(0.0);
        }
        let fill_rate = if demanded <= 0.0 {
            1.0
        } else {
            filled / demanded
        };

        Self {
            completion_hour: schedule.completion_hour(),
            production_hours,
            idle_hours: (horizon * instance.machines.len()).saturating_sub(production_hours),
            changeovers: schedule.changeover_count(),
            avg_utilization,
            utilization_by_machine,
            fill_rate,
            overproduction,
        }
    }

    /// Whether the schedule meets the given quality thresholds.
    pub fn meets_thresholds(&self, max_changeovers: usize, min_fill_rate: f64) -> bool {
        self.changeovers <= max_changeovers && self.fill_rate >= min_fill_rate
    }
}
