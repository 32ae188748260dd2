//! Production schedule (solution) model.
//!
//! A production schedule is the materialized, human-usable form of a
//! solved assignment: which customer's spec runs on which machine in
//! which hour, and where the machines change over.
//!
//! The schedule can re-check itself against the plant rules of the
//! instance it was solved for (see [`ProductionSchedule::violations`]).

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use super::ProblemInstance;

/// Rounding slack allowed per schedule entry when summing quantities.
const ROUNDING_SLACK: f64 = 0.005;
const EPS: f64 = 1e-6;

/// An extracted schedule.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductionSchedule {
    /// Production entries, ordered by machine, hour, customer, spec.
    #[serde(rename = "schedule")]
    pub entries: Vec<ScheduleEntry>,
    /// Detected changeovers, ordered by machine then hour.
    pub changeovers: Vec<ChangeoverEntry>,
}

/// One non-zero assignment: `machine` produces `spec` for `customer`
/// during `hour`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    pub customer: String,
    pub machine: String,
    pub hour: u32,
    pub quantity: f64,
    pub spec: String,
}

/// A specification change on `machine` between `hour` and `hour + 1`.
///
/// Either side is `None` when the machine is idle in that slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeoverEntry {
    pub machine: String,
    pub hour: u32,
    pub from_spec: Option<String>,
    pub to_spec: Option<String>,
}

/// A plant-rule violation found in a schedule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Violation {
    /// Type of violation.
    pub violation_type: ViolationType,
    /// Related entity ID (machine or customer/spec pair).
    pub entity_id: String,
    /// Human-readable description.
    pub message: String,
    /// Severity (0-100, higher = worse).
    pub severity: i32,
}

/// Classification of schedule violations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ViolationType {
    /// More than one specification active on a machine in one hour.
    SlotConflict,
    /// Produced quantity falls short of a demand.
    DemandShortfall,
    /// A machine produces more than its hourly capacity.
    CapacityExceeded,
    /// Production during the cleaning window after a changeover.
    CleaningLockout,
    /// Entry references an unknown machine or an hour outside the horizon.
    OutsideHorizon,
}

impl ScheduleEntry {
    /// Creates a new entry.
    pub fn new(
        customer: impl Into<String>,
        machine: impl Into<String>,
        hour: u32,
        quantity: f64,
        spec: impl Into<String>,
    ) -> Self {
        Self {
            customer: customer.into(),
            machine: machine.into(),
            hour,
            quantity,
            spec: spec.into(),
        }
    }
}

impl ChangeoverEntry {
    /// Creates a new changeover entry.
    pub fn new(
        machine: impl Into<String>,
        hour: u32,
        from_spec: Option<String>,
        to_spec: Option<String>,
    ) -> Self {
        Self {
            machine: machine.into(),
            hour,
            from_spec,
            to_spec,
        }
    }
}

impl Violation {
    fn new(
        violation_type: ViolationType,
        entity_id: impl Into<String>,
        message: impl Into<String>,
        severity: i32,
    ) -> Self {
        Self {
            violation_type,
            entity_id: entity_id.into(),
            message: message.into(),
            severity,
        }
    }
}

impl ProductionSchedule {
    /// Creates an empty schedule.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether nothing is scheduled.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.changeovers.is_empty()
    }

    /// Entries on a given machine.
    pub fn entries_for_machine(&self, machine: &str) -> Vec<&ScheduleEntry> {
        self.entries.iter().filter(|e| e.machine == machine).collect()
    }

    /// Entries for a given customer.
    pub fn entries_for_customer(&self, customer: &str) -> Vec<&ScheduleEntry> {
        self.entries
            .iter()
            .filter(|e| e.customer == customer)
            .collect()
    }

    /// Total quantity produced for a (customer, spec) pair.
    pub fn produced_quantity(&self, customer: &str, spec: &str) -> f64 {
        self.entries
            .iter()
            .filter(|e| e.customer == customer && e.spec == spec)
            .map(|e| e.quantity)
            .sum()
    }

    /// Number of distinct (machine, hour) slots with production.
    pub fn production_hours(&self) -> usize {
        let mut slots: Vec<(&str, u32)> = self
            .entries
            .iter()
            .map(|e| (e.machine.as_str(), e.hour))
            .collect();
        slots.sort_unstable();
        slots.dedup();
        slots.len()
    }

    /// Number of changeovers.
    pub fn changeover_count(&self) -> usize {
        self.changeovers.len()
    }

    /// Latest production hour + 1 on any machine (0 if empty).
    pub fn completion_hour(&self) -> u32 {
        self.entries.iter().map(|e| e.hour + 1).max().unwrap_or(0)
    }

    /// Re-checks the schedule against the instance's plant rules.
    ///
    /// Checks one spec per machine-hour, hourly capacity, demand
    /// satisfaction (allowing two-decimal rounding per entry) and the
    /// cleaning lockout after every listed changeover.
    pub fn violations(&self, instance: &ProblemInstance) -> Vec<Violation> {
        let mut violations = Vec::new();

        // (machine, hour) -> (specs, total quantity)
        let mut slots: BTreeMap<(&str, u32), (Vec<&str>, f64)> = BTreeMap::new();
        for e in &self.entries {
            if instance.machine(&e.machine).is_none() || instance.horizon.slot(e.hour).is_none() {
                violations.push(Violation::new(
                    ViolationType::OutsideHorizon,
                    &e.machine,
                    format!("Entry for '{}' on '{}' at hour {}", e.customer, e.machine, e.hour),
                    100,
                ));
            }
            let slot = slots.entry((e.machine.as_str(), e.hour)).or_default();
            if !slot.0.contains(&e.spec.as_str()) {
                slot.0.push(e.spec.as_str());
            }
            slot.1 += e.quantity;
        }

        for ((machine, hour), (specs, total)) in &slots {
            if specs.len() > 1 {
                violations.push(Violation::new(
                    ViolationType::SlotConflict,
                    *machine,
                    format!("{} specs active on '{machine}' at hour {hour}", specs.len()),
                    95,
                ));
            }
            if let Some(m) = instance.machine(machine) {
                if *total > m.capacity_per_hour + EPS {
                    violations.push(Violation::new(
                        ViolationType::CapacityExceeded,
                        *machine,
                        format!(
                            "{total:.2} scheduled on '{machine}' at hour {hour}, capacity {:.2}",
                            m.capacity_per_hour
                        ),
                        90,
                    ));
                }
            }
        }

        let mut entry_counts: HashMap<(&str, &str), usize> = HashMap::new();
        for e in &self.entries {
            *entry_counts
                .entry((e.customer.as_str(), e.spec.as_str()))
                .or_insert(0) += 1;
        }
        for d in &instance.demands {
            let produced = self.produced_quantity(&d.customer, &d.spec);
            let count = entry_counts
                .get(&(d.customer.as_str(), d.spec.as_str()))
                .copied()
                .unwrap_or(0);
            let slack = EPS + ROUNDING_SLACK * count as f64;
            if produced + slack < d.quantity {
                violations.push(Violation::new(
                    ViolationType::DemandShortfall,
                    format!("{}/{}", d.customer, d.spec),
                    format!("Produced {produced:.2} of {:.2}", d.quantity),
                    80,
                ));
            }
        }

        let cleaning_hours = instance.cleaning_hours() as u32;
        for c in &self.changeovers {
            let window = (c.hour + 1)..=(c.hour + cleaning_hours);
            if let Some(e) = self
                .entries
                .iter()
                .find(|e| e.machine == c.machine && window.contains(&e.hour))
            {
                violations.push(Violation::new(
                    ViolationType::CleaningLockout,
                    &c.machine,
                    format!(
                        "Production at hour {} inside cleaning window after changeover at hour {}",
                        e.hour, c.hour
                    ),
                    85,
                ));
            }
        }

        violations
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ScheduleRequest;
    use crate::validation::validate_request;

    fn instance() -> ProblemInstance {
        let request = ScheduleRequest::new(4)
            .with_customer("A")
            .with_customer("B")
            .with_machine("M1", 10.0)
            .with_specification("S1")
            .with_specification("S2")
            .with_demand("A", "S1", 10.0)
            .with_demand("B", "S2", 10.0)
            .with_cleaning_time(1.0);
        validate_request(&request).unwrap()
    }

    fn valid_schedule() -> ProductionSchedule {
        ProductionSchedule {
            entries: vec![
                ScheduleEntry::new("A", "M1", 0, 10.0, "S1"),
                ScheduleEntry::new("B", "M1", 2, 10.0, "S2"),
            ],
            changeovers: vec![ChangeoverEntry::new("M1", 0, Some("S1".into()), None)],
        }
    }

    #[test]
    fn test_queries() {
        let s = valid_schedule();
        assert_eq!(s.entries_for_machine("M1").len(), 2);
        assert_eq!(s.entries_for_customer("B").len(), 1);
        assert!((s.produced_quantity("A", "S1") - 10.0).abs() < 1e-10);
        assert!((s.produced_quantity("A", "S2") - 0.0).abs() < 1e-10);
        assert_eq!(s.production_hours(), 2);
        assert_eq!(s.changeover_count(), 1);
        assert_eq!(s.completion_hour(), 3);
    }

    #[test]
    fn test_valid_schedule_has_no_violations() {
        assert!(valid_schedule().violations(&instance()).is_empty());
    }

    #[test]
    fn test_empty_schedule() {
        let s = ProductionSchedule::new();
        assert!(s.is_empty());
        assert_eq!(s.production_hours(), 0);
        assert_eq!(s.completion_hour(), 0);

        let v = s.violations(&instance());
        assert_eq!(
            v.iter()
                .filter(|v| v.violation_type == ViolationType::DemandShortfall)
                .count(),
            2
        );
    }

    #[test]
    fn test_cleaning_lockout_detected() {
        let mut s = valid_schedule();
        s.entries[1].hour = 1;
        let v = s.violations(&instance());
        assert!(v
            .iter()
            .any(|v| v.violation_type == ViolationType::CleaningLockout));
    }

    #[test]
    fn test_slot_conflict_and_capacity() {
        let mut s = valid_schedule();
        s.entries[1].hour = 0;
        s.changeovers.clear();
        let v = s.violations(&instance());
        assert!(v.iter().any(|v| v.violation_type == ViolationType::SlotConflict));
        assert!(v
            .iter()
            .any(|v| v.violation_type == ViolationType::CapacityExceeded));
    }

    #[test]
    fn test_outside_horizon() {
        let mut s = valid_schedule();
        s.entries.push(ScheduleEntry::new("A", "M9", 7, 1.0, "S1"));
        let v = s.violations(&instance());
        assert!(v
            .iter()
            .any(|v| v.violation_type == ViolationType::OutsideHorizon));
    }

    #[test]
    fn test_rounding_slack_on_continuous_quantities() {
        // 3 x 3.33 = 9.99 against a demand of 10: within two-decimal rounding.
        let s = ProductionSchedule {
            entries: vec![
                ScheduleEntry::new("A", "M1", 0, 3.33, "S1"),
                ScheduleEntry::new("A", "M1", 1, 3.33, "S1"),
                ScheduleEntry::new("A", "M1", 2, 3.33, "S1"),
                ScheduleEntry::new("B", "M1", 3, 10.0, "S2"),
            ],
            changeovers: vec![],
        };
        assert!(s.violations(&instance()).is_empty());
    }
}
