//! Input validation for scheduling requests.
//!
//! Checks structural integrity of a request before any model is built,
//! so a bad reference fails fast instead of surfacing as an infeasible
//! model. Detects:
//! - Duplicate or empty identifiers
//! - Demands referencing undeclared customers or specifications
//! - Missing, non-positive, or orphan machine capacities
//! - Negative demand quantities, non-positive order quantities
//! - Inconsistent shift bounds and negative cleaning time
//!
//! All problems are collected; validation does not stop at the first.

use std::collections::HashSet;
use std::fmt;

use thiserror::Error;
use tracing::{debug, warn};

use crate::models::{merge_demands, Horizon, Machine, Order, ProblemInstance, ScheduleRequest};

/// A validation error.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    /// Error category.
    pub kind: ValidationErrorKind,
    /// Offending request field (e.g. `demands[2].spec`).
    pub field: String,
    /// Human-readable description.
    pub message: String,
}

/// Categories of validation errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// Two entities share the same ID.
    DuplicateId,
    /// An identifier is empty.
    EmptyId,
    /// A demand references a customer that isn't declared.
    UnknownCustomer,
    /// A demand references a specification that isn't declared.
    UnknownSpecification,
    /// A capacity entry references a machine that isn't declared.
    UnknownMachine,
    /// A declared machine has no capacity entry.
    MissingCapacity,
    /// Capacity is zero, negative, or not finite.
    InvalidCapacity,
    /// Quantity is negative (demand), non-positive (order), or not finite.
    InvalidQuantity,
    /// Shift bounds violate `0 <= start < end <= hours_per_day`.
    InvalidHorizon,
    /// Cleaning time is negative or not finite.
    InvalidCleaningTime,
    /// Changeover cost is not finite.
    InvalidCost,
}

/// All validation errors found in one input.
#[derive(Debug, Clone, PartialEq, Error)]
pub struct ValidationErrors(pub Vec<ValidationError>);

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} validation error(s)", self.0.len())?;
        for e in &self.0 {
            write!(f, "; {}: {}", e.field, e.message)?;
        }
        Ok(())
    }
}

impl ValidationErrors {
    /// Whether any error has the given kind.
    pub fn has_kind(&self, kind: ValidationErrorKind) -> bool {
        self.0.iter().any(|e| e.kind == kind)
    }

    /// Errors as a slice.
    pub fn errors(&self) -> &[ValidationError] {
        &self.0
    }
}

impl ValidationError {
    fn new(kind: ValidationErrorKind, field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Validates a request and produces the instance the model builder uses.
///
/// Checks:
/// 1. No duplicate or empty customer, machine, or specification IDs
/// 2. Every declared machine has a positive, finite capacity
/// 3. Every capacity entry names a declared machine
/// 4. Every demand references a declared customer and specification
/// 5. Demand quantities are finite and non-negative (zero is legal)
/// 6. `0 <= shift_start_hour < shift_end_hour <= hours_per_day`
/// 7. Cleaning time is finite and non-negative; changeover cost is finite
///
/// Demands sharing a (customer, spec) pair are merged by summing.
///
/// # Returns
/// The validated instance, or `Err(errors)` with all detected issues.
pub fn validate_request(request: &ScheduleRequest) -> Result<ProblemInstance, ValidationErrors> {
    let mut errors = Vec::new();

    let customers = check_ids("customers", &request.customers, &mut errors);
    let machine_ids = check_ids("machines", &request.machines, &mut errors);
    let specs = check_ids("specifications", &request.specifications, &mut errors);

    // Capacities
    let mut machines = Vec::with_capacity(request.machines.len());
    for id in &request.machines {
        match request.machine_capacity_per_hour.get(id) {
            None => errors.push(ValidationError::new(
                ValidationErrorKind::MissingCapacity,
                format!("machine_capacity_per_hour.{id}"),
                format!("Machine '{id}' has no capacity entry"),
            )),
            Some(&cap) if !cap.is_finite() || cap <= 0.0 => errors.push(ValidationError::new(
                ValidationErrorKind::InvalidCapacity,
                format!("machine_capacity_per_hour.{id}"),
                format!("Machine '{id}' capacity must be positive, got {cap}"),
            )),
            Some(&cap) => machines.push(Machine::new(id, cap)),
        }
    }
    let mut orphan: Vec<&String> = request
        .machine_capacity_per_hour
        .keys()
        .filter(|k| !machine_ids.contains(k.as_str()))
        .collect();
    orphan.sort();
    for id in orphan {
        errors.push(ValidationError::new(
            ValidationErrorKind::UnknownMachine,
            format!("machine_capacity_per_hour.{id}"),
            format!("Capacity given for undeclared machine '{id}'"),
        ));
    }

    // Demand references
    for (i, d) in request.demands.iter().enumerate() {
        if !customers.contains(d.customer.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::UnknownCustomer,
                format!("demands[{i}].customer"),
                format!("Demand references unknown customer '{}'", d.customer),
            ));
        }
        if !specs.contains(d.spec.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::UnknownSpecification,
                format!("demands[{i}].spec"),
                format!("Demand references unknown specification '{}'", d.spec),
            ));
        }
        if !d.quantity.is_finite() || d.quantity < 0.0 {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidQuantity,
                format!("demands[{i}].quantity"),
                format!("Demand quantity must be non-negative, got {}", d.quantity),
            ));
        }
    }

    // Horizon
    if request.hours_per_day == 0 {
        errors.push(ValidationError::new(
            ValidationErrorKind::InvalidHorizon,
            "hours_per_day",
            "hours_per_day must be positive",
        ));
    }
    if request.shift_start_hour >= request.shift_end_hour {
        errors.push(ValidationError::new(
            ValidationErrorKind::InvalidHorizon,
            "shift_start_hour",
            format!(
                "shift_start_hour ({}) must be before shift_end_hour ({})",
                request.shift_start_hour, request.shift_end_hour
            ),
        ));
    }
    if request.shift_end_hour > request.hours_per_day {
        errors.push(ValidationError::new(
            ValidationErrorKind::InvalidHorizon,
            "shift_end_hour",
            format!(
                "shift_end_hour ({}) exceeds hours_per_day ({})",
                request.shift_end_hour, request.hours_per_day
            ),
        ));
    }

    if !request.cleaning_time.is_finite() || request.cleaning_time < 0.0 {
        errors.push(ValidationError::new(
            ValidationErrorKind::InvalidCleaningTime,
            "cleaning_time",
            format!("cleaning_time must be non-negative, got {}", request.cleaning_time),
        ));
    }
    if !request.changeover_cost.is_finite() {
        errors.push(ValidationError::new(
            ValidationErrorKind::InvalidCost,
            "changeover_cost",
            "changeover_cost must be finite",
        ));
    }

    if !errors.is_empty() {
        return Err(ValidationErrors(errors));
    }

    let demands = merge_demands(&request.demands);
    if demands.len() < request.demands.len() {
        debug!(
            event = "demands_merged",
            submitted = request.demands.len(),
            merged = demands.len(),
        );
    }
    if request.min_run_time > 1 {
        warn!(
            min_run_time = request.min_run_time,
            "min_run_time is recorded but not enforced by the model"
        );
    }

    Ok(ProblemInstance {
        customers: request.customers.clone(),
        machines,
        specifications: request.specifications.clone(),
        demands,
        horizon: Horizon::new(request.shift_start_hour, request.shift_end_hour),
        cleaning_time: request.cleaning_time,
        changeover_cost: request.changeover_cost,
        min_run_time: request.min_run_time,
    })
}

/// Validates a newly arrived order.
///
/// Orders must name a customer and a spec and carry a positive quantity.
pub fn validate_order(order: &Order) -> Result<(), ValidationErrors> {
    let mut errors = Vec::new();
    if order.customer.trim().is_empty() {
        errors.push(ValidationError::new(
            ValidationErrorKind::EmptyId,
            "customer",
            "Order customer is empty",
        ));
    }
    if order.spec.trim().is_empty() {
        errors.push(ValidationError::new(
            ValidationErrorKind::EmptyId,
            "spec",
            "Order spec is empty",
        ));
    }
    if !order.quantity.is_finite() || order.quantity <= 0.0 {
        errors.push(ValidationError::new(
            ValidationErrorKind::InvalidQuantity,
            "quantity",
            format!("Order quantity must be positive, got {}", order.quantity),
        ));
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(ValidationErrors(errors))
    }
}

fn check_ids<'a>(
    field: &str,
    ids: &'a [String],
    errors: &mut Vec<ValidationError>,
) -> HashSet<&'a str> {
    let mut seen = HashSet::new();
    for (i, id) in ids.iter().enumerate() {
        if id.trim().is_empty() {
            errors.push(ValidationError::new(
                ValidationErrorKind::EmptyId,
                format!("{field}[{i}]"),
                format!("Empty identifier in {field}"),
            ));
        } else if !seen.insert(id.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("{field}[{i}]"),
                format!("Duplicate ID in {field}: {id}"),
            ));
        }
    }
    seen
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_request() -> ScheduleRequest {
        ScheduleRequest::new(24)
            .with_customer("A")
            .with_customer("B")
            .with_machine("M1", 7.0)
            .with_machine("M2", 6.5)
            .with_specification("Spec1")
            .with_specification("Spec2")
            .with_demand("A", "Spec1", 50.0)
            .with_demand("B", "Spec2", 100.0)
            .with_cleaning_time(3.0)
            .with_changeover_cost(100.0)
    }

    #[test]
    fn test_valid_request() {
        let inst = validate_request(&sample_request()).unwrap();
        assert_eq!(inst.customers.len(), 2);
        assert_eq!(inst.machines[1], Machine::new("M2", 6.5));
        assert_eq!(inst.horizon, Horizon::new(0, 24));
        assert_eq!(inst.demands.len(), 2);
    }

    #[test]
    fn test_unknown_specification_fails_fast() {
        let req = sample_request().with_demand("A", "Spec9", 5.0);
        let errors = validate_request(&req).unwrap_err();
        assert!(errors.has_kind(ValidationErrorKind::UnknownSpecification));
        let e = &errors.errors()[0];
        assert_eq!(e.field, "demands[2].spec");
        assert!(e.message.contains("Spec9"));
    }

    #[test]
    fn test_unknown_customer() {
        let req = sample_request().with_demand("Z", "Spec1", 5.0);
        let errors = validate_request(&req).unwrap_err();
        assert!(errors.has_kind(ValidationErrorKind::UnknownCustomer));
    }

    #[test]
    fn test_missing_capacity() {
        let mut req = sample_request();
        req.machine_capacity_per_hour.remove("M2");
        let errors = validate_request(&req).unwrap_err();
        assert!(errors.has_kind(ValidationErrorKind::MissingCapacity));
        assert_eq!(errors.errors()[0].field, "machine_capacity_per_hour.M2");
    }

    #[test]
    fn test_non_positive_capacity() {
        let mut req = sample_request();
        req.machine_capacity_per_hour.insert("M1".into(), 0.0);
        let errors = validate_request(&req).unwrap_err();
        assert!(errors.has_kind(ValidationErrorKind::InvalidCapacity));
    }

    #[test]
    fn test_orphan_capacity() {
        let mut req = sample_request();
        req.machine_capacity_per_hour.insert("M9".into(), 5.0);
        let errors = validate_request(&req).unwrap_err();
        assert!(errors.has_kind(ValidationErrorKind::UnknownMachine));
    }

    #[test]
    fn test_zero_quantity_is_legal_negative_is_not() {
        let req = sample_request().with_demand("A", "Spec2", 0.0);
        assert!(validate_request(&req).is_ok());

        let req = sample_request().with_demand("A", "Spec2", -1.0);
        let errors = validate_request(&req).unwrap_err();
        assert!(errors.has_kind(ValidationErrorKind::InvalidQuantity));
    }

    #[test]
    fn test_duplicate_ids() {
        let req = sample_request().with_customer("A");
        let errors = validate_request(&req).unwrap_err();
        assert!(errors.has_kind(ValidationErrorKind::DuplicateId));
        assert_eq!(errors.errors()[0].field, "customers[2]");
    }

    #[test]
    fn test_invalid_horizon() {
        let req = sample_request().with_shift(8, 8);
        assert!(validate_request(&req)
            .unwrap_err()
            .has_kind(ValidationErrorKind::InvalidHorizon));

        let req = sample_request().with_shift(0, 25);
        let errors = validate_request(&req).unwrap_err();
        assert_eq!(errors.errors()[0].field, "shift_end_hour");
    }

    #[test]
    fn test_negative_cleaning_time() {
        let req = sample_request().with_cleaning_time(-0.5);
        assert!(validate_request(&req)
            .unwrap_err()
            .has_kind(ValidationErrorKind::InvalidCleaningTime));
    }

    #[test]
    fn test_duplicate_demands_are_merged() {
        let req = sample_request().with_demand("A", "Spec1", 25.0);
        let inst = validate_request(&req).unwrap();
        assert_eq!(inst.demands.len(), 2);
        assert!((inst.demands[0].quantity - 75.0).abs() < 1e-10);
    }

    #[test]
    fn test_multiple_errors_collected() {
        let mut req = sample_request()
            .with_demand("Z", "Spec9", -3.0)
            .with_cleaning_time(f64::NAN);
        req.machine_capacity_per_hour.clear();

        let errors = validate_request(&req).unwrap_err();
        // 2 missing capacities + customer + spec + quantity + cleaning
        assert_eq!(errors.errors().len(), 6);
        assert!(errors.to_string().starts_with("6 validation error(s)"));
    }

    #[test]
    fn test_validate_order() {
        assert!(validate_order(&Order::new("C", "Spec2", 100.0)).is_ok());

        let errors = validate_order(&Order::new("", "Spec2", 0.0)).unwrap_err();
        assert!(errors.has_kind(ValidationErrorKind::EmptyId));
        assert!(errors.has_kind(ValidationErrorKind::InvalidQuantity));
    }
}
