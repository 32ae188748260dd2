//! Incremental replanning over a growing order book.
//!
//! A [`PlanningInstance`] owns the confirmed orders plus the customer and
//! specification sets they span. Appending an order consumes the instance
//! and returns a new one; nothing is removed, and no solved model is kept.
//! Every [`optimize`](PlanningInstance::optimize) rebuilds the full model
//! over all orders.
//!
//! Previously scheduled production is not pinned: a re-solve may move
//! earlier orders to other hours or machines.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error;
use crate::models::{Order, ProblemInstance, ScheduleRequest, ScheduleResponse};
use crate::scheduler::ProductionScheduler;
use crate::solver::{CancellationToken, Solver};
use crate::validation::{validate_order, validate_request, ValidationErrors};

/// Plant parameters applied to every order-based instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplanSettings {
    /// Hourly capacity of every machine.
    pub machine_capacity_per_hour: f64,
    /// Cleaning time after a changeover, in hours.
    pub cleaning_time: f64,
    /// Penalty per changeover.
    pub changeover_cost: f64,
    /// First working hour.
    pub shift_start_hour: u32,
    /// End of working hours (exclusive); also the day length.
    pub shift_end_hour: u32,
}

impl Default for ReplanSettings {
    fn default() -> Self {
        Self {
            machine_capacity_per_hour: 20.0,
            cleaning_time: 2.5,
            changeover_cost: 1000.0,
            shift_start_hour: 0,
            shift_end_hour: 24,
        }
    }
}

/// Confirmed orders and the sets they span.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanningInstance {
    orders: Vec<Order>,
    machines: Vec<String>,
    customers: Vec<String>,
    specifications: Vec<String>,
    settings: ReplanSettings,
}

impl PlanningInstance {
    /// Creates an instance from initial orders.
    ///
    /// # Errors
    /// Returns every invalid order's errors.
    pub fn new(
        orders: Vec<Order>,
        machines: Vec<String>,
        settings: ReplanSettings,
    ) -> Result<Self, ValidationErrors> {
        let mut errors = Vec::new();
        for order in &orders {
            if let Err(e) = validate_order(order) {
                errors.extend(e.0);
            }
        }
        if !errors.is_empty() {
            return Err(ValidationErrors(errors));
        }

        let mut instance = Self {
            orders: Vec::with_capacity(orders.len()),
            machines,
            customers: Vec::new(),
            specifications: Vec::new(),
            settings,
        };
        for order in orders {
            instance.absorb(order);
        }
        Ok(instance)
    }

    /// Appends a newly confirmed order.
    ///
    /// Extends the customer and specification sets with unseen values.
    pub fn append(mut self, order: Order) -> Result<Self, ValidationErrors> {
        validate_order(&order)?;
        let customers_before = self.customers.len();
        let specs_before = self.specifications.len();
        info!(
            event = "replan_append",
            customer = %order.customer,
            spec = %order.spec,
            quantity = order.quantity,
            orders = self.orders.len() + 1,
        );
        self.absorb(order);
        info!(
            event = "replan_sets_extended",
            new_customers = self.customers.len() - customers_before,
            new_specs = self.specifications.len() - specs_before,
        );
        Ok(self)
    }

    fn absorb(&mut self, order: Order) {
        if !self.customers.contains(&order.customer) {
            self.customers.push(order.customer.clone());
        }
        if !self.specifications.contains(&order.spec) {
            self.specifications.push(order.spec.clone());
        }
        self.orders.push(order);
    }

    /// Confirmed orders, oldest first.
    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    /// Customers, in first-seen order.
    pub fn customers(&self) -> &[String] {
        &self.customers
    }

    /// Specifications, in first-seen order.
    pub fn specifications(&self) -> &[String] {
        &self.specifications
    }

    /// Machines.
    pub fn machines(&self) -> &[String] {
        &self.machines
    }

    /// Plant settings.
    pub fn settings(&self) -> &ReplanSettings {
        &self.settings
    }

    /// Scheduling request covering every order.
    pub fn to_request(&self) -> ScheduleRequest {
        let s = &self.settings;
        let mut request = ScheduleRequest::new(s.shift_end_hour)
            .with_shift(s.shift_start_hour, s.shift_end_hour)
            .with_cleaning_time(s.cleaning_time)
            .with_changeover_cost(s.changeover_cost);
        for machine in &self.machines {
            request = request.with_machine(machine.as_str(), s.machine_capacity_per_hour);
        }
        request.customers = self.customers.clone();
        request.specifications = self.specifications.clone();
        request.demands = self.orders.iter().map(Order::to_demand).collect();
        request
    }

    /// Validated problem over every order.
    pub fn to_problem(&self) -> Result<ProblemInstance, ValidationErrors> {
        validate_request(&self.to_request())
    }

    /// Rebuilds and solves the model over every order.
    pub fn optimize<S: Solver>(
        &self,
        scheduler: &ProductionScheduler<S>,
    ) -> error::Result<ScheduleResponse> {
        self.optimize_with_cancel(scheduler, CancellationToken::new())
    }

    /// [`optimize`](Self::optimize) observing a cancellation token.
    pub fn optimize_with_cancel<S: Solver>(
        &self,
        scheduler: &ProductionScheduler<S>,
        cancel: CancellationToken,
    ) -> error::Result<ScheduleResponse> {
        let problem = self.to_problem()?;
        Ok(scheduler.solve_instance(&problem, cancel))
    }
}
