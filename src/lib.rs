//! Shop-floor production scheduling as a time-indexed MILP.
//!
//! Assigns customer demands to machines hour by hour, detects
//! specification changeovers, blocks production during the cleaning
//! window after each changeover, and minimizes changeovers (or a weighted
//! changeover + completion cost). New orders can be appended and the whole
//! plan re-solved.
//!
//! # Pipeline
//!
//! ```text
//! ScheduleRequest ──validate──▶ ProblemInstance ──build──▶ ScheduleModel
//!        ▲                                                     │
//!        │                                                   solve
//! PlanningInstance (orders)                                    ▼
//!                         ProductionSchedule ◀──extract── SolveOutcome
//! ```
//!
//! # Modules
//!
//! - **`models`**: Domain types: `Order`, `Demand`, `Machine`, `Horizon`,
//!   `ScheduleRequest`/`ScheduleResponse`, `ProductionSchedule`
//! - **`validation`**: Reference and range checks, collected before building
//! - **`milp`**: Engine-neutral MILP description
//! - **`formulation`**: Model builder with a typed variable index
//! - **`solver`**: `Solver` trait, `good_lp` engine, time limit and cancellation
//! - **`extract`**: Solution values → schedule and changeover entries
//! - **`replan`**: Order book with append-and-resolve
//! - **`scheduler`**: End-to-end pipeline and KPIs
//! - **`config`**, **`logging`**, **`error`**: Ambient plumbing
//!
//! # References
//!
//! - Pochet & Wolsey (2006), "Production Planning by Mixed Integer Programming"
//! - Allahverdi et al. (2008), "A survey of scheduling problems with setup times or costs"
//! - Pinedo (2016), "Scheduling: Theory, Algorithms, and Systems"

pub mod config;
pub mod error;
pub mod extract;
pub mod formulation;
pub mod logging;
pub mod milp;
pub mod models;
pub mod replan;
pub mod scheduler;
pub mod solver;
pub mod validation;

pub use config::SchedulerConfig;
pub use error::ScheduleError;
pub use scheduler::ProductionScheduler;
