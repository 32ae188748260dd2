//! Shop-floor scheduling domain models.
//!
//! Pure data contracts: what is ordered, what machines exist, over which
//! hours, and what the resulting schedule looks like.
//!
//! # Domain Mappings
//!
//! | u-shopfloor | Plant floor | Model |
//! |-------------|-------------|-------|
//! | Order / Demand | Customer order | Demand-satisfaction row |
//! | Machine | Line / press / mixer | Capacity per slot |
//! | Specification | Product grade | Setup state |
//! | Horizon | Shift | Time index |
//! | ProductionSchedule | Shift plan | Extracted assignment |

mod horizon;
mod instance;
mod machine;
mod order;
mod request;
mod schedule;

pub use horizon::Horizon;
pub use instance::ProblemInstance;
pub use machine::Machine;
pub use order::{merge_demands, Demand, Order};
pub use request::{ResponseStatus, ScheduleRequest, ScheduleResponse};
pub use schedule::{ChangeoverEntry, ProductionSchedule, ScheduleEntry, Violation, ViolationType};
