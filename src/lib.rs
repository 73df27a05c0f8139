//! Deterministic schedule repair for manufacturing work orders.
//!
//! Given a document set of work orders and work centers, the engine
//! re-derives a feasible schedule after upstream changes (delays, new
//! orders, maintenance events): no order starts before its prerequisites
//! finish, no work center runs two orders at once, and all work lands
//! inside shift windows and outside maintenance blackouts. Disruption is
//! minimized by never moving an order earlier than its planned start and
//! placing each one greedily in the next valid slot.
//!
//! This is a constraint-repair pass, not an optimizer: throughput,
//! due-date priority, and cost are out of scope. Everything is synchronous
//! and side-effect free; independent document sets can be reflowed on
//! independent threads with no coordination.

pub mod calendar;
pub mod checker;
mod config;
pub mod logging;
mod models;
pub mod reflow;
pub mod toposort;

pub use calendar::{
    format_utc, parse_utc, place, CalendarError, Placement, PlacementOptions,
    DEFAULT_GUARD_MAX_STEPS,
};
pub use checker::{validate, ValidationError};
pub use config::ReflowConfig;
pub use models::{
    ChangeReason, MaintenanceWindow, ReasonSet, ReflowMetadata, ReflowResult, ScheduleChange,
    Shift, WorkCenter, WorkOrder,
};
pub use reflow::{reflow, ReflowError, ReflowPass};
pub use toposort::{sort_work_orders, ToposortError};
