//! Reflow orchestration: deterministic schedule repair over a document set.
//!
//! Composes the dependency resolver and the calendar scheduler, tracking
//! per-center availability and prerequisite completion across one pass.

mod core;
mod state;

pub use core::{reflow, ReflowError, ReflowPass};
pub use state::ReflowState;
