//! Running state for a single reflow pass.

use chrono::{DateTime, Utc};
use rustc_hash::FxHashMap;

/// The two running maps one pass maintains: when each work center frees
/// up, and when each processed work order ends.
///
/// Owned by a single pass and discarded with it; never shared across
/// calls, so independent passes can run on independent threads.
#[derive(Clone, Debug, Default)]
pub struct ReflowState {
    center_availability: FxHashMap<String, DateTime<Utc>>,
    completed_end_times: FxHashMap<String, DateTime<Utc>>,
}

impl ReflowState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a committed end for a work order and push its center's
    /// availability forward. Availability is monotonic: a commit can
    /// never free a center earlier than an already-committed order.
    pub fn commit(&mut self, work_order_id: &str, work_center_id: &str, end: DateTime<Utc>) {
        match self.center_availability.get(work_center_id) {
            Some(current) if *current >= end => {}
            _ => {
                self.center_availability
                    .insert(work_center_id.to_string(), end);
            }
        }
        self.completed_end_times
            .insert(work_order_id.to_string(), end);
    }

    /// Instant the center frees up, if any order has committed to it.
    pub fn center_available_from(&self, work_center_id: &str) -> Option<DateTime<Utc>> {
        self.center_availability.get(work_center_id).copied()
    }

    /// Committed end of an already-processed work order.
    pub fn completed_end(&self, work_order_id: &str) -> Option<DateTime<Utc>> {
        self.completed_end_times.get(work_order_id).copied()
    }
}
