//! Core document types for the reflow engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A recurring weekly window during which a work center may perform work.
///
/// `day_of_week` is 0 = Sunday .. 6 = Saturday. Shifts are same-day only:
/// `end_hour` must be strictly greater than `start_hour`. If a work center
/// lists more than one shift for the same day-of-week, only the first entry
/// is considered; later ones are ignored.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Shift {
    pub day_of_week: u8,
    pub start_hour: u8,
    pub end_hour: u8,
}

impl Shift {
    /// Whether this entry describes a usable shift window.
    pub fn is_valid(&self) -> bool {
        self.day_of_week <= 6
            && self.start_hour <= 23
            && self.end_hour <= 23
            && self.end_hour > self.start_hour
    }
}

/// An absolute UTC interval during which a work center is unavailable.
///
/// A cursor exactly at `start` is blocked and must jump to `end`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaintenanceWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// A capacity-constrained executor of work orders ("work center").
///
/// Processes one work order at a time, governed by weekly shifts and
/// maintenance blackouts.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkCenter {
    pub id: String,
    pub name: String,
    pub shifts: Vec<Shift>,
    pub maintenance_windows: Vec<MaintenanceWindow>,
}

/// A schedulable unit of manufacturing work.
///
/// `duration_minutes` is the authoritative length when `end` is recomputed;
/// the stored `end` is authoritative only for pinned maintenance entries
/// (`is_maintenance`), which the orchestrator never reschedules.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkOrder {
    pub id: String,
    pub number: String,
    /// Owning manufacturing order. Opaque foreign key; no scheduling
    /// decision reads it.
    pub manufacturing_order_id: String,
    pub work_center_id: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub duration_minutes: i64,
    pub is_maintenance: bool,
    /// Prerequisite work order ids, in declaration order.
    pub depends_on: Vec<String>,
}

impl WorkOrder {
    /// Copy of this work order with a new start/end and every other field
    /// unchanged.
    pub fn with_schedule(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> WorkOrder {
        WorkOrder {
            start,
            end,
            ..self.clone()
        }
    }
}

/// Why a work order's schedule moved.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChangeReason {
    /// A prerequisite finished later than the planned start.
    DependencyDelay,
    /// The work center was still busy with an earlier order.
    CapacityConflict,
    /// A maintenance window forced the cursor to jump.
    MaintenanceOverlap,
    /// The cursor was moved to respect shift boundaries.
    ShiftBoundaryAdjustment,
    /// Reserved wire tag; never emitted by this engine.
    ManufacturingOrderPriority,
}

/// Insertion-ordered, duplicate-free set of change reasons.
///
/// Keeps first-seen order so serialized reason lists are deterministic.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ReasonSet(Vec<ChangeReason>);

impl ReasonSet {
    pub fn insert(&mut self, reason: ChangeReason) {
        if !self.0.contains(&reason) {
            self.0.push(reason);
        }
    }

    pub fn contains(&self, reason: ChangeReason) -> bool {
        self.0.contains(&reason)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = ChangeReason> + '_ {
        self.0.iter().copied()
    }

    pub fn into_vec(self) -> Vec<ChangeReason> {
        self.0
    }
}

/// Diff record emitted when an order's effective start or end moved.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleChange {
    pub work_order_id: String,
    pub work_order_number: String,
    pub previous_start: DateTime<Utc>,
    pub previous_end: DateTime<Utc>,
    pub new_start: DateTime<Utc>,
    pub new_end: DateTime<Utc>,
    /// Deduplicated, in first-seen order.
    pub reasons: Vec<ChangeReason>,
    /// Id of the entity that raised the start floor: the latest-finishing
    /// prerequisite, or the work center on a capacity push.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub affected_by: Option<String>,
}

/// Summary counters for one reflow pass.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReflowMetadata {
    pub total_orders_processed: usize,
    /// Sum of positive start shifts across all changes, in minutes.
    /// Accelerations do not subtract.
    pub total_delays_incurred_minutes: i64,
    pub timestamp: DateTime<Utc>,
}

/// Output of one reflow pass: the full rewritten work order set (same
/// cardinality as the input, in topological order) plus the change log.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReflowResult {
    pub updated_work_orders: Vec<WorkOrder>,
    pub changes: Vec<ScheduleChange>,
    pub explanation: String,
    pub metadata: ReflowMetadata,
}
