//! Constraint checking for candidate schedules.
//!
//! Re-derives violations from the documents alone, with no knowledge of
//! how the schedule was produced. Used as an acceptance oracle over reflow
//! output, and equally able to certify hand-authored schedules.

use chrono::{DateTime, Utc};
use rustc_hash::FxHashMap;
use thiserror::Error;

use crate::models::{WorkCenter, WorkOrder};

/// First violation found in a candidate schedule.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("dependency violation: {work_order} starts before prerequisite {prerequisite} ends")]
    DependencyViolation {
        work_order: String,
        prerequisite: String,
    },
    #[error("capacity conflict: {first} and {second} overlap on work center {work_center}")]
    CapacityConflict {
        first: String,
        second: String,
        work_center: String,
    },
    #[error("maintenance conflict: {work_order} overlaps a maintenance window on work center {work_center}")]
    MaintenanceConflict {
        work_order: String,
        work_center: String,
    },
    #[error("invalid interval on {context}: end precedes start")]
    InvalidInterval { context: String },
}

/// Validate a document set against dependency, capacity, and maintenance
/// constraints. Fails on the first violation found.
///
/// Work orders whose center is absent from `work_centers` skip the
/// maintenance check: the checker certifies partial document sets, and
/// only the orchestrator insists on center presence.
pub fn validate(
    work_orders: &[WorkOrder],
    work_centers: &[WorkCenter],
) -> Result<(), ValidationError> {
    let orders_by_id: FxHashMap<&str, &WorkOrder> =
        work_orders.iter().map(|o| (o.id.as_str(), o)).collect();
    let centers_by_id: FxHashMap<&str, &WorkCenter> =
        work_centers.iter().map(|c| (c.id.as_str(), c)).collect();

    for wo in work_orders {
        check_interval(wo.start, wo.end, &wo.id)?;

        // Prerequisites present in the set must finish before this starts.
        for dep_id in &wo.depends_on {
            if let Some(dep) = orders_by_id.get(dep_id.as_str()) {
                if wo.start < dep.end {
                    return Err(ValidationError::DependencyViolation {
                        work_order: wo.id.clone(),
                        prerequisite: dep_id.clone(),
                    });
                }
            }
        }

        // One order at a time per work center; touching endpoints are fine.
        for other in work_orders {
            if other.id == wo.id || other.work_center_id != wo.work_center_id {
                continue;
            }
            check_interval(other.start, other.end, &other.id)?;
            if intervals_overlap(wo.start, wo.end, other.start, other.end) {
                return Err(ValidationError::CapacityConflict {
                    first: wo.id.clone(),
                    second: other.id.clone(),
                    work_center: wo.work_center_id.clone(),
                });
            }
        }

        if let Some(center) = centers_by_id.get(wo.work_center_id.as_str()) {
            for window in &center.maintenance_windows {
                check_interval(window.start, window.end, "maintenance window")?;
                if intervals_overlap(wo.start, wo.end, window.start, window.end) {
                    return Err(ValidationError::MaintenanceConflict {
                        work_order: wo.id.clone(),
                        work_center: center.id.clone(),
                    });
                }
            }
        }
    }

    Ok(())
}

/// Half-open `[start, end)` intersection: touching endpoints do not overlap.
fn intervals_overlap(
    a_start: DateTime<Utc>,
    a_end: DateTime<Utc>,
    b_start: DateTime<Utc>,
    b_end: DateTime<Utc>,
) -> bool {
    a_start < b_end && b_start < a_end
}

fn check_interval(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    context: &str,
) -> Result<(), ValidationError> {
    if end < start {
        return Err(ValidationError::InvalidInterval {
            context: context.to_string(),
        });
    }
    Ok(())
}
