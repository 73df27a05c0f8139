//! Core reflow pass implementation.

use chrono::Utc;
use rustc_hash::FxHashMap;
use thiserror::Error;

use crate::calendar::{format_utc, place, CalendarError, PlacementOptions};
use crate::config::ReflowConfig;
use crate::models::{
    ChangeReason, ReasonSet, ReflowMetadata, ReflowResult, ScheduleChange, WorkCenter, WorkOrder,
};
use crate::toposort::{sort_work_orders, ToposortError};
use crate::{log_changes, log_checks, log_debug};

use super::state::ReflowState;

/// Errors that can abort a reflow pass.
#[derive(Error, Debug)]
pub enum ReflowError {
    #[error("work center {work_center} not found for work order {work_order}")]
    MissingWorkCenter {
        work_center: String,
        work_order: String,
    },
    #[error(transparent)]
    Resolve(#[from] ToposortError),
    #[error(transparent)]
    Calendar(#[from] CalendarError),
}

/// One deterministic schedule-repair pass over a document set.
///
/// Topological order first, then greedy placement of each order into the
/// next valid slot, tracking center availability and prerequisite
/// completion as the pass advances. Identical input and config always
/// produce identical output (the metadata timestamp aside).
pub struct ReflowPass {
    work_orders: Vec<WorkOrder>,
    work_centers: FxHashMap<String, WorkCenter>,
    state: ReflowState,
    config: ReflowConfig,
}

impl ReflowPass {
    pub fn new(
        work_orders: Vec<WorkOrder>,
        work_centers: Vec<WorkCenter>,
        config: ReflowConfig,
    ) -> Self {
        let work_centers = work_centers.into_iter().map(|c| (c.id.clone(), c)).collect();
        Self {
            work_orders,
            work_centers,
            state: ReflowState::new(),
            config,
        }
    }

    /// Run the pass, consuming it.
    pub fn run(mut self) -> Result<ReflowResult, ReflowError> {
        let verbosity = self.config.verbosity;
        let sorted = sort_work_orders(&self.work_orders)?;

        let mut updated: Vec<WorkOrder> = Vec::with_capacity(sorted.len());
        let mut changes: Vec<ScheduleChange> = Vec::new();

        for wo in sorted {
            // Pinned maintenance keeps its stored schedule; it only blocks
            // whatever comes after it.
            if wo.is_maintenance {
                log_checks!(verbosity, "{}: pinned maintenance, passing through", wo.id);
                self.state.commit(&wo.id, &wo.work_center_id, wo.end);
                updated.push(wo);
                continue;
            }

            let center = self.work_centers.get(&wo.work_center_id).ok_or_else(|| {
                ReflowError::MissingWorkCenter {
                    work_center: wo.work_center_id.clone(),
                    work_order: wo.id.clone(),
                }
            })?;

            // Start floor: the plan, every prerequisite's committed end,
            // and the center's availability can each push it later.
            let mut reasons = ReasonSet::default();
            let mut affected_by: Option<String> = None;
            let mut earliest_start = wo.start;

            for dep_id in &wo.depends_on {
                if let Some(dep_end) = self.state.completed_end(dep_id) {
                    if dep_end > earliest_start {
                        earliest_start = dep_end;
                        reasons.insert(ChangeReason::DependencyDelay);
                        affected_by = Some(dep_id.clone());
                    }
                }
            }

            if let Some(next_free) = self.state.center_available_from(&wo.work_center_id) {
                if next_free > earliest_start {
                    earliest_start = next_free;
                    reasons.insert(ChangeReason::CapacityConflict);
                    affected_by = Some(wo.work_center_id.clone());
                }
            }

            log_debug!(
                verbosity,
                "{}: floor {} (planned {})",
                wo.id,
                format_utc(earliest_start),
                format_utc(wo.start)
            );

            let placed = place(
                earliest_start,
                wo.duration_minutes,
                &center.shifts,
                &center.maintenance_windows,
                PlacementOptions {
                    guard_max_steps: self.config.guard_max_steps,
                },
            )?;
            for flag in placed.flags.iter() {
                reasons.insert(flag);
            }

            if placed.actual_start != wo.start || placed.end != wo.end {
                // A move with no tagged cause is pure boundary snapping.
                if reasons.is_empty() {
                    reasons.insert(ChangeReason::ShiftBoundaryAdjustment);
                }
                log_changes!(
                    verbosity,
                    "{}: {} -> {}",
                    wo.id,
                    format_utc(wo.start),
                    format_utc(placed.actual_start)
                );
                changes.push(ScheduleChange {
                    work_order_id: wo.id.clone(),
                    work_order_number: wo.number.clone(),
                    previous_start: wo.start,
                    previous_end: wo.end,
                    new_start: placed.actual_start,
                    new_end: placed.end,
                    reasons: reasons.into_vec(),
                    affected_by,
                });
            }

            self.state.commit(&wo.id, &wo.work_center_id, placed.end);
            updated.push(wo.with_schedule(placed.actual_start, placed.end));
        }

        let total_delays = total_delay_minutes(&changes);
        Ok(ReflowResult {
            explanation: format!(
                "Reflowed {} work orders; recorded {} adjustments.",
                updated.len(),
                changes.len()
            ),
            metadata: ReflowMetadata {
                total_orders_processed: updated.len(),
                total_delays_incurred_minutes: total_delays,
                timestamp: Utc::now(),
            },
            updated_work_orders: updated,
            changes,
        })
    }
}

/// Sum of positive start shifts in minutes; accelerations do not subtract.
fn total_delay_minutes(changes: &[ScheduleChange]) -> i64 {
    changes
        .iter()
        .map(|c| (c.new_start - c.previous_start).num_minutes().max(0))
        .sum()
}

/// Reflow a document set with the default configuration.
pub fn reflow(
    work_orders: Vec<WorkOrder>,
    work_centers: Vec<WorkCenter>,
) -> Result<ReflowResult, ReflowError> {
    ReflowPass::new(work_orders, work_centers, ReflowConfig::default()).run()
}
