//! Calendar-aware slot calculation.
//!
//! Maps a proposed start and a duration onto actual working time for one
//! work center: work pauses at shift boundaries and resumes in the next
//! shift window, and maintenance blackouts are jumped over entirely. Pure
//! function of its inputs; all arithmetic is in whole UTC minutes.

use chrono::{DateTime, Datelike, Days, Duration, NaiveTime, SecondsFormat, Utc};
use thiserror::Error;

use crate::models::{ChangeReason, MaintenanceWindow, ReasonSet, Shift};

/// Default step budget for one placement call. Generous: real
/// configurations stay far below it, only infeasible ones reach it.
pub const DEFAULT_GUARD_MAX_STEPS: u32 = 20_000;

/// Errors raised while placing work on the calendar.
#[derive(Error, Debug)]
pub enum CalendarError {
    #[error("duration must be >= 0 minutes (got {0})")]
    InvalidDuration(i64),
    #[error("no shifts configured for work center; cannot schedule any work")]
    NoShiftsConfigured,
    #[error("no valid shifts configured (expected day-of-week 0-6, end hour > start hour)")]
    NoValidShifts,
    #[error("invalid shift hours: start_hour={start_hour}, end_hour={end_hour}")]
    InvalidShiftHours { start_hour: u8, end_hour: u8 },
    #[error("guard limit must be a positive number of steps")]
    InvalidGuardLimit,
    #[error(
        "placement exceeded guard limit of {0} steps; likely impossible constraints \
         (e.g. maintenance blocking every instance of the only weekly shift)"
    )]
    GuardLimitExceeded(u32),
    #[error("invalid timestamp {value:?}: not an RFC 3339 UTC instant")]
    InvalidTimestamp {
        value: String,
        #[source]
        source: chrono::format::ParseError,
    },
}

/// Options for one placement call.
#[derive(Clone, Copy, Debug)]
pub struct PlacementOptions {
    /// Upper bound on walk steps before the call is declared infeasible.
    /// Small values are a legitimate latency bound for pathological inputs.
    pub guard_max_steps: u32,
}

impl Default for PlacementOptions {
    fn default() -> Self {
        Self {
            guard_max_steps: DEFAULT_GUARD_MAX_STEPS,
        }
    }
}

/// A placed slot: where work actually starts and ends, plus every
/// adjustment the walk had to make.
#[derive(Clone, Debug)]
pub struct Placement {
    pub actual_start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub flags: ReasonSet,
}

/// Per-call step counter threaded through the walk. Local state only, so
/// concurrent placements stay independent.
struct StepGuard {
    limit: u32,
    steps: u32,
}

impl StepGuard {
    fn new(limit: u32) -> Self {
        Self { limit, steps: 0 }
    }

    fn bump(&mut self) -> Result<(), CalendarError> {
        self.steps += 1;
        if self.steps > self.limit {
            Err(CalendarError::GuardLimitExceeded(self.limit))
        } else {
            Ok(())
        }
    }
}

/// Parse an RFC 3339 timestamp with any fixed offset, normalized to UTC.
pub fn parse_utc(value: &str) -> Result<DateTime<Utc>, CalendarError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|source| CalendarError::InvalidTimestamp {
            value: value.to_string(),
            source,
        })
}

/// Format as seconds-precision RFC 3339 with a trailing `Z`.
pub fn format_utc(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Place `duration_minutes` of work at or after `proposed_start`,
/// pausing across shift boundaries and jumping maintenance windows.
///
/// Flags accumulate on the returned [`Placement`]: `MaintenanceOverlap`
/// whenever a blackout forces a jump, `ShiftBoundaryAdjustment` whenever
/// the cursor moves to respect shift windows (including the initial snap).
pub fn place(
    proposed_start: DateTime<Utc>,
    duration_minutes: i64,
    shifts: &[Shift],
    maintenance: &[MaintenanceWindow],
    options: PlacementOptions,
) -> Result<Placement, CalendarError> {
    if duration_minutes < 0 {
        return Err(CalendarError::InvalidDuration(duration_minutes));
    }
    if shifts.is_empty() {
        return Err(CalendarError::NoShiftsConfigured);
    }
    if !shifts.iter().any(Shift::is_valid) {
        return Err(CalendarError::NoValidShifts);
    }
    if options.guard_max_steps == 0 {
        return Err(CalendarError::InvalidGuardLimit);
    }

    let mut flags = ReasonSet::default();
    let mut guard = StepGuard::new(options.guard_max_steps);
    let mut pos = jump_past_maintenance(proposed_start, maintenance, &mut flags);

    // Snap the cursor to a working instant.
    loop {
        guard.bump()?;

        let Some(shift) = shift_for_day(shifts, weekday_index(pos)) else {
            flags.insert(ChangeReason::ShiftBoundaryAdjustment);
            pos = jump_past_maintenance(next_day_start(pos), maintenance, &mut flags);
            continue;
        };
        let (shift_start, shift_end) = shift_window(pos, shift)?;

        if pos < shift_start {
            flags.insert(ChangeReason::ShiftBoundaryAdjustment);
            pos = jump_past_maintenance(shift_start, maintenance, &mut flags);
            continue;
        }
        if pos >= shift_end {
            flags.insert(ChangeReason::ShiftBoundaryAdjustment);
            pos = jump_past_maintenance(next_day_start(pos), maintenance, &mut flags);
            continue;
        }
        break;
    }

    let actual_start = pos;
    let mut remaining = duration_minutes;

    // Consume working minutes, pausing and resuming as the calendar allows.
    while remaining > 0 {
        guard.bump()?;

        pos = jump_past_maintenance(pos, maintenance, &mut flags);

        let Some(shift) = shift_for_day(shifts, weekday_index(pos)) else {
            flags.insert(ChangeReason::ShiftBoundaryAdjustment);
            pos = next_day_start(pos);
            continue;
        };
        let (shift_start, shift_end) = shift_window(pos, shift)?;

        if pos < shift_start {
            flags.insert(ChangeReason::ShiftBoundaryAdjustment);
            pos = shift_start;
            continue;
        }
        if pos >= shift_end {
            flags.insert(ChangeReason::ShiftBoundaryAdjustment);
            pos = next_day_start(pos);
            continue;
        }

        // Work until the shift ends or the nearest upcoming maintenance
        // window starts, whichever comes first.
        let mut next_interruption = shift_end;
        for window in maintenance {
            if window.start > pos && window.start < next_interruption {
                next_interruption = window.start;
            }
        }

        let available = (next_interruption - pos).num_minutes();
        if available <= 0 {
            pos = next_interruption;
            continue;
        }

        let worked = remaining.min(available);
        remaining -= worked;
        pos = pos + Duration::minutes(worked);

        // Landing exactly on a blackout boundary is blocked.
        if let Some(window) = maintenance_window_at(pos, maintenance) {
            if pos == window.start {
                flags.insert(ChangeReason::MaintenanceOverlap);
                pos = window.end;
            }
        }
    }

    Ok(Placement {
        actual_start,
        end: pos,
        flags,
    })
}

/// Day-of-week as 0 = Sunday .. 6 = Saturday.
fn weekday_index(pos: DateTime<Utc>) -> u8 {
    pos.weekday().num_days_from_sunday() as u8
}

/// First shift listed for the given day-of-week, if any.
fn shift_for_day(shifts: &[Shift], day: u8) -> Option<&Shift> {
    shifts.iter().find(|s| s.day_of_week == day)
}

/// Midnight at the start of the day after `pos`.
fn next_day_start(pos: DateTime<Utc>) -> DateTime<Utc> {
    let next = pos
        .date_naive()
        .checked_add_days(Days::new(1))
        .unwrap_or_else(|| pos.date_naive());
    next.and_time(NaiveTime::MIN).and_utc()
}

/// The shift's absolute window on the day `pos` falls on.
fn shift_window(
    pos: DateTime<Utc>,
    shift: &Shift,
) -> Result<(DateTime<Utc>, DateTime<Utc>), CalendarError> {
    if shift.start_hour > 23 || shift.end_hour > 23 {
        return Err(CalendarError::InvalidShiftHours {
            start_hour: shift.start_hour,
            end_hour: shift.end_hour,
        });
    }
    if shift.end_hour <= shift.start_hour {
        return Err(CalendarError::NoValidShifts);
    }

    let midnight = pos.date_naive().and_time(NaiveTime::MIN).and_utc();
    Ok((
        midnight + Duration::hours(i64::from(shift.start_hour)),
        midnight + Duration::hours(i64::from(shift.end_hour)),
    ))
}

/// The maintenance window blocking `pos`, if any. The start boundary is
/// blocked; the end boundary is not. Zero-width windows block nothing.
fn maintenance_window_at(
    pos: DateTime<Utc>,
    maintenance: &[MaintenanceWindow],
) -> Option<&MaintenanceWindow> {
    maintenance.iter().find(|w| pos >= w.start && pos < w.end)
}

/// Advance past every maintenance window covering `pos`. Windows may
/// chain: the end of one can sit inside the next.
fn jump_past_maintenance(
    pos: DateTime<Utc>,
    maintenance: &[MaintenanceWindow],
    flags: &mut ReasonSet,
) -> DateTime<Utc> {
    let mut cursor = pos;
    while let Some(window) = maintenance_window_at(cursor, maintenance) {
        flags.insert(ChangeReason::MaintenanceOverlap);
        cursor = window.end;
    }
    cursor
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    // January 2026: the 5th is a Monday, the 9th a Friday.
    fn ts(day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, day, hour, minute, 0).unwrap()
    }

    fn weekday_shifts() -> Vec<Shift> {
        (1..=5)
            .map(|day_of_week| Shift {
                day_of_week,
                start_hour: 8,
                end_hour: 17,
            })
            .collect()
    }

    fn window(start: DateTime<Utc>, end: DateTime<Utc>) -> MaintenanceWindow {
        MaintenanceWindow {
            start,
            end,
            reason: None,
        }
    }

    fn opts() -> PlacementOptions {
        PlacementOptions::default()
    }

    #[test]
    fn test_work_within_single_shift() {
        let placed = place(ts(5, 8, 0), 60, &weekday_shifts(), &[], opts()).unwrap();
        assert_eq!(placed.actual_start, ts(5, 8, 0));
        assert_eq!(placed.end, ts(5, 9, 0));
        assert!(placed.flags.is_empty());
    }

    #[test]
    fn test_pause_resume_across_shift_boundary() {
        // Monday 16:00 + 120 min: 60 on Monday, 60 on Tuesday.
        let placed = place(ts(5, 16, 0), 120, &weekday_shifts(), &[], opts()).unwrap();
        assert_eq!(placed.actual_start, ts(5, 16, 0));
        assert_eq!(placed.end, ts(6, 9, 0));
        assert!(placed.flags.contains(ChangeReason::ShiftBoundaryAdjustment));
    }

    #[test]
    fn test_weekend_skipped_entirely() {
        // Friday 16:00 + 120 min resumes Monday 08:00.
        let placed = place(ts(9, 16, 0), 120, &weekday_shifts(), &[], opts()).unwrap();
        assert_eq!(placed.end, ts(12, 9, 0));
    }

    #[test]
    fn test_start_before_shift_snaps_forward() {
        let placed = place(ts(5, 6, 0), 60, &weekday_shifts(), &[], opts()).unwrap();
        assert_eq!(placed.actual_start, ts(5, 8, 0));
        assert_eq!(placed.end, ts(5, 9, 0));
        assert!(placed.flags.contains(ChangeReason::ShiftBoundaryAdjustment));
    }

    #[test]
    fn test_maintenance_splits_work() {
        // 30 min before the window, 150 after it ends.
        let maintenance = vec![window(ts(5, 10, 0), ts(5, 12, 0))];
        let placed = place(ts(5, 9, 30), 180, &weekday_shifts(), &maintenance, opts()).unwrap();
        assert_eq!(placed.actual_start, ts(5, 9, 30));
        assert_eq!(placed.end, ts(5, 14, 30));
        assert!(placed.flags.contains(ChangeReason::MaintenanceOverlap));
    }

    #[test]
    fn test_work_ending_before_maintenance_is_untouched() {
        let maintenance = vec![window(ts(5, 10, 0), ts(5, 12, 0))];
        let placed = place(ts(5, 8, 0), 60, &weekday_shifts(), &maintenance, opts()).unwrap();
        assert_eq!(placed.end, ts(5, 9, 0));
        assert!(placed.flags.is_empty());
    }

    #[test]
    fn test_start_inside_maintenance_snaps_to_window_end() {
        let maintenance = vec![window(ts(5, 10, 0), ts(5, 12, 0))];
        let placed = place(ts(5, 10, 30), 60, &weekday_shifts(), &maintenance, opts()).unwrap();
        assert_eq!(placed.actual_start, ts(5, 12, 0));
        assert_eq!(placed.end, ts(5, 13, 0));
        assert!(placed.flags.contains(ChangeReason::MaintenanceOverlap));
    }

    #[test]
    fn test_start_exactly_at_maintenance_start_is_blocked() {
        let maintenance = vec![window(ts(5, 10, 0), ts(5, 12, 0))];
        let placed = place(ts(5, 10, 0), 60, &weekday_shifts(), &maintenance, opts()).unwrap();
        assert_eq!(placed.actual_start, ts(5, 12, 0));
    }

    #[test]
    fn test_chained_maintenance_windows() {
        let maintenance = vec![
            window(ts(5, 10, 0), ts(5, 11, 0)),
            window(ts(5, 11, 0), ts(5, 12, 30)),
        ];
        let placed = place(ts(5, 10, 30), 30, &weekday_shifts(), &maintenance, opts()).unwrap();
        assert_eq!(placed.actual_start, ts(5, 12, 30));
        assert_eq!(placed.end, ts(5, 13, 0));
    }

    #[test]
    fn test_zero_duration_still_snaps() {
        // Saturday input, zero minutes: start and end land on Monday 08:00.
        let placed = place(ts(10, 9, 0), 0, &weekday_shifts(), &[], opts()).unwrap();
        assert_eq!(placed.actual_start, ts(12, 8, 0));
        assert_eq!(placed.end, ts(12, 8, 0));
    }

    #[test]
    fn test_negative_duration_rejected() {
        let err = place(ts(5, 8, 0), -1, &weekday_shifts(), &[], opts()).unwrap_err();
        assert!(matches!(err, CalendarError::InvalidDuration(-1)));
    }

    #[test]
    fn test_no_shifts_configured() {
        let err = place(ts(5, 8, 0), 60, &[], &[], opts()).unwrap_err();
        assert!(matches!(err, CalendarError::NoShiftsConfigured));
    }

    #[test]
    fn test_no_valid_shifts() {
        let inverted = vec![Shift {
            day_of_week: 1,
            start_hour: 17,
            end_hour: 8,
        }];
        let err = place(ts(5, 8, 0), 60, &inverted, &[], opts()).unwrap_err();
        assert!(matches!(err, CalendarError::NoValidShifts));
    }

    #[test]
    fn test_invalid_shift_hours_on_matched_day() {
        // The set passes the any-valid precondition, but Tuesday's entry
        // carries out-of-range hours and is the one the walk lands on.
        let shifts = vec![
            Shift {
                day_of_week: 1,
                start_hour: 8,
                end_hour: 17,
            },
            Shift {
                day_of_week: 2,
                start_hour: 30,
                end_hour: 40,
            },
        ];
        let err = place(ts(6, 9, 0), 60, &shifts, &[], opts()).unwrap_err();
        assert!(matches!(
            err,
            CalendarError::InvalidShiftHours {
                start_hour: 30,
                end_hour: 40
            }
        ));
    }

    #[test]
    fn test_zero_guard_limit_rejected() {
        let options = PlacementOptions { guard_max_steps: 0 };
        let err = place(ts(5, 8, 0), 60, &weekday_shifts(), &[], options).unwrap_err();
        assert!(matches!(err, CalendarError::InvalidGuardLimit));
    }

    #[test]
    fn test_guard_limit_bounds_long_walks() {
        // A single weekly shift and months of work: the walk is feasible
        // but needs far more steps than this budget allows.
        let monday_only = vec![Shift {
            day_of_week: 1,
            start_hour: 8,
            end_hour: 17,
        }];
        let options = PlacementOptions {
            guard_max_steps: 50,
        };
        let err = place(ts(5, 8, 0), 10_000, &monday_only, &[], options).unwrap_err();
        assert!(matches!(err, CalendarError::GuardLimitExceeded(50)));
    }

    #[test]
    fn test_guard_limit_catches_fully_blocked_shift() {
        // Maintenance covers every Monday for a year and Monday is the only
        // shift, so no working instant is ever reached.
        let monday_only = vec![Shift {
            day_of_week: 1,
            start_hour: 8,
            end_hour: 17,
        }];
        let maintenance: Vec<MaintenanceWindow> = (0..52)
            .map(|week| {
                let monday = ts(5, 0, 0) + Duration::weeks(week);
                window(monday, monday + Duration::days(1))
            })
            .collect();
        let options = PlacementOptions {
            guard_max_steps: 100,
        };
        let err = place(ts(5, 8, 0), 60, &monday_only, &maintenance, options).unwrap_err();
        assert!(matches!(err, CalendarError::GuardLimitExceeded(100)));
    }

    #[test]
    fn test_parse_utc_normalizes_offsets() {
        let parsed = parse_utc("2026-01-05T09:00:00+01:00").unwrap();
        assert_eq!(parsed, ts(5, 8, 0));
    }

    #[test]
    fn test_parse_utc_rejects_garbage() {
        let err = parse_utc("tomorrow-ish").unwrap_err();
        assert!(matches!(err, CalendarError::InvalidTimestamp { .. }));
    }

    #[test]
    fn test_format_utc_suppresses_milliseconds() {
        assert_eq!(format_utc(ts(5, 8, 0)), "2026-01-05T08:00:00Z");
        assert_eq!(parse_utc(&format_utc(ts(5, 8, 0))).unwrap(), ts(5, 8, 0));
    }
}
