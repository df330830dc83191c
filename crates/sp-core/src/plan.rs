//! Per-subject planning pipeline: availability, day budgets, packing.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::allocation::{AllocationState, plan_day_budgets};
use crate::availability::{DayWindow, aggregate_availability};
use crate::packing::{SlotRules, pack_day};
use crate::types::{DateRange, ScheduleDay, Subject, SubjectName, UnavailableInterval};

/// Planner configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PlannerConfig {
    pub window: DayWindow,
    pub slots: SlotRules,
}

/// Planning errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PlanError {
    /// Every day in the range is fully blocked.
    #[error("no available time slots in the selected date range for {subject}")]
    NoAvailability { subject: SubjectName },
}

/// Plans one subject over `range`.
///
/// `blocked` must already be filtered to valid intervals. The result holds
/// one [`ScheduleDay`] per date in the range, empty days included.
pub fn plan_subject(
    subject: &Subject,
    range: DateRange,
    blocked: &[UnavailableInterval],
    config: &PlannerConfig,
) -> Result<Vec<ScheduleDay>, PlanError> {
    let availability = aggregate_availability(config.window, range, blocked);
    if availability.total_available_minutes == 0 {
        return Err(PlanError::NoAvailability {
            subject: subject.name.clone(),
        });
    }

    let day_plans = plan_day_budgets(&availability, subject.remaining_hours());
    let mut state = AllocationState::new(subject.remaining_minutes());
    let mut days = Vec::with_capacity(day_plans.len());
    for day_plan in &day_plans {
        let (day, next) = pack_day(day_plan, state, &config.slots);
        state = next;
        days.push(day);
    }

    tracing::debug!(
        subject = %subject.name,
        needed = state.total_minutes_needed,
        scheduled = state.minutes_scheduled,
        "packed subject"
    );
    Ok(days)
}
