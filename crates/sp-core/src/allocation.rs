//! Day-level budget allocation.
//!
//! A subject's remaining hours are spread across the date range in proportion
//! to each day's share of the total free minutes. Each day's budget is rounded
//! on its own; the accumulated rounding error is accepted.

use chrono::NaiveDate;

use crate::availability::{Availability, FreeInterval};

/// Progress of a single subject through packing.
///
/// Packing returns an updated copy instead of mutating shared counters, so a
/// state value always describes exactly the days packed so far.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllocationState {
    /// Minutes the subject needs in total.
    pub total_minutes_needed: u32,

    /// Minutes placed into slots so far.
    pub minutes_scheduled: u32,
}

impl AllocationState {
    pub const fn new(total_minutes_needed: u32) -> Self {
        Self {
            total_minutes_needed,
            minutes_scheduled: 0,
        }
    }

    /// Minutes still to be placed.
    pub const fn remaining(&self) -> u32 {
        self.total_minutes_needed
            .saturating_sub(self.minutes_scheduled)
    }

    pub const fn is_satisfied(&self) -> bool {
        self.remaining() == 0
    }

    /// Returns the state after placing `minutes` more.
    #[must_use]
    pub const fn record(self, minutes: u32) -> Self {
        Self {
            total_minutes_needed: self.total_minutes_needed,
            minutes_scheduled: self.minutes_scheduled + minutes,
        }
    }
}

/// Budget and free time for one subject on one date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayPlan {
    pub date: NaiveDate,
    /// Free intervals sorted by start.
    pub intervals: Vec<FreeInterval>,
    /// Minutes to place on this date; zero means the day stays empty.
    pub budget: u32,
}

/// Minutes allotted to a day with `available_minutes` free out of
/// `total_available_minutes`, for a subject with `remaining_hours` left.
///
/// Halves round up. Returns zero when nothing is available.
#[expect(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss,
    reason = "minute counts are far below f64 precision and clamped before casting back"
)]
pub fn day_budget(available_minutes: u32, total_available_minutes: u64, remaining_hours: f64) -> u32 {
    if total_available_minutes == 0 || remaining_hours <= 0.0 {
        return 0;
    }
    let share = f64::from(available_minutes) / total_available_minutes as f64;
    let budget = (share * remaining_hours * 60.0).round();
    budget.clamp(0.0, f64::from(u32::MAX)) as u32
}

/// Splits `remaining_hours` across every day of `availability`.
///
/// One plan is returned per day, in date order, including days whose budget
/// rounds to zero.
pub fn plan_day_budgets(availability: &Availability, remaining_hours: f64) -> Vec<DayPlan> {
    availability
        .days
        .iter()
        .map(|day| {
            let budget = day_budget(
                day.available_minutes,
                availability.total_available_minutes,
                remaining_hours,
            );
            let mut intervals = day.intervals.clone();
            intervals.sort_by_key(|interval| interval.start);
            tracing::debug!(
                date = %day.date,
                available = day.available_minutes,
                budget,
                "planned day budget"
            );
            DayPlan {
                date: day.date,
                intervals,
                budget,
            }
        })
        .collect()
}
