//! Free time computation.
//!
//! Starts from a fixed daily window and carves out caller-blocked intervals,
//! then aggregates the remaining free minutes across a date range.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::types::{ClockTime, DateRange, UnavailableInterval, ValidationError};

/// The daily window inside which study time may be planned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayWindow {
    start: ClockTime,
    end: ClockTime,
}

impl DayWindow {
    /// Creates a window, rejecting one that covers no time.
    pub fn new(start: ClockTime, end: ClockTime) -> Result<Self, ValidationError> {
        if start >= end {
            return Err(ValidationError::EmptyWindow { start, end });
        }
        Ok(Self { start, end })
    }

    pub const fn start(&self) -> ClockTime {
        self.start
    }

    pub const fn end(&self) -> ClockTime {
        self.end
    }

    pub const fn minutes(&self) -> u32 {
        self.end.minutes() - self.start.minutes()
    }
}

impl Default for DayWindow {
    /// 08:00 to 20:00.
    fn default() -> Self {
        Self {
            start: ClockTime::clamped(8 * 60),
            end: ClockTime::clamped(20 * 60),
        }
    }
}

/// A half-open `[start, end)` range of free minutes within one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FreeInterval {
    pub start: u32,
    pub end: u32,
}

impl FreeInterval {
    pub const fn minutes(&self) -> u32 {
        self.end - self.start
    }
}

/// Free time on a single date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayAvailability {
    pub date: NaiveDate,
    /// Disjoint, but not necessarily sorted.
    pub intervals: Vec<FreeInterval>,
    pub available_minutes: u32,
}

/// Free time across a whole date range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Availability {
    /// One entry per date in the range, ascending.
    pub days: Vec<DayAvailability>,
    pub total_available_minutes: u64,
}

/// Subtracts blocked intervals from the daily window.
///
/// Blocks are applied in input order, each one trimming whatever the previous
/// ones left. Touching a free interval at an edge does not trim it.
pub fn resolve_free_intervals<'a, I>(window: DayWindow, blocked: I) -> Vec<FreeInterval>
where
    I: IntoIterator<Item = &'a UnavailableInterval>,
{
    let mut free = vec![FreeInterval {
        start: window.start.minutes(),
        end: window.end.minutes(),
    }];

    for block in blocked {
        let block_start = block.start_time.minutes();
        let block_end = block.end_time.minutes();
        free = free
            .into_iter()
            .flat_map(|interval| {
                if block_end <= interval.start || block_start >= interval.end {
                    return vec![interval];
                }
                let mut remainder = Vec::with_capacity(2);
                if block_start > interval.start {
                    remainder.push(FreeInterval {
                        start: interval.start,
                        end: block_start,
                    });
                }
                if block_end < interval.end {
                    remainder.push(FreeInterval {
                        start: block_end,
                        end: interval.end,
                    });
                }
                remainder
            })
            .collect();
    }

    free
}

/// Computes free intervals for every date in `range`.
///
/// Only blocks dated on a given day affect that day. Blocks are expected to
/// be pre-filtered with [`crate::valid_intervals`].
pub fn aggregate_availability(
    window: DayWindow,
    range: DateRange,
    blocked: &[UnavailableInterval],
) -> Availability {
    let mut total_available_minutes = 0u64;
    let days = range
        .days()
        .map(|date| {
            let intervals =
                resolve_free_intervals(window, blocked.iter().filter(|block| block.date == date));
            let available_minutes = intervals.iter().map(FreeInterval::minutes).sum();
            total_available_minutes += u64::from(available_minutes);
            DayAvailability {
                date,
                intervals,
                available_minutes,
            }
        })
        .collect();

    Availability {
        days,
        total_available_minutes,
    }
}
