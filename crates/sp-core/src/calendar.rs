//! Combined calendar view across subjects.
//!
//! Flattens stored per-subject schedules into one list of days, each holding
//! every subject's slots for that date.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::gateway::StoredSchedule;
use crate::types::{ClockTime, SubjectName};

/// A slot tagged with its subject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarSlot {
    pub subject: SubjectName,
    pub start_time: ClockTime,
    pub end_time: ClockTime,
}

/// All subjects' slots on one date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CalendarDay {
    pub date: NaiveDate,
    pub slots: Vec<CalendarSlot>,
}

/// Two slots of different subjects sharing time on the same date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotOverlap {
    pub first: CalendarSlot,
    pub second: CalendarSlot,
    pub overlap_minutes: u32,
}

/// Merges stored schedules into calendar days.
///
/// Days are ascending and only days with at least one slot are kept. Slots
/// within a day are ordered by start time, then subject.
pub fn combine_schedules(schedules: &[StoredSchedule]) -> Vec<CalendarDay> {
    let mut by_date: BTreeMap<NaiveDate, Vec<CalendarSlot>> = BTreeMap::new();
    for stored in schedules {
        for day in &stored.schedule {
            if day.slots.is_empty() {
                continue;
            }
            by_date
                .entry(day.date)
                .or_default()
                .extend(day.slots.iter().map(|slot| CalendarSlot {
                    subject: stored.subject.clone(),
                    start_time: slot.start_time,
                    end_time: slot.end_time,
                }));
        }
    }

    by_date
        .into_iter()
        .map(|(date, mut slots)| {
            slots.sort_by(|a, b| {
                (a.start_time, &a.subject).cmp(&(b.start_time, &b.subject))
            });
            CalendarDay { date, slots }
        })
        .collect()
}

/// Finds slots of different subjects that overlap on `day`.
///
/// Slots that merely touch (one ends when the other starts) do not overlap.
pub fn find_overlaps(day: &CalendarDay) -> Vec<SlotOverlap> {
    let mut overlaps = Vec::new();
    for (i, a) in day.slots.iter().enumerate() {
        for b in &day.slots[i + 1..] {
            if a.subject == b.subject {
                continue;
            }
            if a.start_time < b.end_time && b.start_time < a.end_time {
                let start = a.start_time.max(b.start_time).minutes();
                let end = a.end_time.min(b.end_time).minutes();
                overlaps.push(SlotOverlap {
                    first: a.clone(),
                    second: b.clone(),
                    overlap_minutes: end - start,
                });
            }
        }
    }
    overlaps
}
