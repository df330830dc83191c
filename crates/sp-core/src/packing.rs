//! Slot packing.
//!
//! Walks a day's free intervals in start order and cuts them into study slots
//! bounded by the slot rules, the day budget and the subject's remaining need.

use serde::{Deserialize, Serialize};

use crate::allocation::{AllocationState, DayPlan};
use crate::types::{ClockTime, ScheduleDay, Slot};

/// Size limits for emitted slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotRules {
    /// Shorter remainders are discarded. Default: 30.
    pub min_minutes: u32,

    /// Default: 120.
    pub max_minutes: u32,

    /// Gap inserted between consecutive slots in one interval. Default: 15.
    pub buffer_minutes: u32,
}

impl Default for SlotRules {
    fn default() -> Self {
        Self {
            min_minutes: 30,
            max_minutes: 120,
            buffer_minutes: 15,
        }
    }
}

/// Packs one day.
///
/// Returns the day's slots and the allocation state after them. A remainder
/// shorter than `min_minutes` ends work on its interval; the unspent budget
/// carries over to the next interval of the same day, never to other days.
pub fn pack_day(
    plan: &DayPlan,
    state: AllocationState,
    rules: &SlotRules,
) -> (ScheduleDay, AllocationState) {
    let mut state = state;
    let mut slots = Vec::new();
    let mut budget_left = plan.budget;

    for interval in &plan.intervals {
        if budget_left == 0 || state.is_satisfied() {
            break;
        }

        let mut cursor = interval.start;
        while cursor < interval.end && budget_left > 0 && !state.is_satisfied() {
            let slot_minutes = rules
                .max_minutes
                .min(interval.end - cursor)
                .min(state.remaining())
                .min(budget_left);
            if slot_minutes < rules.min_minutes {
                break;
            }

            let start = cursor;
            cursor += slot_minutes;
            slots.push(Slot {
                start_time: ClockTime::clamped(start),
                end_time: ClockTime::clamped(cursor),
            });
            state = state.record(slot_minutes);
            budget_left -= slot_minutes;

            if cursor < interval.end && budget_left > 0 {
                cursor += rules.buffer_minutes;
            }
        }
    }

    (
        ScheduleDay {
            date: plan.date,
            slots,
        },
        state,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::availability::FreeInterval;

    fn hm(s: &str) -> u32 {
        s.parse::<ClockTime>().unwrap().minutes()
    }

    fn plan(intervals: &[(&str, &str)], budget: u32) -> DayPlan {
        DayPlan {
            date: "2026-03-02".parse().unwrap(),
            intervals: intervals
                .iter()
                .map(|(start, end)| FreeInterval {
                    start: hm(start),
                    end: hm(end),
                })
                .collect(),
            budget,
        }
    }

    fn times(day: &ScheduleDay) -> Vec<(String, String)> {
        day.slots
            .iter()
            .map(|s| (s.start_time.to_string(), s.end_time.to_string()))
            .collect()
    }

    fn pair(start: &str, end: &str) -> (String, String) {
        (start.to_string(), end.to_string())
    }

    #[test]
    fn two_hour_budget_fills_one_slot() {
        let (day, state) = pack_day(
            &plan(&[("08:00", "20:00")], 120),
            AllocationState::new(120),
            &SlotRules::default(),
        );
        assert_eq!(times(&day), vec![pair("08:00", "10:00")]);
        assert!(state.is_satisfied());
    }

    #[test]
    fn slots_are_capped_and_separated_by_buffer() {
        let (day, state) = pack_day(
            &plan(&[("08:00", "20:00")], 300),
            AllocationState::new(600),
            &SlotRules::default(),
        );
        assert_eq!(
            times(&day),
            vec![
                pair("08:00", "10:00"),
                pair("10:15", "12:15"),
                pair("12:30", "13:30"),
            ]
        );
        assert_eq!(state.minutes_scheduled, 300);
    }

    #[test]
    fn short_interval_is_skipped_and_budget_carries_over() {
        let (day, _) = pack_day(
            &plan(&[("08:00", "08:25"), ("09:00", "12:00")], 60),
            AllocationState::new(600),
            &SlotRules::default(),
        );
        assert_eq!(times(&day), vec![pair("09:00", "10:00")]);
    }

    #[test]
    fn remainder_below_minimum_is_discarded() {
        // 140 minutes: 120 slot, 15 buffer, 5 left over
        let (day, state) = pack_day(
            &plan(&[("08:00", "10:20")], 200),
            AllocationState::new(600),
            &SlotRules::default(),
        );
        assert_eq!(times(&day), vec![pair("08:00", "10:00")]);
        assert_eq!(state.minutes_scheduled, 120);
    }

    #[test]
    fn stops_once_subject_need_is_met() {
        let (day, state) = pack_day(
            &plan(&[("08:00", "09:00"), ("10:00", "20:00")], 400),
            AllocationState::new(100),
            &SlotRules::default(),
        );
        assert_eq!(times(&day), vec![pair("08:00", "09:00"), pair("10:00", "10:40")]);
        assert!(state.is_satisfied());
    }

    #[test]
    fn need_below_minimum_emits_nothing() {
        let (day, state) = pack_day(
            &plan(&[("08:00", "20:00")], 120),
            AllocationState::new(20),
            &SlotRules::default(),
        );
        assert!(day.slots.is_empty());
        assert_eq!(state.minutes_scheduled, 0);
    }

    #[test]
    fn zero_budget_day_is_empty() {
        let (day, state) = pack_day(
            &plan(&[("08:00", "20:00")], 0),
            AllocationState::new(600),
            &SlotRules::default(),
        );
        assert!(day.slots.is_empty());
        assert_eq!(state, AllocationState::new(600));
    }

    #[test]
    fn custom_rules_are_honored() {
        let rules = SlotRules {
            min_minutes: 10,
            max_minutes: 45,
            buffer_minutes: 5,
        };
        let (day, _) = pack_day(
            &plan(&[("08:00", "09:50")], 100),
            AllocationState::new(100),
            &rules,
        );
        assert_eq!(
            times(&day),
            vec![
                pair("08:00", "08:45"),
                pair("08:50", "09:35"),
                pair("09:40", "09:50"),
            ]
        );
    }
}
