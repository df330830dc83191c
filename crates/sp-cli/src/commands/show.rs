//! Show command for the combined calendar of stored schedules.

use std::fmt::Write as _;
use std::io::Write;

use anyhow::Result;
use chrono::NaiveDate;
use sp_core::{CalendarDay, LoadedSchedules, combine_schedules, find_overlaps};

use super::util::format_minutes;

/// Format calendar days for human-readable output.
///
/// Each day lists its slots in time order, followed by a warning for every
/// pair of subjects booked at the same time.
pub fn format_calendar(days: &[CalendarDay]) -> String {
    let mut output = String::new();

    for (i, day) in days.iter().enumerate() {
        if i > 0 {
            writeln!(output).unwrap();
        }
        writeln!(output, "{}", day.date.format("%a %Y-%m-%d")).unwrap();
        for slot in &day.slots {
            writeln!(
                output,
                "  {}-{}  {}",
                slot.start_time, slot.end_time, slot.subject
            )
            .unwrap();
        }
        for overlap in find_overlaps(day) {
            writeln!(
                output,
                "  ! {} {}-{} overlaps {} {}-{} by {}",
                overlap.first.subject,
                overlap.first.start_time,
                overlap.first.end_time,
                overlap.second.subject,
                overlap.second.start_time,
                overlap.second.end_time,
                format_minutes(overlap.overlap_minutes)
            )
            .unwrap();
        }
    }

    output
}

/// Prints the combined calendar, optionally for a single date.
pub fn run<W: Write>(
    writer: &mut W,
    loaded: &LoadedSchedules,
    date: Option<NaiveDate>,
    json: bool,
) -> Result<()> {
    let mut days = combine_schedules(&loaded.subject_schedules);
    if let Some(date) = date {
        days.retain(|day| day.date == date);
    }

    if json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&days)?)?;
        return Ok(());
    }

    if days.is_empty() {
        match date {
            Some(date) => writeln!(writer, "No study slots on {date}.")?,
            None => writeln!(writer, "No schedules stored. Run 'sp generate' to create one.")?,
        }
        return Ok(());
    }

    write!(writer, "{}", format_calendar(&days))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use insta::assert_snapshot;
    use sp_core::{ScheduleDay, Slot, StoredSchedule, SubjectName};

    fn slot(start: &str, end: &str) -> Slot {
        Slot {
            start_time: start.parse().unwrap(),
            end_time: end.parse().unwrap(),
        }
    }

    fn stored(subject: &str, days: Vec<(&str, Vec<Slot>)>) -> StoredSchedule {
        StoredSchedule {
            subject: SubjectName::new(subject).unwrap(),
            start_date: "2026-03-02".parse().unwrap(),
            end_date: "2026-03-04".parse().unwrap(),
            schedule: days
                .into_iter()
                .map(|(date, slots)| ScheduleDay {
                    date: date.parse().unwrap(),
                    slots,
                })
                .collect(),
        }
    }

    fn loaded() -> LoadedSchedules {
        LoadedSchedules {
            subject_schedules: vec![
                stored(
                    "maths",
                    vec![
                        ("2026-03-02", vec![slot("08:00", "10:00"), slot("10:15", "11:00")]),
                        ("2026-03-03", vec![]),
                        ("2026-03-04", vec![slot("14:00", "15:00")]),
                    ],
                ),
                stored(
                    "physics",
                    vec![
                        ("2026-03-02", vec![slot("09:00", "10:30")]),
                        ("2026-03-03", vec![]),
                        ("2026-03-04", vec![]),
                    ],
                ),
            ],
            unavailable_times: Vec::new(),
        }
    }

    fn render(date: Option<NaiveDate>, json: bool) -> String {
        let mut output = Vec::new();
        run(&mut output, &loaded(), date, json).unwrap();
        String::from_utf8(output).unwrap()
    }

    #[test]
    fn show_lists_days_with_overlap_warnings() {
        assert_snapshot!(render(None, false), @r"
        Mon 2026-03-02
          08:00-10:00  maths
          09:00-10:30  physics
          10:15-11:00  maths
          ! maths 08:00-10:00 overlaps physics 09:00-10:30 by 1h
          ! physics 09:00-10:30 overlaps maths 10:15-11:00 by 15m

        Wed 2026-03-04
          14:00-15:00  maths
        ");
    }

    #[test]
    fn show_filters_by_date() {
        let output = render(Some("2026-03-04".parse().unwrap()), false);
        assert!(output.contains("14:00-15:00  maths"));
        assert!(!output.contains("2026-03-02"));

        let output = render(Some("2026-03-03".parse().unwrap()), false);
        assert_eq!(output, "No study slots on 2026-03-03.\n");
    }

    #[test]
    fn show_json_groups_slots_by_date() {
        let output = render(None, true);
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        let days = value.as_array().unwrap();
        assert_eq!(days.len(), 2);
        assert_eq!(days[0]["date"], "2026-03-02");
        assert_eq!(days[0]["slots"][1]["subject"], "physics");
        assert_eq!(days[0]["slots"][1]["startTime"], "09:00");
    }

    #[test]
    fn show_empty_store() {
        let mut output = Vec::new();
        run(&mut output, &LoadedSchedules::default(), None, false).unwrap();
        let output = String::from_utf8(output).unwrap();
        assert!(output.starts_with("No schedules stored."));
    }
}
