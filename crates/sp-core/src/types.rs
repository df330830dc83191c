//! Core type definitions with validation.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Minutes in a calendar day.
pub const MINUTES_PER_DAY: u32 = 24 * 60;

/// Validation errors for core types.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The provided value was empty.
    #[error("{field} cannot be empty")]
    Empty { field: &'static str },

    /// A clock time was not of the form `HH:MM` within a single day.
    #[error("invalid time of day: {value} (expected HH:MM)")]
    InvalidClockTime { value: String },

    /// A date range ended before it started.
    #[error("end date {end} must not be before start date {start}")]
    InvertedRange { start: NaiveDate, end: NaiveDate },

    /// A daily window that does not cover any time.
    #[error("daily window {start}-{end} is empty")]
    EmptyWindow { start: ClockTime, end: ClockTime },
}

/// A validated subject name.
///
/// Names are the scheduling key: one stored schedule exists per name, so they
/// must be non-empty and are compared exactly.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SubjectName(String);

impl SubjectName {
    /// Creates a new name after validation.
    pub fn new(name: impl Into<String>) -> Result<Self, ValidationError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ValidationError::Empty {
                field: "subject name",
            });
        }
        Ok(Self(name))
    }

    /// Returns the name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for SubjectName {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<SubjectName> for String {
    fn from(name: SubjectName) -> Self {
        name.0
    }
}

impl fmt::Display for SubjectName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for SubjectName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A time of day with minute precision, serialized as `HH:MM`.
///
/// `24:00` is accepted so that a window can run to the end of the day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ClockTime(u32);

impl ClockTime {
    pub const MIDNIGHT: Self = Self(0);
    pub const END_OF_DAY: Self = Self(MINUTES_PER_DAY);

    /// Creates a clock time from minutes since midnight.
    pub const fn from_minutes(minutes: u32) -> Option<Self> {
        if minutes > MINUTES_PER_DAY {
            None
        } else {
            Some(Self(minutes))
        }
    }

    /// Creates a clock time, clamping past-midnight values to `24:00`.
    pub const fn clamped(minutes: u32) -> Self {
        if minutes > MINUTES_PER_DAY {
            Self::END_OF_DAY
        } else {
            Self(minutes)
        }
    }

    /// Creates a clock time from an hour and a minute.
    pub const fn from_hm(hour: u32, minute: u32) -> Option<Self> {
        if minute >= 60 {
            return None;
        }
        Self::from_minutes(hour * 60 + minute)
    }

    /// Minutes since midnight.
    pub const fn minutes(self) -> u32 {
        self.0
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.0 / 60, self.0 % 60)
    }
}

impl FromStr for ClockTime {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ValidationError::InvalidClockTime {
            value: s.to_string(),
        };
        let (hour, minute) = s.trim().split_once(':').ok_or_else(invalid)?;
        if hour.is_empty() || hour.len() > 2 || minute.len() != 2 {
            return Err(invalid());
        }
        let hour: u32 = hour.parse().map_err(|_| invalid())?;
        let minute: u32 = minute.parse().map_err(|_| invalid())?;
        Self::from_hm(hour, minute).ok_or_else(invalid)
    }
}

impl TryFrom<String> for ClockTime {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ClockTime> for String {
    fn from(time: ClockTime) -> Self {
        time.to_string()
    }
}

/// An inclusive range of calendar dates with `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    /// Creates a range, rejecting one that ends before it starts.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, ValidationError> {
        if start > end {
            return Err(ValidationError::InvertedRange { start, end });
        }
        Ok(Self { start, end })
    }

    pub const fn start(&self) -> NaiveDate {
        self.start
    }

    pub const fn end(&self) -> NaiveDate {
        self.end
    }

    /// Whether `date` falls inside the range.
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Every date in the range, ascending.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + use<> {
        let end = self.end;
        self.start.iter_days().take_while(move |day| *day <= end)
    }
}

/// A subject with a planned study budget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    pub name: SubjectName,

    /// Total planned study hours.
    #[serde(rename = "hours")]
    pub total_hours: f64,

    /// Hours already studied.
    #[serde(default)]
    pub hours_studied: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline: Option<NaiveDate>,
}

impl Subject {
    /// Total planned hours minus hours already studied.
    pub fn remaining_hours(&self) -> f64 {
        self.total_hours - self.hours_studied
    }

    /// Whether anything is left to schedule.
    pub fn needs_scheduling(&self) -> bool {
        self.remaining_hours() > 0.0
    }

    /// Remaining hours in whole minutes, rounded down so that scheduling
    /// never exceeds the budget.
    #[expect(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        reason = "value is clamped to the u32 range first"
    )]
    pub fn remaining_minutes(&self) -> u32 {
        let minutes = (self.remaining_hours() * 60.0).floor();
        minutes.clamp(0.0, f64::from(u32::MAX)) as u32
    }
}

/// A caller-blocked interval on one date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnavailableInterval {
    pub date: NaiveDate,
    pub start_time: ClockTime,
    pub end_time: ClockTime,
}

impl UnavailableInterval {
    /// Parses an interval from its wire fields.
    ///
    /// Returns `None` for anything malformed; callers drop such entries.
    pub fn parse(date: &str, start_time: &str, end_time: &str) -> Option<Self> {
        Some(Self {
            date: date.trim().parse().ok()?,
            start_time: start_time.parse().ok()?,
            end_time: end_time.parse().ok()?,
        })
    }

    /// An interval is usable only if it starts before it ends.
    pub fn is_valid(&self) -> bool {
        self.start_time < self.end_time
    }
}

/// Drops unusable intervals, keeping input order.
pub fn valid_intervals(intervals: &[UnavailableInterval]) -> Vec<UnavailableInterval> {
    intervals.iter().copied().filter(UnavailableInterval::is_valid).collect()
}

/// A single block of study time on one date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Slot {
    pub start_time: ClockTime,
    pub end_time: ClockTime,
}

impl Slot {
    pub const fn duration_minutes(&self) -> u32 {
        self.end_time.minutes() - self.start_time.minutes()
    }
}

/// The slots planned for one subject on one date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleDay {
    pub date: NaiveDate,
    pub slots: Vec<Slot>,
}

impl ScheduleDay {
    pub fn scheduled_minutes(&self) -> u32 {
        self.slots.iter().map(Slot::duration_minutes).sum()
    }
}
