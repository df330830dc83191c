//! Persistence boundary for generated schedules.

use std::future::Future;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{DateRange, ScheduleDay, SubjectName, UnavailableInterval};

/// A generated schedule ready to be stored.
///
/// Serializes to the body of `POST /api/schedules`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveRequest {
    pub subject: SubjectName,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub schedule: Vec<ScheduleDay>,
    pub unavailable_times: Vec<UnavailableInterval>,
}

impl SaveRequest {
    pub fn new(
        subject: SubjectName,
        range: DateRange,
        schedule: Vec<ScheduleDay>,
        unavailable_times: Vec<UnavailableInterval>,
    ) -> Self {
        Self {
            subject,
            start_date: range.start(),
            end_date: range.end(),
            schedule,
            unavailable_times,
        }
    }
}

/// A subject schedule as held by a store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredSchedule {
    pub subject: SubjectName,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub schedule: Vec<ScheduleDay>,
}

impl From<&SaveRequest> for StoredSchedule {
    fn from(request: &SaveRequest) -> Self {
        Self {
            subject: request.subject.clone(),
            start_date: request.start_date,
            end_date: request.end_date,
            schedule: request.schedule.clone(),
        }
    }
}

/// Everything a store holds for the current user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadedSchedules {
    pub subject_schedules: Vec<StoredSchedule>,
    pub unavailable_times: Vec<UnavailableInterval>,
}

/// Gateway failures, classified by how the caller should react.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// Credentials were rejected. Never retried.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// The store rejected the data.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Anything that may succeed on a later attempt.
    #[error("{0}")]
    Transient(String),
}

impl GatewayError {
    pub const fn is_auth(&self) -> bool {
        matches!(self, Self::Auth(_))
    }
}

/// A store for generated schedules.
///
/// Implementations own the "one schedule per subject" rule: saving a subject
/// that already has a schedule replaces it.
pub trait ScheduleGateway {
    /// Stores one subject's schedule and the unavailable times it was
    /// planned against.
    fn save_schedule(
        &mut self,
        request: &SaveRequest,
    ) -> impl Future<Output = Result<StoredSchedule, GatewayError>>;

    /// Loads every stored schedule and the stored unavailable times.
    fn load_schedules(&mut self) -> impl Future<Output = Result<LoadedSchedules, GatewayError>>;
}
