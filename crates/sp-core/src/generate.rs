//! Multi-subject schedule generation.
//!
//! Subjects are handled one at a time, in the order they were selected: each
//! is planned, packed and saved before the next one starts. Availability is
//! recomputed from the caller's blocked intervals for every subject, so two
//! subjects in the same run may be given overlapping slots.

use thiserror::Error;

use crate::gateway::{GatewayError, SaveRequest, ScheduleGateway};
use crate::plan::{PlanError, PlannerConfig, plan_subject};
use crate::retry::{RetryPolicy, SaveOutcome, save_with_retry};
use crate::types::{
    DateRange, ScheduleDay, Subject, SubjectName, UnavailableInterval, valid_intervals,
};

/// Inputs for one generation run.
#[derive(Debug, Clone)]
pub struct GenerateRequest {
    /// Every known subject.
    pub subjects: Vec<Subject>,
    pub range: DateRange,
    /// Blocked intervals as supplied; invalid entries are dropped.
    pub unavailable_times: Vec<UnavailableInterval>,
    /// Names to schedule, in processing order.
    pub selected: Vec<SubjectName>,
}

/// What happened to one selected subject.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubjectOutcome {
    Saved {
        subject: SubjectName,
        attempts: u32,
        scheduled_minutes: u32,
    },
    /// Nothing left to study.
    SkippedComplete { subject: SubjectName },
    /// Selected but not among the known subjects.
    SkippedUnknown { subject: SubjectName },
}

/// Summary of a run that finished without aborting.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerateReport {
    pub outcomes: Vec<SubjectOutcome>,
}

impl GenerateReport {
    /// Names of subjects whose schedules were stored.
    pub fn saved(&self) -> Vec<SubjectName> {
        self.outcomes
            .iter()
            .filter_map(|outcome| match outcome {
                SubjectOutcome::Saved { subject, .. } => Some(subject.clone()),
                _ => None,
            })
            .collect()
    }
}

/// Reasons a run stopped.
///
/// Variants raised after saving started carry the subjects that were stored
/// before the abort; those stay persisted.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GenerateError {
    #[error("please select at least one subject to schedule")]
    NoSubjectsSelected,

    #[error("no available time slots in the selected date range for {subject}")]
    NoAvailability {
        subject: SubjectName,
        saved: Vec<SubjectName>,
    },

    #[error("your session has expired, please log in again")]
    SessionExpired {
        message: String,
        saved: Vec<SubjectName>,
    },

    #[error("failed to save schedule for {subject} after {attempts} attempts: {last_error}")]
    SaveFailed {
        subject: SubjectName,
        attempts: u32,
        last_error: GatewayError,
        saved: Vec<SubjectName>,
    },
}

impl GenerateError {
    /// Subjects stored before the run stopped.
    pub fn saved(&self) -> &[SubjectName] {
        match self {
            Self::NoSubjectsSelected => &[],
            Self::NoAvailability { saved, .. }
            | Self::SessionExpired { saved, .. }
            | Self::SaveFailed { saved, .. } => saved,
        }
    }
}

/// Plans and saves every selected subject in order.
///
/// Stops at the first subject with no free time, the first credential
/// failure, or the first save that exhausts `retry`.
pub async fn generate_schedules<G: ScheduleGateway>(
    gateway: &mut G,
    request: &GenerateRequest,
    config: &PlannerConfig,
    retry: &RetryPolicy,
) -> Result<GenerateReport, GenerateError> {
    if request.selected.is_empty() {
        return Err(GenerateError::NoSubjectsSelected);
    }

    let blocked = valid_intervals(&request.unavailable_times);
    let dropped = request.unavailable_times.len() - blocked.len();
    if dropped > 0 {
        tracing::debug!(dropped, "ignoring invalid unavailable times");
    }

    let mut report = GenerateReport::default();
    for name in &request.selected {
        let Some(subject) = request.subjects.iter().find(|s| &s.name == name) else {
            tracing::warn!(subject = %name, "selected subject not found");
            report.outcomes.push(SubjectOutcome::SkippedUnknown {
                subject: name.clone(),
            });
            continue;
        };

        if !subject.needs_scheduling() {
            tracing::info!(subject = %name, "no remaining hours to schedule");
            report.outcomes.push(SubjectOutcome::SkippedComplete {
                subject: name.clone(),
            });
            continue;
        }

        let schedule = match plan_subject(subject, request.range, &blocked, config) {
            Ok(schedule) => schedule,
            Err(PlanError::NoAvailability { subject }) => {
                return Err(GenerateError::NoAvailability {
                    subject,
                    saved: report.saved(),
                });
            }
        };
        let scheduled_minutes: u32 = schedule.iter().map(ScheduleDay::scheduled_minutes).sum();

        let save = SaveRequest::new(name.clone(), request.range, schedule, blocked.clone());
        match save_with_retry(gateway, &save, retry).await {
            SaveOutcome::Saved { attempts, .. } => {
                tracing::info!(subject = %name, attempts, scheduled_minutes, "schedule saved");
                report.outcomes.push(SubjectOutcome::Saved {
                    subject: name.clone(),
                    attempts,
                    scheduled_minutes,
                });
            }
            SaveOutcome::AuthFailed { message, .. } => {
                return Err(GenerateError::SessionExpired {
                    message,
                    saved: report.saved(),
                });
            }
            SaveOutcome::Exhausted {
                last_error,
                attempts,
            } => {
                return Err(GenerateError::SaveFailed {
                    subject: name.clone(),
                    attempts,
                    last_error,
                    saved: report.saved(),
                });
            }
        }
    }

    Ok(report)
}
