//! Generate command for planning and saving subject schedules.
//!
//! This module implements `sp generate`, which plans every selected subject
//! over a date range and saves each schedule before moving to the next.

use std::io::Write;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use sp_core::{
    DateRange, GenerateReport, GenerateRequest, PlannerConfig, RetryPolicy, ScheduleGateway,
    Subject, SubjectName, SubjectOutcome, generate_schedules,
};

use super::util::{format_minutes, parse_block};
use crate::store::gateway_error;

/// Arguments for `sp generate`.
#[derive(Debug, Clone)]
pub struct GenerateArgs {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub subjects: Vec<String>,
    pub blocks: Vec<String>,
    /// Plan with no blocked times at all.
    pub no_blocks: bool,
}

fn plural(count: u32, word: &str) -> String {
    if count == 1 {
        format!("{count} {word}")
    } else {
        format!("{count} {word}s")
    }
}

/// Format the outcome of a finished run.
pub fn format_report(report: &GenerateReport) -> String {
    report
        .outcomes
        .iter()
        .map(|outcome| match outcome {
            SubjectOutcome::Saved {
                subject,
                attempts,
                scheduled_minutes,
            } => format!(
                "Saved {subject}: {} scheduled ({})\n",
                format_minutes(*scheduled_minutes),
                plural(*attempts, "attempt")
            ),
            SubjectOutcome::SkippedComplete { subject } => {
                format!("Skipped {subject}: no remaining hours\n")
            }
            SubjectOutcome::SkippedUnknown { subject } => {
                format!("Skipped {subject}: no such subject\n")
            }
        })
        .collect()
}

/// Plans and saves the selected subjects through `gateway`.
///
/// Without blocked times on the command line, the stored ones are reused
/// unless `no_blocks` is set.
/// When the run stops early, the subjects saved so far are printed before
/// the error is returned.
pub async fn run<W: Write, G: ScheduleGateway>(
    writer: &mut W,
    gateway: &mut G,
    subjects: Vec<Subject>,
    args: &GenerateArgs,
    config: &PlannerConfig,
    retry: &RetryPolicy,
) -> Result<()> {
    let range = DateRange::new(args.start, args.end).context("invalid date range")?;
    let selected = args
        .subjects
        .iter()
        .map(|name| SubjectName::new(name.as_str()))
        .collect::<Result<Vec<_>, _>>()?;

    let unavailable_times = if args.no_blocks {
        Vec::new()
    } else if args.blocks.is_empty() {
        let loaded = gateway
            .load_schedules()
            .await
            .map_err(|err| gateway_error(err, "failed to load stored blocked times"))?;
        tracing::debug!(
            count = loaded.unavailable_times.len(),
            "reusing stored blocked times"
        );
        loaded.unavailable_times
    } else {
        args.blocks
            .iter()
            .map(|block| parse_block(block))
            .collect::<Result<Vec<_>>>()?
    };

    let request = GenerateRequest {
        subjects,
        range,
        unavailable_times,
        selected,
    };

    match generate_schedules(gateway, &request, config, retry).await {
        Ok(report) => {
            write!(writer, "{}", format_report(&report))?;
            Ok(())
        }
        Err(err) => {
            let saved = err.saved();
            if !saved.is_empty() {
                let names: Vec<&str> = saved.iter().map(SubjectName::as_str).collect();
                writeln!(writer, "Saved before stopping: {}", names.join(", "))?;
            }
            Err(err.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    use insta::assert_snapshot;
    use sp_core::{GatewayError, LoadedSchedules, SaveRequest, StoredSchedule};
    use sp_db::Database;

    fn subject(name: &str, hours: f64, studied: f64) -> Subject {
        Subject {
            name: SubjectName::new(name).unwrap(),
            total_hours: hours,
            hours_studied: studied,
            deadline: None,
        }
    }

    fn args(subjects: &[&str], blocks: &[&str]) -> GenerateArgs {
        GenerateArgs {
            start: "2026-03-02".parse().unwrap(),
            end: "2026-03-03".parse().unwrap(),
            subjects: subjects.iter().map(ToString::to_string).collect(),
            blocks: blocks.iter().map(ToString::to_string).collect(),
            no_blocks: false,
        }
    }

    fn no_delay() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            delay: Duration::ZERO,
        }
    }

    #[tokio::test]
    async fn generate_saves_and_reports_each_subject() {
        let mut db = Database::open_in_memory().unwrap();
        let subjects = vec![subject("maths", 4.0, 0.0), subject("physics", 2.0, 2.0)];
        let mut output = Vec::new();

        run(
            &mut output,
            &mut db,
            subjects,
            &args(&["maths", "physics", "history"], &["2026-03-02@08:00-20:00"]),
            &PlannerConfig::default(),
            &no_delay(),
        )
        .await
        .unwrap();

        let output = String::from_utf8(output).unwrap();
        assert_snapshot!(output, @r"
        Saved maths: 4h scheduled (1 attempt)
        Skipped physics: no remaining hours
        Skipped history: no such subject
        ");

        let stored = db.load_all().unwrap();
        assert_eq!(stored.subject_schedules.len(), 1);
        assert_eq!(stored.unavailable_times.len(), 1);
        let first_day = &stored.subject_schedules[0].schedule[0];
        assert!(first_day.slots.is_empty());
    }

    #[tokio::test]
    async fn generate_reuses_stored_blocked_times() {
        let mut db = Database::open_in_memory().unwrap();
        let subjects = vec![subject("maths", 2.0, 0.0), subject("physics", 2.0, 0.0)];

        run(
            &mut Vec::new(),
            &mut db,
            subjects.clone(),
            &args(&["maths"], &["2026-03-02@08:00-20:00"]),
            &PlannerConfig::default(),
            &no_delay(),
        )
        .await
        .unwrap();

        run(
            &mut Vec::new(),
            &mut db,
            subjects,
            &args(&["physics"], &[]),
            &PlannerConfig::default(),
            &no_delay(),
        )
        .await
        .unwrap();

        let stored = db
            .get_subject_schedule(&SubjectName::new("physics").unwrap())
            .unwrap()
            .unwrap();
        assert!(stored.schedule[0].slots.is_empty());
        assert!(!stored.schedule[1].slots.is_empty());
    }

    /// Stores the first schedule, then rejects the token.
    struct ExpiresAfterFirst {
        db: Database,
        saves: u32,
    }

    impl ScheduleGateway for ExpiresAfterFirst {
        async fn save_schedule(
            &mut self,
            request: &SaveRequest,
        ) -> Result<StoredSchedule, GatewayError> {
            self.saves += 1;
            if self.saves > 1 {
                return Err(GatewayError::Auth("Invalid token".to_string()));
            }
            self.db.save_schedule(request).await
        }

        async fn load_schedules(&mut self) -> Result<LoadedSchedules, GatewayError> {
            self.db.load_schedules().await
        }
    }

    #[tokio::test]
    async fn generate_reports_saved_subjects_before_failure() {
        let mut gateway = ExpiresAfterFirst {
            db: Database::open_in_memory().unwrap(),
            saves: 0,
        };
        let subjects = vec![subject("maths", 2.0, 0.0), subject("physics", 2.0, 0.0)];
        let mut output = Vec::new();

        let err = run(
            &mut output,
            &mut gateway,
            subjects,
            &args(&["maths", "physics"], &["2026-03-02@12:00-13:00"]),
            &PlannerConfig::default(),
            &no_delay(),
        )
        .await
        .unwrap_err();

        assert_eq!(
            err.to_string(),
            "your session has expired, please log in again"
        );
        assert_eq!(gateway.saves, 2);
        let output = String::from_utf8(output).unwrap();
        assert_eq!(output, "Saved before stopping: maths\n");
        assert_eq!(gateway.db.load_all().unwrap().subject_schedules.len(), 1);
    }

    #[tokio::test]
    async fn generate_fails_without_free_time() {
        let mut db = Database::open_in_memory().unwrap();
        let mut blocked = args(&["maths"], &["2026-03-02@08:00-20:00"]);
        blocked.end = blocked.start;

        let err = run(
            &mut Vec::new(),
            &mut db,
            vec![subject("maths", 2.0, 0.0)],
            &blocked,
            &PlannerConfig::default(),
            &no_delay(),
        )
        .await
        .unwrap_err();

        assert_eq!(
            err.to_string(),
            "no available time slots in the selected date range for maths"
        );
    }

    /// Rejects the token on every call.
    struct Expired;

    impl ScheduleGateway for Expired {
        async fn save_schedule(
            &mut self,
            _request: &SaveRequest,
        ) -> Result<StoredSchedule, GatewayError> {
            Err(GatewayError::Auth("Invalid token".to_string()))
        }

        async fn load_schedules(&mut self) -> Result<LoadedSchedules, GatewayError> {
            Err(GatewayError::Auth("Invalid token".to_string()))
        }
    }

    #[tokio::test]
    async fn expired_token_while_loading_blocks_reads_as_expired_session() {
        let err = run(
            &mut Vec::new(),
            &mut Expired,
            vec![subject("maths", 2.0, 0.0)],
            &args(&["maths"], &[]),
            &PlannerConfig::default(),
            &no_delay(),
        )
        .await
        .unwrap_err();

        assert_eq!(
            err.to_string(),
            "your session has expired, please log in again"
        );
    }

    #[tokio::test]
    async fn no_blocks_plans_freely_and_clears_stored_blocks() {
        let mut db = Database::open_in_memory().unwrap();
        let subjects = vec![subject("maths", 2.0, 0.0), subject("physics", 2.0, 0.0)];

        run(
            &mut Vec::new(),
            &mut db,
            subjects.clone(),
            &args(&["maths"], &["2026-03-02@08:00-20:00"]),
            &PlannerConfig::default(),
            &no_delay(),
        )
        .await
        .unwrap();
        assert_eq!(db.list_unavailable_times().unwrap().len(), 1);

        let free = GenerateArgs {
            no_blocks: true,
            ..args(&["physics"], &[])
        };
        run(
            &mut Vec::new(),
            &mut db,
            subjects,
            &free,
            &PlannerConfig::default(),
            &no_delay(),
        )
        .await
        .unwrap();

        let stored = db
            .get_subject_schedule(&SubjectName::new("physics").unwrap())
            .unwrap()
            .unwrap();
        assert!(!stored.schedule[0].slots.is_empty());
        assert!(db.list_unavailable_times().unwrap().is_empty());
    }

    #[tokio::test]
    async fn inverted_block_is_ignored() {
        let mut db = Database::open_in_memory().unwrap();
        let mut output = Vec::new();
        let mut one_day = args(
            &["maths"],
            &["2026-03-02@08:00-12:00", "2026-03-02@15:00-14:00"],
        );
        one_day.end = one_day.start;

        run(
            &mut output,
            &mut db,
            vec![subject("maths", 1.0, 0.0)],
            &one_day,
            &PlannerConfig::default(),
            &no_delay(),
        )
        .await
        .unwrap();

        let stored = db
            .get_subject_schedule(&SubjectName::new("maths").unwrap())
            .unwrap()
            .unwrap();
        assert_eq!(stored.schedule[0].slots[0].start_time.to_string(), "12:00");
        assert_eq!(db.list_unavailable_times().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn generate_rejects_inverted_range() {
        let mut db = Database::open_in_memory().unwrap();
        let mut inverted = args(&["maths"], &[]);
        inverted.end = "2026-03-01".parse().unwrap();

        let err = run(
            &mut Vec::new(),
            &mut db,
            vec![subject("maths", 2.0, 0.0)],
            &inverted,
            &PlannerConfig::default(),
            &no_delay(),
        )
        .await
        .unwrap_err();
        assert!(err.to_string().contains("invalid date range"));
    }

    #[tokio::test]
    async fn generate_rejects_bad_block() {
        let mut db = Database::open_in_memory().unwrap();
        let result = run(
            &mut Vec::new(),
            &mut db,
            vec![subject("maths", 2.0, 0.0)],
            &args(&["maths"], &["2026-03-02@13:00-12:00"]),
            &PlannerConfig::default(),
            &no_delay(),
        )
        .await;
        assert!(result.is_err());
    }
}
