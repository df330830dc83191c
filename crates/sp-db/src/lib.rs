//! Storage layer for the study planner.
//!
//! Provides persistence for subjects, generated subject schedules and the
//! unavailable times they were planned against, using `rusqlite`.
//!
//! # Thread Safety
//!
//! The [`Database`] type wraps a `rusqlite::Connection`, which is `Send` but not `Sync`.
//! A `Database` can be moved between threads but not shared across them without
//! external synchronization. The planner drives it from a single task.
//!
//! # Schema
//!
//! Dates are stored as TEXT in `YYYY-MM-DD` form and times of day as `HH:MM`, so
//! lexicographic order matches chronological order. A subject schedule's days and
//! slots are stored as one JSON document in the same camelCase shape the remote API
//! uses; schedules are always read and replaced whole.

use std::path::Path;

use chrono::{NaiveDate, SecondsFormat, Utc};
use rusqlite::{Connection, ErrorCode, OptionalExtension, params};
use sp_core::{
    ClockTime, GatewayError, LoadedSchedules, SaveRequest, ScheduleDay, ScheduleGateway,
    StoredSchedule, Subject, SubjectName, UnavailableInterval,
};
use thiserror::Error;
use uuid::Uuid;

/// Database errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// An error from the underlying database.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// A subject with this name already exists.
    #[error("subject already exists: {0}")]
    DuplicateSubject(SubjectName),
    /// No subject with this name exists.
    #[error("subject not found: {0}")]
    SubjectNotFound(SubjectName),
    /// A schedule's date range ends before it starts.
    #[error("schedule for {subject} ends ({end}) before it starts ({start})")]
    InvertedRange {
        subject: SubjectName,
        start: NaiveDate,
        end: NaiveDate,
    },
    /// A schedule contains a day outside its own date range.
    #[error("schedule for {subject} has a day outside its range: {date}")]
    DayOutOfRange { subject: SubjectName, date: NaiveDate },
    /// A stored value could not be decoded.
    #[error("invalid stored {what}: {value}")]
    InvalidData { what: &'static str, value: String },
    /// Failed to encode or decode a schedule document.
    #[error("invalid schedule document: {0}")]
    Json(#[from] serde_json::Error),
}

impl DbError {
    /// Whether the error was caused by the data rather than the store.
    pub const fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::DuplicateSubject(_)
                | Self::SubjectNotFound(_)
                | Self::InvertedRange { .. }
                | Self::DayOutOfRange { .. }
        )
    }
}

impl From<DbError> for GatewayError {
    fn from(err: DbError) -> Self {
        if err.is_validation() {
            Self::Validation(err.to_string())
        } else {
            Self::Transient(err.to_string())
        }
    }
}

/// Database connection wrapper.
///
/// See the [module documentation](self) for thread safety considerations.
#[derive(Debug)]
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Opens a database at the given path, creating it if necessary.
    ///
    /// The database schema is automatically initialized on first open.
    pub fn open(path: &Path) -> Result<Self, DbError> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Opens an in-memory database.
    ///
    /// Useful for testing. The database is destroyed when the connection closes.
    pub fn open_in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Initializes the database schema.
    ///
    /// This is idempotent - safe to call on an already-initialized database.
    fn init(&self) -> Result<(), DbError> {
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS subjects (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL UNIQUE,
                total_hours REAL NOT NULL,
                hours_studied REAL NOT NULL DEFAULT 0,
                deadline TEXT,
                created_at TEXT NOT NULL
            );

            -- One schedule per subject; schedule holds the JSON list of days
            CREATE TABLE IF NOT EXISTS subject_schedules (
                subject TEXT PRIMARY KEY,
                start_date TEXT NOT NULL,
                end_date TEXT NOT NULL,
                schedule TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            -- Unavailable times used by the most recent save, in input order
            CREATE TABLE IF NOT EXISTS unavailable_times (
                position INTEGER PRIMARY KEY,
                date TEXT NOT NULL,
                start_time TEXT NOT NULL,
                end_time TEXT NOT NULL
            );
            ",
        )?;
        Ok(())
    }

    // ========== Subjects ==========

    /// Adds a subject, returning its generated ID.
    pub fn add_subject(&self, subject: &Subject) -> Result<String, DbError> {
        let id = Uuid::new_v4().to_string();
        let result = self.conn.execute(
            "
            INSERT INTO subjects (id, name, total_hours, hours_studied, deadline, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            ",
            params![
                id,
                subject.name.as_str(),
                subject.total_hours,
                subject.hours_studied,
                subject.deadline.map(|d| d.to_string()),
                now(),
            ],
        );
        match result {
            Ok(_) => {
                tracing::debug!(subject = %subject.name, %id, "added subject");
                Ok(id)
            }
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == ErrorCode::ConstraintViolation =>
            {
                Err(DbError::DuplicateSubject(subject.name.clone()))
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Lists subjects in the order they were added.
    pub fn list_subjects(&self) -> Result<Vec<Subject>, DbError> {
        let mut stmt = self.conn.prepare(
            "
            SELECT name, total_hours, hours_studied, deadline
            FROM subjects
            ORDER BY created_at ASC, rowid ASC
            ",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, f64>(1)?,
                row.get::<_, f64>(2)?,
                row.get::<_, Option<String>>(3)?,
            ))
        })?;

        let mut subjects = Vec::new();
        for row in rows {
            let (name, total_hours, hours_studied, deadline) = row?;
            let name = SubjectName::new(name.clone()).map_err(|_| DbError::InvalidData {
                what: "subject name",
                value: name,
            })?;
            let deadline = deadline.as_deref().map(parse_date).transpose()?;
            subjects.push(Subject {
                name,
                total_hours,
                hours_studied,
                deadline,
            });
        }
        Ok(subjects)
    }

    /// Records the hours already studied for a subject.
    pub fn set_hours_studied(&self, name: &SubjectName, hours: f64) -> Result<(), DbError> {
        let updated = self.conn.execute(
            "UPDATE subjects SET hours_studied = ? WHERE name = ?",
            params![hours, name.as_str()],
        )?;
        if updated == 0 {
            return Err(DbError::SubjectNotFound(name.clone()));
        }
        Ok(())
    }

    /// Removes a subject. Its stored schedule, if any, is kept.
    pub fn remove_subject(&self, name: &SubjectName) -> Result<(), DbError> {
        let removed = self
            .conn
            .execute("DELETE FROM subjects WHERE name = ?", params![name.as_str()])?;
        if removed == 0 {
            return Err(DbError::SubjectNotFound(name.clone()));
        }
        Ok(())
    }

    // ========== Schedules ==========

    /// Stores a subject's schedule and replaces the stored unavailable times.
    ///
    /// Both writes happen in one transaction. An existing schedule for the
    /// subject is replaced.
    pub fn save_subject_schedule(
        &mut self,
        request: &SaveRequest,
    ) -> Result<StoredSchedule, DbError> {
        validate(request)?;
        let document = serde_json::to_string(&request.schedule)?;

        let tx = self.conn.transaction()?;
        tx.execute(
            "
            INSERT INTO subject_schedules (subject, start_date, end_date, schedule, updated_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(subject) DO UPDATE SET
                start_date = excluded.start_date,
                end_date = excluded.end_date,
                schedule = excluded.schedule,
                updated_at = excluded.updated_at
            ",
            params![
                request.subject.as_str(),
                request.start_date.to_string(),
                request.end_date.to_string(),
                document,
                now(),
            ],
        )?;
        tx.execute("DELETE FROM unavailable_times", [])?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO unavailable_times (position, date, start_time, end_time) VALUES (?, ?, ?, ?)",
            )?;
            for (position, interval) in (0i64..).zip(&request.unavailable_times) {
                stmt.execute(params![
                    position,
                    interval.date.to_string(),
                    interval.start_time.to_string(),
                    interval.end_time.to_string(),
                ])?;
            }
        }
        tx.commit()?;

        tracing::debug!(subject = %request.subject, days = request.schedule.len(), "stored schedule");
        Ok(StoredSchedule::from(request))
    }

    /// Loads the stored schedule for one subject.
    pub fn get_subject_schedule(
        &self,
        subject: &SubjectName,
    ) -> Result<Option<StoredSchedule>, DbError> {
        let row = self
            .conn
            .query_row(
                "SELECT start_date, end_date, schedule FROM subject_schedules WHERE subject = ?",
                params![subject.as_str()],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                    ))
                },
            )
            .optional()?;
        row.map(|(start, end, document)| {
            Ok(StoredSchedule {
                subject: subject.clone(),
                start_date: parse_date(&start)?,
                end_date: parse_date(&end)?,
                schedule: serde_json::from_str::<Vec<ScheduleDay>>(&document)?,
            })
        })
        .transpose()
    }

    /// Loads every stored schedule, ordered by subject name, and the stored
    /// unavailable times.
    pub fn load_all(&self) -> Result<LoadedSchedules, DbError> {
        let mut stmt = self.conn.prepare(
            "
            SELECT subject, start_date, end_date, schedule
            FROM subject_schedules
            ORDER BY subject ASC
            ",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
            ))
        })?;
        let mut subject_schedules = Vec::new();
        for row in rows {
            let (subject, start, end, document) = row?;
            let subject = SubjectName::new(subject.clone()).map_err(|_| DbError::InvalidData {
                what: "subject name",
                value: subject,
            })?;
            subject_schedules.push(StoredSchedule {
                subject,
                start_date: parse_date(&start)?,
                end_date: parse_date(&end)?,
                schedule: serde_json::from_str(&document)?,
            });
        }

        Ok(LoadedSchedules {
            subject_schedules,
            unavailable_times: self.list_unavailable_times()?,
        })
    }

    /// Lists the stored unavailable times in the order they were saved.
    pub fn list_unavailable_times(&self) -> Result<Vec<UnavailableInterval>, DbError> {
        let mut stmt = self.conn.prepare(
            "SELECT date, start_time, end_time FROM unavailable_times ORDER BY position ASC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
            ))
        })?;
        let mut intervals = Vec::new();
        for row in rows {
            let (date, start, end) = row?;
            intervals.push(UnavailableInterval {
                date: parse_date(&date)?,
                start_time: parse_time(&start)?,
                end_time: parse_time(&end)?,
            });
        }
        Ok(intervals)
    }
}

impl ScheduleGateway for Database {
    async fn save_schedule(&mut self, request: &SaveRequest) -> Result<StoredSchedule, GatewayError> {
        Ok(self.save_subject_schedule(request)?)
    }

    async fn load_schedules(&mut self) -> Result<LoadedSchedules, GatewayError> {
        Ok(self.load_all()?)
    }
}

fn validate(request: &SaveRequest) -> Result<(), DbError> {
    if request.start_date > request.end_date {
        return Err(DbError::InvertedRange {
            subject: request.subject.clone(),
            start: request.start_date,
            end: request.end_date,
        });
    }
    if let Some(day) = request
        .schedule
        .iter()
        .find(|day| day.date < request.start_date || day.date > request.end_date)
    {
        return Err(DbError::DayOutOfRange {
            subject: request.subject.clone(),
            date: day.date,
        });
    }
    Ok(())
}

fn now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn parse_date(value: &str) -> Result<NaiveDate, DbError> {
    value.parse().map_err(|_| DbError::InvalidData {
        what: "date",
        value: value.to_string(),
    })
}

fn parse_time(value: &str) -> Result<ClockTime, DbError> {
    value.parse().map_err(|_| DbError::InvalidData {
        what: "time of day",
        value: value.to_string(),
    })
}
