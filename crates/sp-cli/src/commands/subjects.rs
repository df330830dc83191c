//! Subject management commands.
//!
//! Implements `sp subjects add|list|studied|remove`.

use std::fmt::Write as _;
use std::io::Write;

use anyhow::{Result, bail};
use chrono::NaiveDate;
use serde::Serialize;
use sp_core::{Subject, SubjectName};
use sp_db::Database;

use super::util::format_hours;

/// Rejects negative or non-finite hour values.
fn check_hours(what: &str, hours: f64) -> Result<()> {
    if !hours.is_finite() || hours < 0.0 {
        bail!("{what} must be a non-negative number, got {hours}");
    }
    Ok(())
}

/// Adds a subject to the local store.
pub fn add<W: Write>(
    writer: &mut W,
    db: &Database,
    name: &str,
    hours: f64,
    studied: f64,
    deadline: Option<NaiveDate>,
) -> Result<()> {
    check_hours("hours", hours)?;
    check_hours("studied hours", studied)?;

    let subject = Subject {
        name: SubjectName::new(name)?,
        total_hours: hours,
        hours_studied: studied,
        deadline,
    };
    db.add_subject(&subject)?;
    tracing::info!(subject = %subject.name, "subject added");

    writeln!(
        writer,
        "Added {} ({}h, {}h remaining)",
        subject.name,
        format_hours(subject.total_hours),
        format_hours(subject.remaining_hours())
    )?;
    Ok(())
}

/// Records studied hours for a subject.
pub fn set_studied<W: Write>(writer: &mut W, db: &Database, name: &str, hours: f64) -> Result<()> {
    check_hours("studied hours", hours)?;
    let name = SubjectName::new(name)?;
    db.set_hours_studied(&name, hours)?;
    writeln!(writer, "Recorded {}h studied for {name}", format_hours(hours))?;
    Ok(())
}

/// Removes a subject from the local store.
pub fn remove<W: Write>(writer: &mut W, db: &Database, name: &str) -> Result<()> {
    let name = SubjectName::new(name)?;
    db.remove_subject(&name)?;
    writeln!(writer, "Removed {name}")?;
    Ok(())
}

// ========== Listing ==========

/// Subject data for JSON output.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SubjectEntry<'a> {
    name: &'a SubjectName,
    hours: f64,
    hours_studied: f64,
    remaining_hours: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    deadline: Option<NaiveDate>,
}

/// Format subjects for human-readable output.
pub fn format_subjects(subjects: &[Subject]) -> String {
    let mut output = String::new();

    if subjects.is_empty() {
        writeln!(output, "No subjects.").unwrap();
        writeln!(output).unwrap();
        writeln!(
            output,
            "Hint: Run 'sp subjects add --name <NAME> --hours <HOURS>' to add one."
        )
        .unwrap();
        return output;
    }

    writeln!(
        output,
        "{:<20}  {:>5}  {:>7}  {:>9}  Deadline",
        "Name", "Hours", "Studied", "Remaining"
    )
    .unwrap();
    writeln!(
        output,
        "────────────────────  ─────  ───────  ─────────  ──────────"
    )
    .unwrap();

    for subject in subjects {
        let name = subject.name.as_str();
        // Truncate by characters, not bytes
        let name_display = if name.chars().count() > 20 {
            format!("{}...", name.chars().take(17).collect::<String>())
        } else {
            name.to_string()
        };
        let deadline = subject
            .deadline
            .map_or_else(|| "-".to_string(), |d| d.to_string());

        writeln!(
            output,
            "{:<20}  {:>5}  {:>7}  {:>9}  {}",
            name_display,
            format_hours(subject.total_hours),
            format_hours(subject.hours_studied),
            format_hours(subject.remaining_hours()),
            deadline
        )
        .unwrap();
    }

    output
}

/// Format subjects as JSON.
pub fn format_subjects_json(subjects: &[Subject]) -> Result<String> {
    let entries: Vec<SubjectEntry<'_>> = subjects
        .iter()
        .map(|subject| SubjectEntry {
            name: &subject.name,
            hours: subject.total_hours,
            hours_studied: subject.hours_studied,
            remaining_hours: subject.remaining_hours(),
            deadline: subject.deadline,
        })
        .collect();
    Ok(serde_json::to_string_pretty(&entries)?)
}

/// Prints subjects.
pub fn list<W: Write>(writer: &mut W, subjects: &[Subject], json: bool) -> Result<()> {
    if json {
        writeln!(writer, "{}", format_subjects_json(subjects)?)?;
    } else {
        write!(writer, "{}", format_subjects(subjects))?;
    }
    Ok(())
}
