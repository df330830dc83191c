//! Command-line argument definitions.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

/// Study time planner.
///
/// Spreads each subject's remaining study hours across the free time in a
/// date range and stores the resulting schedules.
#[derive(Debug, Parser)]
#[command(name = "sp", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Manage subjects.
    #[command(subcommand)]
    Subjects(SubjectsAction),

    /// Generate and save schedules for the selected subjects.
    Generate {
        /// First date of the range (YYYY-MM-DD).
        #[arg(long)]
        start: NaiveDate,

        /// Last date of the range, inclusive (YYYY-MM-DD).
        #[arg(long)]
        end: NaiveDate,

        /// Subject to schedule; repeat to schedule several, in order.
        #[arg(long = "subject", required = true)]
        subjects: Vec<String>,

        /// Blocked time as DATE@HH:MM-HH:MM; repeatable. Without any, the
        /// stored blocked times are reused.
        #[arg(long = "block")]
        blocks: Vec<String>,

        /// Plan without any blocked times, clearing the stored ones.
        #[arg(long, conflicts_with = "blocks")]
        no_blocks: bool,
    },

    /// Show the combined calendar of stored schedules.
    Show {
        /// Output as JSON.
        #[arg(long)]
        json: bool,

        /// Only show this date (YYYY-MM-DD).
        #[arg(long)]
        date: Option<NaiveDate>,
    },
}

/// Subject management actions.
#[derive(Debug, Subcommand)]
pub enum SubjectsAction {
    /// Add a subject.
    Add {
        #[arg(long)]
        name: String,

        /// Total planned study hours.
        #[arg(long)]
        hours: f64,

        /// Hours already studied.
        #[arg(long, default_value_t = 0.0)]
        studied: f64,

        /// Deadline (YYYY-MM-DD).
        #[arg(long)]
        deadline: Option<NaiveDate>,
    },

    /// List subjects with their remaining hours.
    List {
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Record the hours already studied for a subject.
    Studied {
        #[arg(long)]
        name: String,

        #[arg(long)]
        hours: f64,
    },

    /// Remove a subject.
    Remove {
        #[arg(long)]
        name: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_collects_repeated_flags() {
        let cli = Cli::try_parse_from([
            "sp",
            "generate",
            "--start",
            "2026-03-02",
            "--end",
            "2026-03-06",
            "--subject",
            "maths",
            "--subject",
            "physics",
            "--block",
            "2026-03-02@12:00-13:00",
        ])
        .unwrap();

        let Some(Commands::Generate {
            start,
            subjects,
            blocks,
            ..
        }) = cli.command
        else {
            panic!("expected generate command");
        };
        assert_eq!(start.to_string(), "2026-03-02");
        assert_eq!(subjects, vec!["maths", "physics"]);
        assert_eq!(blocks, vec!["2026-03-02@12:00-13:00"]);
    }

    #[test]
    fn test_generate_requires_subject() {
        let result = Cli::try_parse_from([
            "sp",
            "generate",
            "--start",
            "2026-03-02",
            "--end",
            "2026-03-06",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_no_blocks_conflicts_with_block() {
        let result = Cli::try_parse_from([
            "sp",
            "generate",
            "--start",
            "2026-03-02",
            "--end",
            "2026-03-06",
            "--subject",
            "maths",
            "--no-blocks",
            "--block",
            "2026-03-02@12:00-13:00",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_subjects_add_defaults() {
        let cli = Cli::try_parse_from(["sp", "subjects", "add", "--name", "maths", "--hours", "12"])
            .unwrap();
        let Some(Commands::Subjects(SubjectsAction::Add {
            studied, deadline, ..
        })) = cli.command
        else {
            panic!("expected subjects add");
        };
        assert!(studied.abs() < f64::EPSILON);
        assert!(deadline.is_none());
    }

    #[test]
    fn test_rejects_bad_date() {
        let result = Cli::try_parse_from(["sp", "show", "--date", "next week"]);
        assert!(result.is_err());
    }
}
