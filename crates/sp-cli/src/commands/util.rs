//! Shared utilities for CLI commands.

use std::sync::LazyLock;

use anyhow::Context;
use regex::Regex;
use sp_core::{ClockTime, UnavailableInterval};

/// Pre-compiled regex for `DATE@HH:MM-HH:MM` blocked times.
static BLOCK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{4}-\d{2}-\d{2})@(\d{1,2}:\d{2})-(\d{1,2}:\d{2})$").unwrap()
});

/// Parse a blocked time given on the command line.
///
/// Format: `2026-03-02@12:00-13:00`. An interval that does not end after it
/// starts is returned as given; planning drops it like any stored one.
pub fn parse_block(s: &str) -> anyhow::Result<UnavailableInterval> {
    let Some(caps) = BLOCK_RE.captures(s.trim()) else {
        anyhow::bail!("Invalid blocked time: {s}. Use DATE@HH:MM-HH:MM (e.g., 2026-03-02@12:00-13:00)");
    };

    let date = caps[1]
        .parse()
        .with_context(|| format!("invalid date in blocked time: {s}"))?;
    let start_time: ClockTime = caps[2]
        .parse()
        .with_context(|| format!("invalid start time in blocked time: {s}"))?;
    let end_time: ClockTime = caps[3]
        .parse()
        .with_context(|| format!("invalid end time in blocked time: {s}"))?;

    Ok(UnavailableInterval {
        date,
        start_time,
        end_time,
    })
}

/// Format hours without a trailing `.0`.
pub fn format_hours(hours: f64) -> String {
    let formatted = format!("{hours:.2}");
    formatted
        .trim_end_matches('0')
        .trim_end_matches('.')
        .to_string()
}

/// Format minutes as `1h 30m`.
pub fn format_minutes(minutes: u32) -> String {
    match (minutes / 60, minutes % 60) {
        (0, m) => format!("{m}m"),
        (h, 0) => format!("{h}h"),
        (h, m) => format!("{h}h {m}m"),
    }
}
