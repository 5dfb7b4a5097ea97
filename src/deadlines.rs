use std::path::Path;
use std::sync::LazyLock;

use chrono::{NaiveDate, TimeZone, Utc};
use regex::{Captures, Regex};

use crate::error::{self, AnalyzerError};
use crate::models::{AssignmentId, Deadlines};

static DAY_DEADLINE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)Day\s*0?(\d{1,2})\s*Dead-?line:\s*([0-9]{4})\.([0-9]{2})\.([0-9]{2})\s*([0-9]{2}):([0-9]{2})",
    )
    .expect("day deadline pattern is valid")
});

static FINAL_DEADLINE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)Final Project proposal\s*dead-?line:\s*([0-9]{4})\.([0-9]{2})\.([0-9]{2})\s*([0-9]{2}):([0-9]{2})",
    )
    .expect("final project deadline pattern is valid")
});

/// Extracts every recognizable deadline from a syllabus document.
///
/// Lines that match neither pattern are ignored. A later line for the same
/// assignment overwrites an earlier one.
pub fn parse_deadlines(document: &str) -> Deadlines {
    let mut deadlines = Deadlines::new();

    for line in document.lines() {
        let line = line.trim();

        if let Some(caps) = DAY_DEADLINE_RE.captures(line) {
            let Ok(number) = caps[1].parse::<u8>() else {
                continue;
            };
            insert_deadline(&mut deadlines, AssignmentId::Day(number), &caps, 2, line);
            continue;
        }

        if let Some(caps) = FINAL_DEADLINE_RE.captures(line) {
            insert_deadline(
                &mut deadlines,
                AssignmentId::FinalProjectProposal,
                &caps,
                1,
                line,
            );
        }
    }

    deadlines
}

pub fn load_deadlines(path: &Path) -> Result<Deadlines, AnalyzerError> {
    let document = error::read_input(path)?;
    let deadlines = parse_deadlines(&document);
    tracing::debug!(
        path = %path.display(),
        count = deadlines.len(),
        "parsed deadlines"
    );
    Ok(deadlines)
}

fn insert_deadline(
    deadlines: &mut Deadlines,
    assignment: AssignmentId,
    caps: &Captures<'_>,
    first: usize,
    line: &str,
) {
    let field = |offset: usize| caps[first + offset].parse::<u32>().ok();

    let timestamp = match (field(0), field(1), field(2), field(3), field(4)) {
        (Some(year), Some(month), Some(day), Some(hour), Some(minute)) => {
            NaiveDate::from_ymd_opt(year as i32, month, day)
                .and_then(|date| date.and_hms_opt(hour, minute, 0))
                .map(|naive| Utc.from_utc_datetime(&naive))
        }
        _ => None,
    };

    match timestamp {
        Some(timestamp) => {
            deadlines.insert(assignment, timestamp);
        }
        None => {
            tracing::warn!(%assignment, line, "skipping deadline with invalid date");
        }
    }
}
