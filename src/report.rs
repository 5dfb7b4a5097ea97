use std::collections::BTreeMap;
use std::fmt::Write;

use chrono::{DateTime, SecondsFormat, Timelike, Utc};

use crate::models::{AssignmentId, LateSubmission, SubmissionRecord};

/// Whole seconds, or six fractional digits when there are any microseconds.
fn iso(timestamp: &DateTime<Utc>) -> String {
    let format = if timestamp.nanosecond() / 1_000 == 0 {
        SecondsFormat::Secs
    } else {
        SecondsFormat::Micros
    };
    timestamp.to_rfc3339_opts(format, false)
}

fn join_assignments(assignments: &[AssignmentId]) -> String {
    assignments
        .iter()
        .map(AssignmentId::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Renders the three report sections as plain text without a final newline.
pub fn format_report(
    missing: &BTreeMap<String, Vec<AssignmentId>>,
    late: &[LateSubmission],
    open: &[SubmissionRecord],
) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "REPORT\n{}", "=".repeat(40));
    let _ = writeln!(output, "\n1) Students missing submissions:\n");

    if missing.is_empty() {
        let _ = writeln!(output, "All students submitted every expected assignment.\n");
    } else {
        for (student, assignments) in missing {
            let _ = writeln!(output, "- {}: {}", student, join_assignments(assignments));
        }
    }

    let _ = writeln!(output, "\n2) Students who submitted after the deadline:\n");

    if late.is_empty() {
        let _ = writeln!(output, "No late submissions detected.\n");
    } else {
        let mut entries = late.to_vec();
        entries.sort_by(|a, b| {
            a.student
                .cmp(&b.student)
                .then_with(|| a.assignment.cmp(&b.assignment))
        });
        for entry in entries.iter() {
            let _ = writeln!(
                output,
                "- {} - {}: submitted {} (deadline {})",
                entry.student,
                entry.assignment,
                iso(&entry.submitted),
                iso(&entry.deadline)
            );
        }
    }

    let _ = writeln!(output, "\n3) Submissions currently OPEN:\n");

    if open.is_empty() {
        let _ = writeln!(output, "No OPEN submissions.\n");
    } else {
        for record in open {
            let timestamp = record
                .timestamp
                .as_ref()
                .map(iso)
                .unwrap_or_else(|| "no timestamp".to_string());
            let _ = writeln!(
                output,
                "- id {} - {} - {} - {}",
                record.id,
                join_assignments(&record.assignments),
                record.student,
                timestamp
            );
        }
    }

    // sections are newline-joined, not newline-terminated
    output.pop();
    output
}
