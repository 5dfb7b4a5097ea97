use std::collections::BTreeSet;
use std::path::Path;
use std::sync::LazyLock;

use chrono::{DateTime, NaiveDateTime, Utc};
use regex::Regex;

use crate::error::{self, AnalyzerError};
use crate::models::{AssignmentId, SubmissionRecord};

static DAY_MENTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)Day\s*0?(\d{1,2})").expect("day mention pattern is valid"));

static AND_DAY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\band\s*0?(\d{1,2})\b").expect("informal range pattern is valid")
});

static FINAL_PROJECT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)Final Project proposal").expect("final project pattern is valid")
});

static ISO_DATE_TIME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}T").expect("iso prefix pattern is valid"));

static BY_AUTHOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bby\s+(.+)$").expect("author pattern is valid"));

static DASH_AUTHOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[-–]\s*(.+)$").expect("dash author pattern is valid"));

static FILLER_WORDS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(and|proposal|for|final project)\b").expect("filler pattern is valid")
});

/// Tried after RFC 3339; the strict seconds form comes first.
const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%z",
    "%Y-%m-%dT%H:%M%z",
    "%Y-%m-%d %H:%M%z",
];

/// Offset-less forms, read as UTC.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

type NameStrategy = fn(&str) -> Option<String>;

/// Tried in order; the first strategy that recognizes a name wins.
const NAME_STRATEGIES: [NameStrategy; 4] = [
    name_after_by,
    name_after_dash,
    name_after_last_day,
    name_from_last_token,
];

/// Parses a tab-separated submission log. Blank lines produce no record;
/// every other line produces exactly one, however malformed.
pub fn parse_submissions(log: &str) -> Vec<SubmissionRecord> {
    log.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(parse_line)
        .collect()
}

pub fn load_submissions(path: &Path) -> Result<Vec<SubmissionRecord>, AnalyzerError> {
    let log = error::read_input(path)?;
    let records = parse_submissions(&log);
    tracing::debug!(
        path = %path.display(),
        count = records.len(),
        "parsed submission records"
    );
    Ok(records)
}

fn parse_line(line: &str) -> SubmissionRecord {
    let parts: Vec<&str> = line.split('\t').collect();
    let column = |index: usize| parts.get(index).copied().unwrap_or_default();

    let timestamp = if parts.len() >= 5 && !column(4).trim().is_empty() {
        parse_timestamp(column(4))
    } else if parts.len() == 4 && !column(3).trim().is_empty() {
        let candidate = column(3).trim();
        if ISO_DATE_TIME_RE.is_match(candidate) {
            parse_timestamp(candidate)
        } else {
            None
        }
    } else {
        None
    };

    let title = column(2);
    let record = SubmissionRecord {
        id: column(0).to_string(),
        status: column(1).to_string(),
        title: title.to_string(),
        assignments: extract_assignments(title),
        student: extract_student(title),
        timestamp,
    };

    if record.assignments.is_empty() {
        tracing::debug!(id = %record.id, title = %record.title, "no assignment recognized");
    }
    record
}

/// Reads an ISO-8601 timestamp, returning `None` for anything unparsable.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    let normalized = match raw.strip_suffix('Z') {
        Some(stem) => format!("{stem}+00:00"),
        None => raw.to_string(),
    };

    if let Ok(parsed) = DateTime::parse_from_rfc3339(&normalized) {
        return Some(parsed.with_timezone(&Utc));
    }
    if let Some(parsed) = OFFSET_FORMATS
        .iter()
        .find_map(|format| DateTime::parse_from_str(&normalized, format).ok())
    {
        return Some(parsed.with_timezone(&Utc));
    }

    NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(&normalized, format).ok())
        .map(|naive| naive.and_utc())
}

/// Every day a title mentions, ascending, with the final project last.
pub fn extract_assignments(title: &str) -> Vec<AssignmentId> {
    let mut days = BTreeSet::new();

    for caps in DAY_MENTION_RE.captures_iter(title) {
        if let Ok(number) = caps[1].parse::<u8>() {
            days.insert(number);
        }
    }
    for caps in AND_DAY_RE.captures_iter(title) {
        if let Ok(number) = caps[1].parse::<u8>() {
            days.insert(number);
        }
    }

    let mut assignments: Vec<AssignmentId> = days.into_iter().map(AssignmentId::Day).collect();
    if FINAL_PROJECT_RE.is_match(title) {
        assignments.push(AssignmentId::FinalProjectProposal);
    }
    assignments
}

/// Best-effort guess at who submitted, from the free-text title.
pub fn extract_student(title: &str) -> String {
    NAME_STRATEGIES
        .iter()
        .find_map(|strategy| strategy(title))
        .unwrap_or_default()
}

fn name_after_by(title: &str) -> Option<String> {
    BY_AUTHOR_RE
        .captures(title)
        .map(|caps| title_case(caps[1].trim()))
}

fn name_after_dash(title: &str) -> Option<String> {
    DASH_AUTHOR_RE
        .captures(title)
        .map(|caps| title_case(caps[1].trim()))
}

fn name_after_last_day(title: &str) -> Option<String> {
    let last = DAY_MENTION_RE.find_iter(title).last()?;

    let mut remainder = title[last.end()..]
        .trim()
        .trim_start_matches(&[' ', '-', ':', ','][..]);
    if remainder.contains('-') {
        remainder = remainder.rsplit('-').next().unwrap_or_default().trim();
    }

    let stripped = FILLER_WORDS_RE.replace_all(remainder, "");
    let collapsed = stripped.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        None
    } else {
        Some(title_case(&collapsed))
    }
}

fn name_from_last_token(title: &str) -> Option<String> {
    title.split_whitespace().last().map(title_case)
}

/// Upper-cases the first letter of each run of cased letters and lower-cases
/// the rest. Uncased letters (CJK and the like) end a run.
pub fn title_case(text: &str) -> String {
    let mut output = String::with_capacity(text.len());
    let mut inside_word = false;

    for ch in text.chars() {
        if ch.is_lowercase() || ch.is_uppercase() {
            if inside_word {
                output.extend(ch.to_lowercase());
            } else {
                output.extend(ch.to_uppercase());
            }
            inside_word = true;
        } else {
            output.push(ch);
            inside_word = false;
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::io::Write;

    #[test]
    fn extracts_range_and_author() {
        let title = "Day 05 and 06 submission by Alice Smith";
        assert_eq!(
            extract_assignments(title),
            vec![AssignmentId::Day(5), AssignmentId::Day(6)]
        );
        assert_eq!(extract_student(title), "Alice Smith");
    }

    #[test]
    fn assignments_are_deduplicated_and_sorted() {
        let title = "day10 + Day 3 + day03 fixes";
        assert_eq!(
            extract_assignments(title),
            vec![AssignmentId::Day(3), AssignmentId::Day(10)]
        );
    }

    #[test]
    fn final_project_goes_last_even_without_days() {
        assert_eq!(
            extract_assignments("final project proposal - Carol"),
            vec![AssignmentId::FinalProjectProposal]
        );
        assert_eq!(
            extract_assignments("Day09 and Final Project Proposal by Dan"),
            vec![AssignmentId::Day(9), AssignmentId::FinalProjectProposal]
        );
    }

    #[test]
    fn student_from_trailing_dash() {
        assert_eq!(extract_student("Day02 homework - eve adams"), "Eve Adams");
        assert_eq!(extract_student("Day02 homework – EVE"), "Eve");
    }

    #[test]
    fn student_after_last_day_mention() {
        assert_eq!(extract_student("Day03: frank ocean"), "Frank Ocean");
        assert_eq!(
            extract_student("Day07 and Day08 for grace  hopper"),
            "Grace Hopper"
        );
    }

    #[test]
    fn student_falls_back_to_last_token() {
        assert_eq!(extract_student("homework heidi"), "Heidi");
        assert_eq!(extract_student("Day04"), "Day04");
        assert_eq!(extract_student(""), "");
    }

    #[test]
    fn title_case_restarts_after_non_letters() {
        assert_eq!(title_case("o'neil mcDONALD"), "O'Neil Mcdonald");
        assert_eq!(title_case("bob2x"), "Bob2X");
        assert_eq!(title_case("山田taro"), "山田Taro");
    }

    #[test]
    fn timestamp_formats() {
        let expected = Utc.with_ymd_and_hms(2024, 1, 11, 0, 30, 0).unwrap();
        assert_eq!(parse_timestamp("2024-01-11T00:30:00Z"), Some(expected));
        assert_eq!(parse_timestamp("2024-01-11T02:30:00+02:00"), Some(expected));
        assert_eq!(parse_timestamp("2024-01-11T00:30:00+0000"), Some(expected));
        assert_eq!(parse_timestamp("2024-01-11T00:30:00"), Some(expected));
        assert_eq!(parse_timestamp("2024-01-11T00:30Z"), Some(expected));
        assert_eq!(parse_timestamp("2024-01-11T02:30+02:00"), Some(expected));
        assert_eq!(parse_timestamp("2024-01-11 00:30+0000"), Some(expected));
        assert_eq!(parse_timestamp("yesterday"), None);
        assert_eq!(parse_timestamp(""), None);
    }

    #[test]
    fn timestamp_column_rules() {
        let records = parse_submissions(
            "a\tOPEN\tDay01 by Ann\t\t2024-01-11T00:30:00Z\n\
             \n\
             b\tOPEN\tDay01 by Ben\t2024-01-11T00:30:00Z\n\
             c\tOPEN\tDay01 by Cid\tsoon\n\
             d\tOPEN\tDay01 by Dee\t2024-01-11T00:30:00Z\t\n\
             e\tOPEN\tDay01 by Eli\tx\tnot a date",
        );

        assert_eq!(records.len(), 5);
        assert!(records[0].timestamp.is_some());
        assert!(records[1].timestamp.is_some());
        assert!(records[2].timestamp.is_none());
        // trailing tab is trimmed away, leaving four columns
        assert!(records[3].timestamp.is_some());
        assert!(records[4].timestamp.is_none());
    }

    #[test]
    fn short_rows_degrade_to_empty_fields() {
        let records = parse_submissions("lonely-id\n  \nid2\tCLOSED");

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, "lonely-id");
        assert_eq!(records[0].status, "");
        assert_eq!(records[0].title, "");
        assert!(records[0].assignments.is_empty());
        assert_eq!(records[0].student, "");
        assert_eq!(records[1].status, "CLOSED");
        assert_eq!(records[1].timestamp, None);
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "id1\tOPEN\tDay 01 submission by Bob\t\t2024-01-11T00:30:00Z").unwrap();

        let records = load_submissions(file.path()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].student, "Bob");
        assert!(records[0].is_open());
    }
}
