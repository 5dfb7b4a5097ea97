use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};

/// Join key between the syllabus and the submission log.
///
/// Ordering puts every `DayNN` first (ascending) and the final project last,
/// which matches the lexical order of the rendered labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AssignmentId {
    Day(u8),
    FinalProjectProposal,
}

impl fmt::Display for AssignmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssignmentId::Day(number) => write!(f, "Day{:02}", number),
            AssignmentId::FinalProjectProposal => write!(f, "Final Project proposal"),
        }
    }
}

pub type Deadlines = BTreeMap<AssignmentId, DateTime<Utc>>;

#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionRecord {
    pub id: String,
    pub status: String,
    pub title: String,
    pub assignments: Vec<AssignmentId>,
    pub student: String,
    pub timestamp: Option<DateTime<Utc>>,
}

impl SubmissionRecord {
    pub fn is_open(&self) -> bool {
        self.status.eq_ignore_ascii_case("OPEN")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LateSubmission {
    pub student: String,
    pub assignment: AssignmentId,
    pub submitted: DateTime<Utc>,
    pub deadline: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct Analysis {
    pub missing: BTreeMap<String, Vec<AssignmentId>>,
    pub late: Vec<LateSubmission>,
    pub open: Vec<SubmissionRecord>,
}
