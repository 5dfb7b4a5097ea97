use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::models::{Analysis, AssignmentId, Deadlines, LateSubmission, SubmissionRecord};

/// Joins parsed deadlines with submission records.
///
/// Every student seen in the log is expected to hand in every assignment the
/// syllabus lists. Only OPEN records carrying a timestamp can make an
/// assignment late; any record at all keeps it off the missing list.
pub fn analyze(deadlines: &Deadlines, records: &[SubmissionRecord]) -> Analysis {
    let mut students: BTreeSet<&str> = BTreeSet::new();
    let mut index: HashMap<&str, HashMap<AssignmentId, Vec<&SubmissionRecord>>> =
        HashMap::new();
    let mut open = Vec::new();

    for record in records {
        students.insert(record.student.as_str());
        if record.is_open() {
            open.push(record.clone());
        }

        let by_assignment = index.entry(record.student.as_str()).or_default();
        for assignment in &record.assignments {
            by_assignment.entry(*assignment).or_default().push(record);
        }
    }

    let mut missing = BTreeMap::new();
    let mut late = Vec::new();

    for student in students {
        let mut missing_for_student = Vec::new();

        for (assignment, deadline) in deadlines {
            let matching = index
                .get(student)
                .and_then(|by_assignment| by_assignment.get(assignment))
                .map(Vec::as_slice)
                .unwrap_or_default();

            if matching.is_empty() {
                missing_for_student.push(*assignment);
                continue;
            }

            let earliest_open = matching
                .iter()
                .filter(|record| record.is_open())
                .filter_map(|record| record.timestamp)
                .min();

            if let Some(submitted) = earliest_open {
                if submitted > *deadline {
                    late.push(LateSubmission {
                        student: student.to_string(),
                        assignment: *assignment,
                        submitted,
                        deadline: *deadline,
                    });
                }
            }
        }

        if !missing_for_student.is_empty() {
            missing.insert(student.to_string(), missing_for_student);
        }
    }

    tracing::debug!(
        students_missing = missing.len(),
        late = late.len(),
        open = open.len(),
        "cross-referenced submissions"
    );

    Analysis { missing, late, open }
}
