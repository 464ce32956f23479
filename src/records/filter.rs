use chrono::{DateTime, Utc};

use crate::records::attempt::AttemptRecord;

/// Caller-side selection of the records that go into one report.
/// The engine itself never filters; this is what the CLI uses before analysis.
#[derive(Debug, Clone, Default)]
pub struct RecordFilter {
    pub student_id: Option<String>,
    /// Empty means every subject.
    pub subjects: Vec<String>,
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
}

impl RecordFilter {
    pub fn matches(&self, record: &AttemptRecord) -> bool {
        if let Some(ref student) = self.student_id {
            if record.student_id.trim() != student.trim() {
                return false;
            }
        }
        if !self.subjects.is_empty()
            && !self.subjects.iter().any(|s| s.trim() == record.subject.trim())
        {
            return false;
        }
        if let Some(since) = self.since {
            if record.graded_at < since {
                return false;
            }
        }
        if let Some(until) = self.until {
            if record.graded_at > until {
                return false;
            }
        }
        true
    }

    pub fn apply(&self, records: &[AttemptRecord]) -> Vec<AttemptRecord> {
        let filtered: Vec<AttemptRecord> = records
            .iter()
            .filter(|r| self.matches(r))
            .cloned()
            .collect();

        if filtered.len() != records.len() {
            tracing::debug!(
                student_id = ?self.student_id,
                subjects = ?self.subjects,
                kept = filtered.len(),
                total = records.len(),
                "Filtered attempt records"
            );
        }
        filtered
    }
}
