use crate::analysis::classifier::{correct_rate, trend, weakness_level};
use crate::analysis::{count_correct, group_ordered};
use crate::records::{AttemptRecord, ErrorType, WeakUnit};

const MAX_MAIN_ERROR_TYPES: usize = 3;

/// Composite grouping key for a unit within a subject.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct UnitKey<'a> {
    pub subject: &'a str,
    pub unit: &'a str,
}

impl<'a> UnitKey<'a> {
    pub fn of(record: &'a AttemptRecord) -> Self {
        UnitKey {
            subject: &record.subject,
            unit: &record.unit,
        }
    }
}

/// Per-unit statistics, worst correct rate first.
pub fn analyze_units(records: &[AttemptRecord]) -> Vec<WeakUnit> {
    let groups = group_ordered(records, |r| Some(UnitKey::of(r)));

    let mut units: Vec<WeakUnit> = groups
        .into_iter()
        .map(|(key, group)| {
            let total = group.len() as u32;
            let correct = count_correct(&group);
            let rate = correct_rate(correct, total);
            WeakUnit {
                unit: key.unit.to_string(),
                subject: key.subject.to_string(),
                total_problems: total,
                wrong_count: total - correct,
                correct_rate: rate,
                weakness_level: weakness_level(rate),
                recent_trend: trend(&group),
                main_error_types: main_error_types(&group),
            }
        })
        .collect();

    // Stable sort: equal rates keep first-seen order
    units.sort_by_key(|u| u.correct_rate);
    units
}

/// Most frequent explicit error types among the wrong answers of a group.
/// Ties go to the type seen first.
fn main_error_types(group: &[&AttemptRecord]) -> Vec<ErrorType> {
    let mut counts: Vec<(ErrorType, usize)> = Vec::new();
    for error_type in group
        .iter()
        .filter(|r| !r.is_correct)
        .filter_map(|r| r.error_type)
    {
        match counts.iter_mut().find(|(t, _)| *t == error_type) {
            Some((_, n)) => *n += 1,
            None => counts.push((error_type, 1)),
        }
    }

    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
        .into_iter()
        .take(MAX_MAIN_ERROR_TYPES)
        .map(|(t, _)| t)
        .collect()
}
