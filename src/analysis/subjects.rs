use crate::analysis::classifier::{correct_rate, percentage};
use crate::analysis::units::UnitKey;
use crate::analysis::{count_correct, group_ordered};
use crate::records::{AttemptRecord, Difficulty, DifficultyDistribution, SubjectStats};

/// A unit is listed as weak inside its subject only with at least this many
/// attempts, so a single unlucky attempt does not flag it.
const WEAK_UNIT_MIN_ATTEMPTS: u32 = 2;
const WEAK_UNIT_MAX_RATE: u32 = 60;

/// Score-weighted average: `round(100 * Σ(score / max_score) / n)`.
pub fn average_score(records: &[&AttemptRecord]) -> u32 {
    if records.is_empty() {
        return 0;
    }
    let ratio_sum: f64 = records.iter().map(|r| r.score_ratio()).sum();
    (100.0 * ratio_sum / records.len() as f64).round().max(0.0) as u32
}

pub fn analyze_subjects(records: &[AttemptRecord]) -> Vec<SubjectStats> {
    let groups = group_ordered(records, |r| Some(r.subject.as_str()));

    let mut stats: Vec<SubjectStats> = groups
        .into_iter()
        .map(|(subject, group)| {
            let total = group.len() as u32;
            let correct = count_correct(&group);
            SubjectStats {
                subject: subject.to_string(),
                total_problems: total,
                correct_count: correct,
                correct_rate: correct_rate(correct, total),
                average_score: average_score(&group),
                weak_units: qualifying_weak_units(&group),
            }
        })
        .collect();

    stats.sort_by_key(|s| s.correct_rate);
    stats
}

/// Units of one subject with `total >= 2` and a correct rate under 60.
fn qualifying_weak_units(subject_records: &[&AttemptRecord]) -> Vec<String> {
    let mut tallies: Vec<(UnitKey<'_>, u32, u32)> = Vec::new();
    for record in subject_records {
        let key = UnitKey::of(*record);
        match tallies.iter_mut().find(|(k, _, _)| *k == key) {
            Some((_, total, correct)) => {
                *total += 1;
                *correct += record.is_correct as u32;
            }
            None => tallies.push((key, 1, record.is_correct as u32)),
        }
    }

    tallies
        .into_iter()
        .filter(|(_, total, correct)| {
            *total >= WEAK_UNIT_MIN_ATTEMPTS && correct_rate(*correct, *total) < WEAK_UNIT_MAX_RATE
        })
        .map(|(key, _, _)| key.unit.to_string())
        .collect()
}

pub fn analyze_difficulty(records: &[AttemptRecord]) -> DifficultyDistribution {
    let mut distribution = DifficultyDistribution::default();
    for record in records {
        let bucket = distribution.get_mut(record.difficulty);
        bucket.total += 1;
        if record.is_correct {
            bucket.correct += 1;
        }
    }
    for difficulty in Difficulty::ALL {
        let bucket = distribution.get_mut(difficulty);
        bucket.rate = percentage(bucket.correct, bucket.total);
    }
    distribution
}
