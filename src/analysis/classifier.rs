use chrono::{DateTime, Utc};

use crate::records::{AttemptRecord, Trend, WeaknessLevel};

/// Minimum number of attempts before a trend is reported.
const MIN_TREND_RECORDS: usize = 3;
/// Correct-fraction change between halves that counts as a trend.
const TREND_THRESHOLD: f64 = 0.1;

/// Rounded integer percentage, 0 when `whole` is 0.
pub fn percentage(part: u32, whole: u32) -> u32 {
    if whole == 0 {
        return 0;
    }
    (part as f64 / whole as f64 * 100.0).round() as u32
}

/// Integer percentage of correct answers, 0 for an empty group.
pub fn correct_rate(correct: u32, total: u32) -> u32 {
    percentage(correct, total)
}

pub fn weakness_level(correct_rate: u32) -> WeaknessLevel {
    match correct_rate {
        0..=39 => WeaknessLevel::Critical,
        40..=59 => WeaknessLevel::High,
        60..=79 => WeaknessLevel::Medium,
        _ => WeaknessLevel::Low,
    }
}

/// Compare the correct fraction of the earlier and later half of the attempts.
///
/// Attempts are ordered by grading time and split at `n / 2`, so with an odd
/// count the later half holds the extra attempt.
pub fn trend_of<I>(attempts: I) -> Trend
where
    I: IntoIterator<Item = (bool, DateTime<Utc>)>,
{
    let mut ordered: Vec<(bool, DateTime<Utc>)> = attempts.into_iter().collect();
    if ordered.len() < MIN_TREND_RECORDS {
        return Trend::Stable;
    }
    ordered.sort_by_key(|(_, at)| *at);

    let (first, second) = ordered.split_at(ordered.len() / 2);
    let diff = correct_fraction(second) - correct_fraction(first);

    if diff > TREND_THRESHOLD {
        Trend::Improving
    } else if diff < -TREND_THRESHOLD {
        Trend::Declining
    } else {
        Trend::Stable
    }
}

/// Trend over a group of records.
pub fn trend(records: &[&AttemptRecord]) -> Trend {
    trend_of(records.iter().map(|r| (r.is_correct, r.graded_at)))
}

fn correct_fraction(half: &[(bool, DateTime<Utc>)]) -> f64 {
    if half.is_empty() {
        return 0.0;
    }
    half.iter().filter(|(ok, _)| *ok).count() as f64 / half.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn sequence(outcomes: &[bool]) -> Vec<(bool, DateTime<Utc>)> {
        let base = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        outcomes
            .iter()
            .enumerate()
            .map(|(i, ok)| (*ok, base + Duration::hours(i as i64)))
            .collect()
    }

    #[test]
    fn correct_rate_edges() {
        assert_eq!(correct_rate(0, 0), 0);
        assert_eq!(correct_rate(3, 10), 30);
        assert_eq!(correct_rate(1, 3), 33);
        assert_eq!(correct_rate(2, 3), 67);
        assert_eq!(correct_rate(5, 5), 100);
    }

    #[test]
    fn correct_rate_is_monotone() {
        let total = 17;
        let mut last = 0;
        for correct in 0..=total {
            let rate = correct_rate(correct, total);
            assert!(rate >= last);
            assert!(rate <= 100);
            last = rate;
        }
    }

    #[test]
    fn weakness_tier_boundaries() {
        assert_eq!(weakness_level(39), WeaknessLevel::Critical);
        assert_eq!(weakness_level(40), WeaknessLevel::High);
        assert_eq!(weakness_level(59), WeaknessLevel::High);
        assert_eq!(weakness_level(60), WeaknessLevel::Medium);
        assert_eq!(weakness_level(79), WeaknessLevel::Medium);
        assert_eq!(weakness_level(80), WeaknessLevel::Low);
        assert_eq!(weakness_level(0), WeaknessLevel::Critical);
        assert_eq!(weakness_level(100), WeaknessLevel::Low);
    }

    #[test]
    fn short_sequences_are_stable() {
        assert_eq!(trend_of(sequence(&[])), Trend::Stable);
        assert_eq!(trend_of(sequence(&[false])), Trend::Stable);
        assert_eq!(trend_of(sequence(&[false, true])), Trend::Stable);
    }

    #[test]
    fn wrong_then_right_is_improving() {
        let outcomes = [false, false, false, true, true, true];
        assert_eq!(trend_of(sequence(&outcomes)), Trend::Improving);
    }

    #[test]
    fn right_then_wrong_is_declining() {
        let outcomes = [true, true, true, false, false, false];
        assert_eq!(trend_of(sequence(&outcomes)), Trend::Declining);
    }

    #[test]
    fn uniform_sequences_are_stable() {
        for n in 3..9 {
            assert_eq!(trend_of(sequence(&vec![true; n])), Trend::Stable);
            assert_eq!(trend_of(sequence(&vec![false; n])), Trend::Stable);
        }
    }

    #[test]
    fn order_comes_from_timestamps() {
        // Improving once sorted, even though supplied newest first.
        let mut attempts = sequence(&[false, false, false, true, true, true]);
        attempts.reverse();
        assert_eq!(trend_of(attempts), Trend::Improving);
    }

    #[test]
    fn odd_split_puts_extra_record_in_second_half() {
        // 5 records: first half [true, true] = 1.0, second [true, false, false] = 0.33
        let outcomes = [true, true, true, false, false];
        assert_eq!(trend_of(sequence(&outcomes)), Trend::Declining);
        // first [false, false] = 0.0, second [false, true, false] = 0.33
        let outcomes = [false, false, false, true, false];
        assert_eq!(trend_of(sequence(&outcomes)), Trend::Improving);
    }
}
