use crate::analysis::classifier::percentage;
use crate::records::{AttemptRecord, ErrorPattern, ErrorType, Severity};

const MAX_EXAMPLES: usize = 3;

pub fn severity_for(frequency: u32) -> Severity {
    if frequency >= 40 {
        Severity::High
    } else if frequency >= 20 {
        Severity::Medium
    } else {
        Severity::Low
    }
}

/// Recurring error categories across all wrong answers, most frequent first.
///
/// Every frequency is a percentage of the same denominator (all wrong answers
/// in the batch), so the values are individually bounded but need not sum to
/// exactly 100.
pub fn analyze_error_patterns(records: &[AttemptRecord]) -> Vec<ErrorPattern> {
    let wrong: Vec<(&AttemptRecord, ErrorType)> = records
        .iter()
        .filter_map(|r| r.wrong_category().map(|t| (r, t)))
        .collect();
    if wrong.is_empty() {
        return Vec::new();
    }
    let total_wrong = wrong.len() as u32;

    let mut patterns: Vec<ErrorPattern> = ErrorType::ALL
        .iter()
        .filter_map(|&category| {
            let group: Vec<&AttemptRecord> = wrong
                .iter()
                .filter(|(_, t)| *t == category)
                .map(|(r, _)| *r)
                .collect();
            if group.is_empty() {
                return None;
            }

            let frequency = percentage(group.len() as u32, total_wrong);
            Some(ErrorPattern {
                id: format!("pattern-{}", category.as_str()),
                error_type: category,
                description: category.description().to_string(),
                frequency,
                examples: group
                    .iter()
                    .take(MAX_EXAMPLES)
                    .map(|r| r.id.clone())
                    .collect(),
                severity: severity_for(frequency),
                recommendation: category.remediation().to_string(),
            })
        })
        .collect();

    // Stable sort keeps canonical category order for equal frequencies
    patterns.sort_by(|a, b| b.frequency.cmp(&a.frequency));
    patterns
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::fixtures::{algebra_batch, attempt};

    #[test]
    fn algebra_batch_has_two_high_patterns() {
        let patterns = analyze_error_patterns(&algebra_batch());
        assert_eq!(patterns.len(), 2);
        assert_eq!(patterns[0].error_type, ErrorType::Calculation);
        assert_eq!(patterns[1].error_type, ErrorType::Concept);
        for pattern in &patterns {
            assert_eq!(pattern.frequency, 50);
            assert_eq!(pattern.severity, Severity::High);
        }
        assert_eq!(patterns[0].examples, vec!["r1".to_string()]);
        assert_eq!(patterns[0].recommendation, ErrorType::Calculation.remediation());
    }

    #[test]
    fn no_wrong_answers_means_no_patterns() {
        let records = vec![
            attempt("1", "Math", "U", None, true, None, 0),
            attempt("2", "Math", "U", None, true, Some(ErrorType::Time), 1),
        ];
        assert!(analyze_error_patterns(&records).is_empty());
        assert!(analyze_error_patterns(&[]).is_empty());
    }

    #[test]
    fn missing_error_type_is_unknown() {
        let records = vec![attempt("1", "Math", "U", None, false, None, 0)];
        let patterns = analyze_error_patterns(&records);
        assert_eq!(patterns.len(), 1);
        assert_eq!(patterns[0].error_type, ErrorType::Unknown);
        assert_eq!(patterns[0].frequency, 100);
    }

    #[test]
    fn frequencies_are_bounded_and_sorted() {
        let mut records = Vec::new();
        let categories = [
            ErrorType::Time,
            ErrorType::Careless,
            ErrorType::Careless,
            ErrorType::Method,
            ErrorType::Careless,
            ErrorType::Incomplete,
            ErrorType::Time,
        ];
        for (i, category) in categories.iter().enumerate() {
            records.push(attempt(&i.to_string(), "Math", "U", None, false, Some(*category), i as i64));
        }

        let patterns = analyze_error_patterns(&records);
        assert_eq!(patterns.len(), 4);
        assert!(patterns.iter().all(|p| p.frequency <= 100 && p.frequency > 0));
        assert!(patterns.windows(2).all(|w| w[0].frequency >= w[1].frequency));

        assert_eq!(patterns[0].error_type, ErrorType::Careless);
        assert_eq!(patterns[0].frequency, 43);
        assert_eq!(patterns[0].severity, Severity::High);
        assert_eq!(patterns[1].error_type, ErrorType::Time);
        assert_eq!(patterns[1].severity, Severity::Medium);
        // method and incomplete tie at 14: canonical order decides
        assert_eq!(patterns[2].error_type, ErrorType::Method);
        assert_eq!(patterns[3].error_type, ErrorType::Incomplete);
        assert_eq!(patterns[3].severity, Severity::Low);
    }

    #[test]
    fn examples_are_capped_in_batch_order() {
        let records: Vec<_> = (0..5)
            .map(|i| attempt(&format!("w{}", i), "Math", "U", None, false, Some(ErrorType::Time), i))
            .collect();
        let patterns = analyze_error_patterns(&records);
        assert_eq!(patterns[0].examples, vec!["w0", "w1", "w2"]);
    }
}
