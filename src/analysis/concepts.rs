use crate::analysis::classifier::{correct_rate, weakness_level};
use crate::analysis::{count_correct, group_ordered};
use crate::records::{AttemptRecord, WeakConcept};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct ConceptKey<'a> {
    subject: &'a str,
    concept: &'a str,
}

/// Per-concept statistics, worst correct rate first.
/// Records without a concept tag are left out of this pass only.
pub fn analyze_concepts(records: &[AttemptRecord]) -> Vec<WeakConcept> {
    let groups = group_ordered(records, |r| {
        let subject = r.subject.as_str();
        r.concept
            .as_deref()
            .map(|concept| ConceptKey { subject, concept })
    });

    let mut concepts: Vec<WeakConcept> = groups
        .into_iter()
        .map(|(key, group)| {
            let total = group.len() as u32;
            let correct = count_correct(&group);
            let rate = correct_rate(correct, total);

            let mut related_units: Vec<String> = Vec::new();
            for record in &group {
                if !related_units.iter().any(|u| u == &record.unit) {
                    related_units.push(record.unit.clone());
                }
            }

            WeakConcept {
                concept: key.concept.to_string(),
                subject: key.subject.to_string(),
                related_units,
                total_problems: total,
                wrong_count: total - correct,
                correct_rate: rate,
                weakness_level: weakness_level(rate),
            }
        })
        .collect();

    concepts.sort_by_key(|c| c.correct_rate);
    concepts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::fixtures::{algebra_batch, attempt};
    use crate::records::WeaknessLevel;

    #[test]
    fn factoring_is_the_weakest_concept() {
        let concepts = analyze_concepts(&algebra_batch());
        assert_eq!(concepts.len(), 3);

        let factoring = &concepts[0];
        assert_eq!(factoring.concept, "Factoring");
        assert_eq!(factoring.total_problems, 2);
        assert_eq!(factoring.wrong_count, 2);
        assert_eq!(factoring.correct_rate, 0);
        assert_eq!(factoring.weakness_level, WeaknessLevel::Critical);
        assert_eq!(factoring.related_units, vec!["Algebra".to_string()]);
    }

    #[test]
    fn untagged_records_are_skipped() {
        let records = vec![
            attempt("1", "Math", "Algebra", None, false, None, 0),
            attempt("2", "Math", "Algebra", Some("Roots"), true, None, 1),
        ];
        let concepts = analyze_concepts(&records);
        assert_eq!(concepts.len(), 1);
        assert_eq!(concepts[0].total_problems, 1);
    }

    #[test]
    fn concepts_with_equal_rates_keep_first_seen_order() {
        let concepts = analyze_concepts(&algebra_batch());
        let names: Vec<&str> = concepts.iter().map(|c| c.concept.as_str()).collect();
        assert_eq!(names, vec!["Factoring", "Discriminant", "Linear"]);
        assert_eq!(concepts[1].correct_rate, concepts[2].correct_rate);
    }

    #[test]
    fn related_units_are_distinct() {
        let records = vec![
            attempt("1", "Math", "Algebra", Some("Ratio"), false, None, 0),
            attempt("2", "Math", "Geometry", Some("Ratio"), true, None, 1),
            attempt("3", "Math", "Algebra", Some("Ratio"), true, None, 2),
        ];
        let concepts = analyze_concepts(&records);
        assert_eq!(
            concepts[0].related_units,
            vec!["Algebra".to_string(), "Geometry".to_string()]
        );
        assert_eq!(concepts[0].correct_rate, 67);
    }
}
