use std::collections::HashSet;

use crate::records::{
    ErrorPattern, ErrorType, LearningRecommendation, Priority, RecommendationType, Severity,
    WeakConcept, WeakUnit, WeaknessLevel,
};

const MAX_CONCEPT_RECOMMENDATIONS: usize = 3;
const MAX_UNIT_RECOMMENDATIONS: usize = 3;
const MAX_PATTERN_RECOMMENDATIONS: usize = 2;

const CONCEPT_STUDY_MINUTES: u32 = 60;
const PRACTICE_MINUTES: u32 = 45;
const PATTERN_MINUTES: u32 = 30;

fn priority_for(level: WeaknessLevel) -> Priority {
    if level == WeaknessLevel::Critical {
        Priority::High
    } else {
        Priority::Medium
    }
}

/// Build the action list from the analyzer outputs.
///
/// Emission order is weak concepts, then weak units, then high-severity error
/// patterns. Deduplication keeps the first recommendation per
/// (type, target unit, target concept), so this order decides which survives.
pub fn synthesize_recommendations(
    units: &[WeakUnit],
    concepts: &[WeakConcept],
    patterns: &[ErrorPattern],
) -> Vec<LearningRecommendation> {
    let mut emitted: Vec<LearningRecommendation> = Vec::new();

    for concept in concepts
        .iter()
        .filter(|c| c.weakness_level.needs_attention())
        .take(MAX_CONCEPT_RECOMMENDATIONS)
    {
        emitted.push(LearningRecommendation {
            id: String::new(),
            kind: RecommendationType::ConceptStudy,
            priority: priority_for(concept.weakness_level),
            title: format!("{} 개념 학습", concept.concept),
            description: format!(
                "{} 과목 '{}' 개념의 정답률이 {}%입니다. 개념을 다시 정리하고 기본 문제부터 풀어보세요.",
                concept.subject, concept.concept, concept.correct_rate
            ),
            target_unit: None,
            target_concept: Some(concept.concept.clone()),
            estimated_time: CONCEPT_STUDY_MINUTES,
        });
    }

    for unit in units
        .iter()
        .filter(|u| u.weakness_level.needs_attention())
        .take(MAX_UNIT_RECOMMENDATIONS)
    {
        emitted.push(LearningRecommendation {
            id: String::new(),
            kind: RecommendationType::PracticeProblems,
            priority: priority_for(unit.weakness_level),
            title: format!("{} 단원 문제 풀이", unit.unit),
            description: format!(
                "{} 과목 '{}' 단원에서 {}문제 중 {}문제를 틀렸습니다. 유사 문제로 반복 연습하세요.",
                unit.subject, unit.unit, unit.total_problems, unit.wrong_count
            ),
            target_unit: Some(unit.unit.clone()),
            target_concept: None,
            estimated_time: PRACTICE_MINUTES,
        });
    }

    for pattern in patterns
        .iter()
        .filter(|p| p.severity == Severity::High)
        .take(MAX_PATTERN_RECOMMENDATIONS)
    {
        let (kind, title) = match pattern.error_type {
            ErrorType::Concept => (RecommendationType::ConceptStudy, "개념 재학습"),
            ErrorType::Method => (RecommendationType::PracticeProblems, "풀이 방법 연습"),
            _ => (RecommendationType::ErrorPrevention, "실수 방지 훈련"),
        };
        emitted.push(LearningRecommendation {
            id: String::new(),
            kind,
            priority: Priority::High,
            title: title.to_string(),
            description: pattern.recommendation.clone(),
            target_unit: None,
            target_concept: None,
            estimated_time: PATTERN_MINUTES,
        });
    }

    let mut recommendations = deduplicate(emitted);
    for (i, rec) in recommendations.iter_mut().enumerate() {
        rec.id = format!("rec-{}", i + 1);
    }
    recommendations
}

/// Keep the first recommendation for each (type, target unit, target concept).
/// A missing target and an empty target are the same key.
pub fn deduplicate(recommendations: Vec<LearningRecommendation>) -> Vec<LearningRecommendation> {
    let mut seen: HashSet<(RecommendationType, String, String)> = HashSet::new();
    recommendations
        .into_iter()
        .filter(|rec| {
            seen.insert((
                rec.kind,
                rec.target_unit.clone().unwrap_or_default(),
                rec.target_concept.clone().unwrap_or_default(),
            ))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::fixtures::{algebra_batch, attempt};
    use crate::analysis::{analyze_concepts, analyze_error_patterns, analyze_units};

    fn synthesize(records: &[crate::records::AttemptRecord]) -> Vec<LearningRecommendation> {
        synthesize_recommendations(
            &analyze_units(records),
            &analyze_concepts(records),
            &analyze_error_patterns(records),
        )
    }

    fn bare(kind: RecommendationType, unit: Option<&str>, concept: Option<&str>) -> LearningRecommendation {
        LearningRecommendation {
            id: String::new(),
            kind,
            priority: Priority::High,
            title: "t".to_string(),
            description: "d".to_string(),
            target_unit: unit.map(str::to_string),
            target_concept: concept.map(str::to_string),
            estimated_time: 30,
        }
    }

    #[test]
    fn algebra_batch_yields_four_recommendations() {
        let recs = synthesize(&algebra_batch());
        assert_eq!(recs.len(), 4);

        assert_eq!(recs[0].kind, RecommendationType::ConceptStudy);
        assert_eq!(recs[0].target_concept.as_deref(), Some("Factoring"));
        assert_eq!(recs[0].priority, Priority::High);
        assert_eq!(recs[0].estimated_time, 60);

        assert_eq!(recs[1].kind, RecommendationType::PracticeProblems);
        assert_eq!(recs[1].target_unit.as_deref(), Some("Algebra"));
        assert_eq!(recs[1].priority, Priority::High);
        assert_eq!(recs[1].estimated_time, 45);

        assert_eq!(recs[2].kind, RecommendationType::ErrorPrevention);
        assert_eq!(recs[2].title, "실수 방지 훈련");
        assert_eq!(recs[2].description, ErrorType::Calculation.remediation());

        // Not merged with recs[0]: its target concept is empty
        assert_eq!(recs[3].kind, RecommendationType::ConceptStudy);
        assert_eq!(recs[3].title, "개념 재학습");
        assert!(recs[3].target_concept.is_none());
        assert!(recs[3].target_unit.is_none());
        assert_eq!(recs[3].estimated_time, 30);

        let ids: Vec<&str> = recs.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["rec-1", "rec-2", "rec-3", "rec-4"]);
    }

    #[test]
    fn identical_targets_collapse_to_first() {
        let recs = deduplicate(vec![
            bare(RecommendationType::ConceptStudy, None, Some("Ratio")),
            bare(RecommendationType::ConceptStudy, None, Some("Ratio")),
            bare(RecommendationType::ConceptStudy, Some(""), Some("Ratio")),
        ]);
        assert_eq!(recs.len(), 1);
    }

    #[test]
    fn differing_keys_survive() {
        let recs = deduplicate(vec![
            bare(RecommendationType::ConceptStudy, None, Some("Ratio")),
            bare(RecommendationType::PracticeProblems, None, Some("Ratio")),
            bare(RecommendationType::ConceptStudy, Some("Algebra"), Some("Ratio")),
            bare(RecommendationType::ConceptStudy, None, Some("Roots")),
        ]);
        assert_eq!(recs.len(), 4);
    }

    #[test]
    fn same_concept_in_two_subjects_is_recommended_once() {
        let records = vec![
            attempt("1", "Math", "Algebra", Some("Ratio"), false, Some(ErrorType::Time), 0),
            attempt("2", "Science", "Mixtures", Some("Ratio"), false, Some(ErrorType::Time), 1),
        ];
        let concept_recs: Vec<_> = synthesize(&records)
            .into_iter()
            .filter(|r| r.kind == RecommendationType::ConceptStudy)
            .collect();
        assert_eq!(concept_recs.len(), 1);
        assert!(concept_recs[0].description.contains("Math"));
    }

    #[test]
    fn high_level_gets_medium_priority_and_lists_are_capped() {
        let mut records = Vec::new();
        // Five units at 50% (high), each with a distinct concept
        for unit in 0..5 {
            let unit_name = format!("U{}", unit);
            let concept_name = format!("C{}", unit);
            records.push(attempt(&format!("{}a", unit), "Math", &unit_name, Some(concept_name.as_str()), true, None, unit * 2));
            records.push(attempt(&format!("{}b", unit), "Math", &unit_name, Some(concept_name.as_str()), false, Some(ErrorType::Method), unit * 2 + 1));
        }
        let recs = synthesize(&records);

        let concept_recs = recs.iter().filter(|r| r.kind == RecommendationType::ConceptStudy).count();
        assert_eq!(concept_recs, 3);
        assert!(recs
            .iter()
            .filter(|r| r.target_unit.is_some() || r.target_concept.is_some())
            .all(|r| r.priority == Priority::Medium));

        // 3 unit practice recs + one method-pattern practice rec without target
        let practice: Vec<_> = recs
            .iter()
            .filter(|r| r.kind == RecommendationType::PracticeProblems)
            .collect();
        assert_eq!(practice.len(), 4);
        assert_eq!(practice[3].title, "풀이 방법 연습");
    }

    #[test]
    fn medium_level_is_not_recommended() {
        // 3 of 4 correct: 75%, medium for both the unit and the concept
        let records = vec![
            attempt("1", "Math", "Algebra", Some("Roots"), true, None, 0),
            attempt("2", "Math", "Algebra", Some("Roots"), true, None, 1),
            attempt("3", "Math", "Algebra", Some("Roots"), true, None, 2),
            attempt("4", "Math", "Algebra", Some("Roots"), false, Some(ErrorType::Careless), 3),
        ];
        let units = analyze_units(&records);
        assert_eq!(units[0].weakness_level, WeaknessLevel::Medium);

        let recs = synthesize(&records);
        // Only the careless pattern (100% of wrong answers) remains
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].kind, RecommendationType::ErrorPrevention);
        assert!(recs[0].target_unit.is_none());
        assert!(recs[0].target_concept.is_none());
    }

    #[test]
    fn nothing_weak_means_no_recommendations() {
        let records = vec![
            attempt("1", "Math", "Algebra", Some("Roots"), true, None, 0),
            attempt("2", "Math", "Algebra", Some("Roots"), true, None, 1),
        ];
        assert!(synthesize(&records).is_empty());
    }
}
