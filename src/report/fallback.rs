use crate::narrative::Narrative;
use crate::records::WeaknessReport;

/// Narrative used for a batch with no attempts at all
pub fn no_data_narrative() -> Narrative {
    Narrative {
        summary: "분석할 풀이 기록이 없습니다.".to_string(),
        advice: "문제를 풀고 채점 결과가 쌓이면 취약점 분석과 학습 추천을 제공해 드립니다.".to_string(),
    }
}

/// Deterministic summary and advice built from the computed report, used
/// whenever the generator cannot supply its own.
pub fn templated_narrative(report: &WeaknessReport) -> Narrative {
    let name = report
        .student_name
        .as_deref()
        .filter(|n| !n.trim().is_empty())
        .unwrap_or("학생");
    let s = &report.summary;

    let mut summary = format!(
        "{}은(는) 총 {}문제 중 {}문제를 맞혀 정답률 {}%, 평균 점수 {}점을 기록했습니다.",
        name, s.total_problems, s.total_correct, s.overall_correct_rate, s.average_score
    );

    let weak: Vec<&str> = report
        .weak_units
        .iter()
        .filter(|u| u.weakness_level.needs_attention())
        .take(3)
        .map(|u| u.unit.as_str())
        .collect();
    if weak.is_empty() {
        summary.push_str(" 뚜렷하게 취약한 단원은 없습니다.");
    } else {
        summary.push_str(&format!(" 보완이 필요한 단원은 {}입니다.", weak.join(", ")));
    }

    if let Some(pattern) = report.error_patterns.first() {
        summary.push_str(&format!(
            " 가장 많은 오답 유형은 '{}'({}%)입니다.",
            pattern.description, pattern.frequency
        ));
    }

    let advice = match (report.recommendations.first(), report.error_patterns.first()) {
        (Some(rec), Some(pattern)) => format!(
            "우선 '{}'부터 시작하세요. {}. 꾸준히 복습하면 정답률을 높일 수 있습니다.",
            rec.title, pattern.recommendation
        ),
        (Some(rec), None) => format!(
            "우선 '{}'부터 시작하세요. 꾸준히 복습하면 정답률을 높일 수 있습니다.",
            rec.title
        ),
        (None, Some(pattern)) => format!("{}.", pattern.recommendation),
        (None, None) => {
            "현재 학습 상태가 양호합니다. 지금의 학습 습관을 유지하며 난이도를 조금씩 높여 보세요."
                .to_string()
        }
    };

    Narrative { summary, advice }
}
