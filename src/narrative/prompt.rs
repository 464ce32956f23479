use crate::narrative::NarrativeRequest;

/// Prompt asking the model for a two-field JSON object about the analysis.
pub fn build_prompt(request: &NarrativeRequest) -> String {
    let name = request
        .student_name
        .as_deref()
        .filter(|n| !n.trim().is_empty())
        .unwrap_or("학생");
    // Serializing plain data structs cannot fail; keep the prompt usable anyway
    let analysis = serde_json::to_string_pretty(request).unwrap_or_else(|_| "{}".to_string());

    format!(
        "당신은 학생의 학습 데이터를 분석하는 교육 전문가입니다.\n\
        아래는 {name}의 문제 풀이 기록을 분석한 결과입니다.\n\n\
        {analysis}\n\n\
        분석 결과를 바탕으로 다음 두 가지를 작성하세요.\n\
        1. summary: 현재 학습 상태와 주요 취약점을 3~4문장으로 요약\n\
        2. advice: 앞으로의 학습 방향에 대한 구체적인 조언 3~4문장\n\n\
        반드시 다음 JSON 형식으로만 응답하세요:\n\
        {{\"summary\": \"...\", \"advice\": \"...\"}}"
    )
}
