use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProblemType {
    MultipleChoice,
    ShortAnswer,
    Essay,
}

/// Why an answer was marked wrong.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorType {
    Calculation,
    Concept,
    Careless,
    Method,
    Incomplete,
    Time,
    Unknown,
}

impl ErrorType {
    /// Canonical category order. Error patterns are emitted in this order
    /// before sorting, so it doubles as the tie-break for equal frequencies.
    pub const ALL: [ErrorType; 7] = [
        ErrorType::Calculation,
        ErrorType::Concept,
        ErrorType::Careless,
        ErrorType::Method,
        ErrorType::Incomplete,
        ErrorType::Time,
        ErrorType::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorType::Calculation => "calculation",
            ErrorType::Concept => "concept",
            ErrorType::Careless => "careless",
            ErrorType::Method => "method",
            ErrorType::Incomplete => "incomplete",
            ErrorType::Time => "time",
            ErrorType::Unknown => "unknown",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ErrorType::Calculation => "계산 과정에서 실수가 발생했습니다",
            ErrorType::Concept => "관련 개념에 대한 이해가 부족합니다",
            ErrorType::Careless => "문제를 잘못 읽거나 부주의한 실수가 있었습니다",
            ErrorType::Method => "풀이 방법의 선택이 적절하지 않았습니다",
            ErrorType::Incomplete => "풀이를 끝까지 완성하지 못했습니다",
            ErrorType::Time => "시간이 부족하여 문제를 해결하지 못했습니다",
            ErrorType::Unknown => "원인이 분류되지 않은 오답입니다",
        }
    }

    pub fn remediation(&self) -> &'static str {
        match self {
            ErrorType::Calculation => "계산 과정을 단계별로 적고 마지막에 검산하는 습관을 들이세요",
            ErrorType::Concept => "교과서의 해당 개념을 다시 정리하고 기본 문제부터 차근차근 풀어보세요",
            ErrorType::Careless => "문제의 조건에 밑줄을 그으며 읽고 답을 제출하기 전에 한 번 더 확인하세요",
            ErrorType::Method => "유형별 대표 풀이 방법을 정리하고 여러 가지 접근법을 비교하며 연습하세요",
            ErrorType::Incomplete => "풀이 과정을 끝까지 서술하는 연습을 하고 문항별 시간 배분을 점검하세요",
            ErrorType::Time => "시간을 재며 문제를 푸는 연습으로 풀이 속도를 높이세요",
            ErrorType::Unknown => "오답 노트를 작성하며 틀린 원인을 스스로 분석해 보세요",
        }
    }
}

/// One graded problem attempt, as handed to the engine by the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptRecord {
    pub id: String,
    pub student_id: String,
    pub problem_id: String,
    pub subject: String,
    pub unit: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub concept: Option<String>,
    pub difficulty: Difficulty,
    pub is_correct: bool,
    #[serde(default)]
    pub student_answer: String,
    #[serde(default)]
    pub correct_answer: String,
    pub score: f64,
    pub max_score: f64,
    pub problem_type: ProblemType,
    /// Only meaningful when `is_correct` is false.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_type: Option<ErrorType>,
    pub graded_at: DateTime<Utc>,
}

impl AttemptRecord {
    /// Score as a fraction of the maximum. A non-positive maximum counts as 0.
    pub fn score_ratio(&self) -> f64 {
        if self.max_score > 0.0 {
            self.score / self.max_score
        } else {
            0.0
        }
    }

    /// Error category of a wrong answer, `Unknown` when the grader left it blank.
    /// Returns `None` for correct answers.
    pub fn wrong_category(&self) -> Option<ErrorType> {
        if self.is_correct {
            None
        } else {
            Some(self.error_type.unwrap_or(ErrorType::Unknown))
        }
    }
}
