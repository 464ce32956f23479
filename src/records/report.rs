use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::records::attempt::{Difficulty, ErrorType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeaknessLevel {
    Critical,
    High,
    Medium,
    Low,
}

impl WeaknessLevel {
    /// Critical and high units/concepts get their own recommendations.
    pub fn needs_attention(&self) -> bool {
        matches!(self, WeaknessLevel::Critical | WeaknessLevel::High)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Improving,
    Declining,
    Stable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationType {
    ConceptStudy,
    PracticeProblems,
    ErrorPrevention,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    High,
    Medium,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeakUnit {
    pub unit: String,
    pub subject: String,
    pub total_problems: u32,
    pub wrong_count: u32,
    pub correct_rate: u32,
    pub weakness_level: WeaknessLevel,
    pub recent_trend: Trend,
    pub main_error_types: Vec<ErrorType>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeakConcept {
    pub concept: String,
    pub subject: String,
    pub related_units: Vec<String>,
    pub total_problems: u32,
    pub wrong_count: u32,
    pub correct_rate: u32,
    pub weakness_level: WeaknessLevel,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorPattern {
    pub id: String,
    pub error_type: ErrorType,
    pub description: String,
    pub frequency: u32,
    pub examples: Vec<String>,
    pub severity: Severity,
    pub recommendation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectStats {
    pub subject: String,
    pub total_problems: u32,
    pub correct_count: u32,
    pub correct_rate: u32,
    pub average_score: u32,
    pub weak_units: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DifficultyBucket {
    pub total: u32,
    pub correct: u32,
    pub rate: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DifficultyDistribution {
    pub easy: DifficultyBucket,
    pub medium: DifficultyBucket,
    pub hard: DifficultyBucket,
}

impl DifficultyDistribution {
    pub fn get_mut(&mut self, difficulty: Difficulty) -> &mut DifficultyBucket {
        match difficulty {
            Difficulty::Easy => &mut self.easy,
            Difficulty::Medium => &mut self.medium,
            Difficulty::Hard => &mut self.hard,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearningRecommendation {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: RecommendationType,
    pub priority: Priority,
    pub title: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_concept: Option<String>,
    /// Minutes.
    pub estimated_time: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
    pub total_problems: u32,
    pub total_correct: u32,
    pub total_wrong: u32,
    pub overall_correct_rate: u32,
    pub average_score: u32,
}

/// Where the `ai_summary` / `ai_advice` text of a report came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NarrativeSource {
    Generated,
    Fallback,
    NoData,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeaknessReport {
    pub student_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub student_name: Option<String>,
    pub analyzed_at: DateTime<Utc>,
    pub period_start: Option<DateTime<Utc>>,
    pub period_end: Option<DateTime<Utc>>,
    pub summary: ReportSummary,
    pub subject_stats: Vec<SubjectStats>,
    pub difficulty_distribution: DifficultyDistribution,
    pub weak_units: Vec<WeakUnit>,
    pub weak_concepts: Vec<WeakConcept>,
    pub error_patterns: Vec<ErrorPattern>,
    pub recommendations: Vec<LearningRecommendation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_advice: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub narrative_source: Option<NarrativeSource>,
}
