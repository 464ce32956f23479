pub mod attempt;
pub mod filter;
pub mod report;

pub use attempt::{AttemptRecord, Difficulty, ErrorType, ProblemType};
pub use filter::RecordFilter;
pub use report::{
    DifficultyBucket, DifficultyDistribution, ErrorPattern, LearningRecommendation,
    NarrativeSource, Priority, RecommendationType, ReportSummary, Severity, SubjectStats, Trend,
    WeakConcept, WeakUnit, WeaknessLevel, WeaknessReport,
};
