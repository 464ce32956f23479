//! Boundary to the external narrative generator.
//!
//! The engine hands over its own computed structure and expects two free-text
//! fields back. Everything that can go wrong here ends in a
//! [`NarrativeOutcome::Fallback`]; nothing is surfaced to the report caller.

pub mod breaker;
pub mod extract;
pub mod ollama;
pub mod prompt;

use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::EngineError;
use crate::records::{ErrorPattern, ReportSummary, SubjectStats, WeakConcept, WeakUnit};

pub const MAX_REQUEST_UNITS: usize = 5;
pub const MAX_REQUEST_CONCEPTS: usize = 5;
pub const MAX_REQUEST_PATTERNS: usize = 3;

/// Structured payload sent to the generator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NarrativeRequest {
    pub student_name: Option<String>,
    pub summary: ReportSummary,
    pub weak_units: Vec<WeakUnit>,
    pub weak_concepts: Vec<WeakConcept>,
    pub error_patterns: Vec<ErrorPattern>,
    pub subject_stats: Vec<SubjectStats>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Narrative {
    pub summary: String,
    pub advice: String,
}

#[derive(Debug, Clone, Error)]
pub enum NarrativeError {
    #[error("narrative generator is unavailable")]
    Unavailable,
    #[error("narrative generator timed out after {}ms", .0.as_millis())]
    Timeout(Duration),
    #[error("narrative generator failed: {0}")]
    Generator(#[from] EngineError),
    #[error("narrative response could not be parsed: {0}")]
    Unparsable(String),
    #[error("narrative field '{0}' is empty")]
    EmptyField(&'static str),
    #[error("narrative request was cancelled")]
    Cancelled,
}

/// Result of the narrative step: either the generator's text or the
/// templated replacement together with the reason it was needed.
#[derive(Debug, Clone)]
pub enum NarrativeOutcome {
    Generated(Narrative),
    Fallback {
        narrative: Narrative,
        reason: NarrativeError,
    },
}

impl NarrativeOutcome {
    pub fn narrative(&self) -> &Narrative {
        match self {
            NarrativeOutcome::Generated(n) => n,
            NarrativeOutcome::Fallback { narrative, .. } => narrative,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, NarrativeOutcome::Fallback { .. })
    }
}

/// External prose generator. Returns the raw response text; extraction and
/// validation happen on the engine side.
pub trait NarrativeGenerator: Send + Sync {
    fn name(&self) -> &str;

    /// A generator may report itself unavailable (e.g. open circuit) so the
    /// engine can skip the request entirely.
    fn is_available(&self) -> bool {
        true
    }

    fn generate(
        &self,
        request: &NarrativeRequest,
    ) -> impl Future<Output = Result<String, EngineError>> + Send;
}

/// Stand-in for "no generator configured". Always unavailable.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoNarrative;

impl NarrativeGenerator for NoNarrative {
    fn name(&self) -> &str {
        "none"
    }

    fn is_available(&self) -> bool {
        false
    }

    async fn generate(&self, _request: &NarrativeRequest) -> Result<String, EngineError> {
        Err(EngineError::new("no narrative generator configured", "narrative"))
    }
}

#[derive(Deserialize)]
struct RawNarrative {
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    advice: Option<String>,
}

/// Pull `{summary, advice}` out of a response that may wrap the JSON in prose
/// or code fences. Both fields must be present and non-blank.
pub fn parse_narrative(raw: &str) -> Result<Narrative, NarrativeError> {
    let json = extract::extract_json(raw).map_err(|e| NarrativeError::Unparsable(e.to_string()))?;
    let parsed: RawNarrative =
        serde_json::from_str(&json).map_err(|e| NarrativeError::Unparsable(e.to_string()))?;

    let summary = parsed
        .summary
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or(NarrativeError::EmptyField("summary"))?;
    let advice = parsed
        .advice
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or(NarrativeError::EmptyField("advice"))?;

    Ok(Narrative { summary, advice })
}
