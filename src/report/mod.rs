pub mod fallback;

use std::future::Future;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::analysis::{
    analyze_concepts, analyze_difficulty, analyze_error_patterns, analyze_subjects, analyze_units,
    average_score, correct_rate, synthesize_recommendations,
};
use crate::config::NarrativeConfig;
use crate::logging::log_fallback;
use crate::narrative::{
    parse_narrative, NarrativeError, NarrativeGenerator, NarrativeOutcome, NarrativeRequest,
    NoNarrative, MAX_REQUEST_CONCEPTS, MAX_REQUEST_PATTERNS, MAX_REQUEST_UNITS,
};
use crate::perf::PerfTimer;
use crate::records::{
    AttemptRecord, DifficultyDistribution, NarrativeSource, ReportSummary, WeaknessReport,
};

/// Per-report inputs besides the records themselves.
#[derive(Debug, Clone, Default)]
pub struct ReportOptions {
    /// Defaults to the student id of the first record
    pub student_id: Option<String>,
    pub student_name: Option<String>,
    /// Explicit bounds win over the min/max grading time of the batch
    pub period_start: Option<DateTime<Utc>>,
    pub period_end: Option<DateTime<Utc>>,
    pub with_narrative: bool,
    /// Defaults to now
    pub analyzed_at: Option<DateTime<Utc>>,
}

fn summarize(records: &[AttemptRecord]) -> ReportSummary {
    let total = records.len() as u32;
    let correct = records.iter().filter(|r| r.is_correct).count() as u32;
    let all: Vec<&AttemptRecord> = records.iter().collect();
    ReportSummary {
        total_problems: total,
        total_correct: correct,
        total_wrong: total - correct,
        overall_correct_rate: correct_rate(correct, total),
        average_score: average_score(&all),
    }
}

/// Run every analysis pass over the batch and assemble the report.
///
/// Pure apart from reading the clock when `analyzed_at` is not given. The
/// narrative fields are only filled for an empty batch (with the fixed
/// "no data" text); use [`ReportEngine`] for generated narrative.
pub fn build_report(records: &[AttemptRecord], options: &ReportOptions) -> WeaknessReport {
    let _perf = PerfTimer::new("build_report");

    let student_id = options
        .student_id
        .clone()
        .or_else(|| records.first().map(|r| r.student_id.clone()))
        .unwrap_or_default();
    let analyzed_at = options.analyzed_at.unwrap_or_else(Utc::now);

    if records.is_empty() {
        tracing::info!(student_id = %student_id, "Empty batch, returning no-data report");
        let narrative = fallback::no_data_narrative();
        return WeaknessReport {
            student_id,
            student_name: options.student_name.clone(),
            analyzed_at,
            period_start: options.period_start,
            period_end: options.period_end,
            summary: ReportSummary::default(),
            subject_stats: Vec::new(),
            difficulty_distribution: DifficultyDistribution::default(),
            weak_units: Vec::new(),
            weak_concepts: Vec::new(),
            error_patterns: Vec::new(),
            recommendations: Vec::new(),
            ai_summary: Some(narrative.summary),
            ai_advice: Some(narrative.advice),
            narrative_source: Some(NarrativeSource::NoData),
        };
    }

    // Independent passes
    let weak_units = analyze_units(records);
    let weak_concepts = analyze_concepts(records);
    let error_patterns = analyze_error_patterns(records);
    let subject_stats = analyze_subjects(records);
    let difficulty_distribution = analyze_difficulty(records);

    let recommendations = synthesize_recommendations(&weak_units, &weak_concepts, &error_patterns);

    let period_start = options
        .period_start
        .or_else(|| records.iter().map(|r| r.graded_at).min());
    let period_end = options
        .period_end
        .or_else(|| records.iter().map(|r| r.graded_at).max());

    let summary = summarize(records);

    tracing::info!(
        student_id = %student_id,
        total_problems = summary.total_problems,
        correct_rate = summary.overall_correct_rate,
        weak_units = weak_units.iter().filter(|u| u.weakness_level.needs_attention()).count(),
        error_patterns = error_patterns.len(),
        recommendations = recommendations.len(),
        "Weakness report built"
    );

    WeaknessReport {
        student_id,
        student_name: options.student_name.clone(),
        analyzed_at,
        period_start,
        period_end,
        summary,
        subject_stats,
        difficulty_distribution,
        weak_units,
        weak_concepts,
        error_patterns,
        recommendations,
        ai_summary: None,
        ai_advice: None,
        narrative_source: None,
    }
}

/// Payload for the generator: the top slices of the computed analysis.
pub fn narrative_request(report: &WeaknessReport) -> NarrativeRequest {
    NarrativeRequest {
        student_name: report.student_name.clone(),
        summary: report.summary,
        weak_units: report.weak_units.iter().take(MAX_REQUEST_UNITS).cloned().collect(),
        weak_concepts: report
            .weak_concepts
            .iter()
            .take(MAX_REQUEST_CONCEPTS)
            .cloned()
            .collect(),
        error_patterns: report
            .error_patterns
            .iter()
            .take(MAX_REQUEST_PATTERNS)
            .cloned()
            .collect(),
        subject_stats: report.subject_stats.clone(),
    }
}

/// Write the outcome into the report's narrative fields
pub fn apply_narrative(report: &mut WeaknessReport, outcome: NarrativeOutcome) {
    let source = if outcome.is_fallback() {
        NarrativeSource::Fallback
    } else {
        NarrativeSource::Generated
    };
    let narrative = outcome.narrative();
    report.ai_summary = Some(narrative.summary.clone());
    report.ai_advice = Some(narrative.advice.clone());
    report.narrative_source = Some(source);
}

/// Report assembler with an optional narrative generator.
///
/// The generator is an explicit dependency; the engine itself keeps no state
/// between reports.
pub struct ReportEngine<G> {
    generator: Option<G>,
    timeout: Duration,
}

impl ReportEngine<NoNarrative> {
    /// Engine without a generator: narrative requests always fall back
    pub fn offline() -> Self {
        ReportEngine {
            generator: None,
            timeout: NarrativeConfig::default().timeout(),
        }
    }
}

impl<G: NarrativeGenerator> ReportEngine<G> {
    pub fn new(generator: G, config: &NarrativeConfig) -> Self {
        ReportEngine {
            generator: Some(generator),
            timeout: config.timeout(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn generator(&self) -> Option<&G> {
        self.generator.as_ref()
    }

    pub async fn generate_report(
        &self,
        records: &[AttemptRecord],
        options: &ReportOptions,
    ) -> WeaknessReport {
        self.generate_report_until(records, options, std::future::pending::<()>())
            .await
    }

    /// Like [`generate_report`](Self::generate_report), but the narrative step
    /// gives up as soon as `cancelled` resolves. The computed report is still
    /// returned, with templated narrative text.
    pub async fn generate_report_until<C>(
        &self,
        records: &[AttemptRecord],
        options: &ReportOptions,
        cancelled: C,
    ) -> WeaknessReport
    where
        C: Future<Output = ()>,
    {
        let mut report = build_report(records, options);
        // Empty batches already carry the no-data text and never reach the generator
        if records.is_empty() || !options.with_narrative {
            return report;
        }

        let outcome = self.narrate(&report, cancelled).await;
        apply_narrative(&mut report, outcome);
        report
    }

    /// Request narrative text for an assembled report. Never fails: any problem
    /// yields [`NarrativeOutcome::Fallback`] carrying the reason.
    pub async fn narrate<C>(&self, report: &WeaknessReport, cancelled: C) -> NarrativeOutcome
    where
        C: Future<Output = ()>,
    {
        let _perf = PerfTimer::new("narrate");

        let result = match self.generator.as_ref().filter(|g| g.is_available()) {
            None => Err(NarrativeError::Unavailable),
            Some(generator) => {
                let request = narrative_request(report);
                let call = tokio::time::timeout(self.timeout, generator.generate(&request));
                tokio::select! {
                    outcome = call => match outcome {
                        Ok(Ok(raw)) => parse_narrative(&raw),
                        Ok(Err(e)) => Err(NarrativeError::Generator(e)),
                        Err(_) => Err(NarrativeError::Timeout(self.timeout)),
                    },
                    _ = cancelled => Err(NarrativeError::Cancelled),
                }
            }
        };

        match result {
            Ok(narrative) => {
                tracing::debug!(student_id = %report.student_id, "Narrative generated");
                NarrativeOutcome::Generated(narrative)
            }
            Err(reason) => {
                log_fallback(&report.student_id, &reason.to_string());
                NarrativeOutcome::Fallback {
                    narrative: fallback::templated_narrative(report),
                    reason,
                }
            }
        }
    }
}
