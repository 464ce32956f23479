//! Caller-side policy for producing reports for many students.
//!
//! Jobs run in chunks of `width` concurrent tasks with a pause between
//! chunks, so a local narrative model is not flooded. Results come back in
//! job order regardless of completion order.

use std::sync::Arc;
use std::time::Instant;

use tokio::task::JoinSet;

use crate::analysis::group_ordered;
use crate::config::BatchConfig;
use crate::metrics::Metrics;
use crate::narrative::NarrativeGenerator;
use crate::records::{AttemptRecord, NarrativeSource, WeaknessReport};
use crate::report::{build_report, fallback, ReportEngine, ReportOptions};

/// One report to produce
#[derive(Debug, Clone)]
pub struct ReportJob {
    pub records: Vec<AttemptRecord>,
    pub options: ReportOptions,
}

/// One job per student id, in first-seen order
pub fn split_by_student(records: &[AttemptRecord], with_narrative: bool) -> Vec<ReportJob> {
    group_ordered(records, |r| Some(r.student_id.as_str()))
        .into_iter()
        .map(|(student_id, group)| ReportJob {
            records: group.into_iter().cloned().collect(),
            options: ReportOptions {
                student_id: Some(student_id.to_string()),
                with_narrative,
                ..ReportOptions::default()
            },
        })
        .collect()
}

/// Report for a job whose task died before finishing. Analysis is pure, so
/// this recomputes it without the narrative step.
fn recover(job: &ReportJob) -> WeaknessReport {
    let mut report = build_report(&job.records, &job.options);
    if job.options.with_narrative && !job.records.is_empty() {
        let narrative = fallback::templated_narrative(&report);
        report.ai_summary = Some(narrative.summary);
        report.ai_advice = Some(narrative.advice);
        report.narrative_source = Some(NarrativeSource::Fallback);
    }
    report
}

pub async fn generate_reports<G>(
    engine: Arc<ReportEngine<G>>,
    jobs: Vec<ReportJob>,
    config: &BatchConfig,
    metrics: &Metrics,
) -> Vec<WeaknessReport>
where
    G: NarrativeGenerator + 'static,
{
    let width = config.width.max(1);
    let jobs: Arc<Vec<ReportJob>> = Arc::new(jobs);
    let mut slots: Vec<Option<WeaknessReport>> = vec![None; jobs.len()];
    let chunks = jobs.len().div_ceil(width);

    tracing::info!(
        jobs = jobs.len(),
        width = width,
        chunks = chunks,
        "Starting report batch"
    );

    for chunk in 0..chunks {
        if chunk > 0 && !config.delay().is_zero() {
            tokio::time::sleep(config.delay()).await;
        }

        let start = chunk * width;
        let end = (start + width).min(jobs.len());
        let mut join_set = JoinSet::new();

        for index in start..end {
            let engine = engine.clone();
            let jobs = jobs.clone();
            join_set.spawn(async move {
                let started = Instant::now();
                let job = &jobs[index];
                let report = engine.generate_report(&job.records, &job.options).await;
                (index, report, started.elapsed().as_millis() as u64)
            });
        }

        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((index, report, latency_ms)) => {
                    metrics.record_report(&report, latency_ms);
                    slots[index] = Some(report);
                }
                Err(e) => {
                    tracing::error!(error = %e, chunk = chunk, "Report task failed");
                }
            }
        }

        tracing::debug!(chunk = chunk, done = end, "Report chunk finished");
    }

    slots
        .into_iter()
        .enumerate()
        .map(|(index, slot)| {
            slot.unwrap_or_else(|| {
                let report = recover(&jobs[index]);
                metrics.record_report(&report, 0);
                report
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::fixtures::attempt;
    use crate::config::NarrativeConfig;
    use crate::error::EngineError;
    use crate::narrative::NarrativeRequest;
    use crate::records::ErrorType;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Replies slower for earlier students so completion order is reversed.
    struct Staggered {
        in_flight: Arc<AtomicUsize>,
        peak: Arc<AtomicUsize>,
    }

    impl NarrativeGenerator for Staggered {
        fn name(&self) -> &str {
            "staggered"
        }

        async fn generate(&self, request: &NarrativeRequest) -> Result<String, EngineError> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            let total = request.summary.total_problems as u64;
            tokio::time::sleep(Duration::from_millis(60 / total.max(1))).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            Ok(format!(
                r#"{{"summary": "{} problems", "advice": "keep going"}}"#,
                total
            ))
        }
    }

    fn records_for(student: &str, count: usize) -> Vec<AttemptRecord> {
        (0..count)
            .map(|i| {
                let mut r = attempt(
                    &format!("{}-{}", student, i),
                    "Math",
                    "Algebra",
                    None,
                    i % 2 == 0,
                    Some(ErrorType::Calculation),
                    i as i64,
                );
                r.student_id = student.to_string();
                r
            })
            .collect()
    }

    #[test]
    fn splits_by_student_in_first_seen_order() {
        let mut records = records_for("b", 2);
        records.extend(records_for("a", 1));
        records.extend(records_for("b", 1));

        let jobs = split_by_student(&records, true);
        assert_eq!(jobs.len(), 2);
        assert_eq!(jobs[0].options.student_id.as_deref(), Some("b"));
        assert_eq!(jobs[0].records.len(), 3);
        assert_eq!(jobs[1].options.student_id.as_deref(), Some("a"));
        assert!(jobs[1].options.with_narrative);
    }

    #[tokio::test]
    async fn keeps_input_order_and_width() {
        let in_flight = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let generator = Staggered {
            in_flight: in_flight.clone(),
            peak: peak.clone(),
        };
        let engine = Arc::new(ReportEngine::new(generator, &NarrativeConfig::default()));

        let mut records = Vec::new();
        for (i, student) in ["s1", "s2", "s3", "s4", "s5"].iter().enumerate() {
            records.extend(records_for(student, i + 1));
        }
        let jobs = split_by_student(&records, true);
        let config = BatchConfig {
            width: 2,
            delay_ms: 5,
        };
        let metrics = Metrics::new();

        let reports = generate_reports(engine, jobs, &config, &metrics).await;

        let ids: Vec<&str> = reports.iter().map(|r| r.student_id.as_str()).collect();
        assert_eq!(ids, vec!["s1", "s2", "s3", "s4", "s5"]);
        assert_eq!(reports[2].summary.total_problems, 3);
        assert_eq!(reports[2].ai_summary.as_deref(), Some("3 problems"));
        assert!(peak.load(Ordering::SeqCst) <= 2);
        assert_eq!(in_flight.load(Ordering::SeqCst), 0);

        let snap = metrics.snapshot();
        assert_eq!(snap.reports_total, 5);
        assert_eq!(snap.narrative_generated, 5);
    }

    #[tokio::test]
    async fn empty_job_list_returns_nothing() {
        let engine = Arc::new(ReportEngine::offline());
        let reports =
            generate_reports(engine, Vec::new(), &BatchConfig::default(), &Metrics::new()).await;
        assert!(reports.is_empty());
    }

    #[test]
    fn recovered_report_uses_template_text() {
        let job = ReportJob {
            records: records_for("s1", 3),
            options: ReportOptions {
                with_narrative: true,
                ..ReportOptions::default()
            },
        };
        let report = recover(&job);
        assert_eq!(report.narrative_source, Some(NarrativeSource::Fallback));
        assert_eq!(report.summary.total_problems, 3);
    }
}
