use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::records::{NarrativeSource, WeaknessReport};

/// Report-generation counters.
/// All counters are atomic; clones share the same values.
#[derive(Clone, Default)]
pub struct Metrics {
    pub reports_total: Arc<AtomicU64>,
    /// Reports whose narrative came from the generator
    pub narrative_generated: Arc<AtomicU64>,
    /// Reports that fell back to templated text
    pub narrative_fallback: Arc<AtomicU64>,
    /// Reports built from an empty batch
    pub empty_batches: Arc<AtomicU64>,
    /// Time spent producing reports in milliseconds (sum)
    pub report_latency_ms: Arc<AtomicU64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    pub reports_total: u64,
    pub narrative_generated: u64,
    pub narrative_fallback: u64,
    pub empty_batches: u64,
    pub report_latency_ms: u64,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count a finished report by where its narrative text came from
    pub fn record_report(&self, report: &WeaknessReport, latency_ms: u64) {
        self.reports_total.fetch_add(1, Ordering::Relaxed);
        self.report_latency_ms.fetch_add(latency_ms, Ordering::Relaxed);
        match report.narrative_source {
            Some(NarrativeSource::Generated) => {
                self.narrative_generated.fetch_add(1, Ordering::Relaxed);
            }
            Some(NarrativeSource::Fallback) => {
                self.narrative_fallback.fetch_add(1, Ordering::Relaxed);
            }
            Some(NarrativeSource::NoData) => {
                self.empty_batches.fetch_add(1, Ordering::Relaxed);
            }
            None => {}
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            reports_total: self.reports_total.load(Ordering::Relaxed),
            narrative_generated: self.narrative_generated.load(Ordering::Relaxed),
            narrative_fallback: self.narrative_fallback.load(Ordering::Relaxed),
            empty_batches: self.empty_batches.load(Ordering::Relaxed),
            report_latency_ms: self.report_latency_ms.load(Ordering::Relaxed),
        }
    }
}
