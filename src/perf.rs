/// Stage timing for report generation
use std::time::Instant;

/// Logs the elapsed time of a stage at debug level when dropped
pub struct PerfTimer {
    label: &'static str,
    start: Instant,
}

impl PerfTimer {
    pub fn new(label: &'static str) -> Self {
        Self {
            label,
            start: Instant::now(),
        }
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }
}

impl Drop for PerfTimer {
    fn drop(&mut self) {
        tracing::debug!(stage = self.label, duration_ms = self.elapsed_ms(), "Stage finished");
    }
}
