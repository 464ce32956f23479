use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// One JSON object per event
    #[default]
    Json,
    Text,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(LogFormat::Json),
            "text" | "pretty" => Ok(LogFormat::Text),
            other => Err(format!("unknown log format '{}'", other)),
        }
    }
}

/// Initialize structured logging with tracing.
///
/// Filtering follows `RUST_LOG` and defaults to `info`. Safe to call more than
/// once; only the first call installs a subscriber.
pub fn init_logging(format: LogFormat) {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let result = match format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_file(true)
                    .with_line_number(true)
                    .with_writer(std::io::stderr)
                    .json(),
            )
            .try_init(),
        LogFormat::Text => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .try_init(),
    };

    if result.is_ok() {
        tracing::debug!(format = ?format, "Structured logging initialized");
    }
}

/// Record one narrative generator call
pub fn log_narrative_call(model: &str, success: bool, latency_ms: u64) {
    tracing::info!(
        model = model,
        success = success,
        latency_ms = latency_ms,
        "Narrative call"
    );
}

/// Record that a report fell back to templated narrative text
pub fn log_fallback(student_id: &str, reason: &str) {
    tracing::warn!(
        student_id = student_id,
        reason = reason,
        "Narrative fallback triggered"
    );
}
