use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use chrono::{DateTime, NaiveDate, Utc};
use clap::{Parser, Subcommand};

use weakscope_lib::batch::{generate_reports, split_by_student};
use weakscope_lib::config::{get_engine_config, EngineConfig};
use weakscope_lib::logging::{init_logging, LogFormat};
use weakscope_lib::metrics::Metrics;
use weakscope_lib::narrative::ollama::OllamaNarrator;
use weakscope_lib::narrative::NarrativeGenerator;
use weakscope_lib::records::{AttemptRecord, RecordFilter};
use weakscope_lib::report::{ReportEngine, ReportOptions};

#[derive(Parser)]
#[command(name = "weakscope")]
#[command(about = "Weakness analysis and study recommendations from graded attempts", long_about = None)]
struct Cli {
    /// Engine config file (defaults to the platform data directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[arg(long, global = true, default_value = "json")]
    log_format: LogFormat,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build one report from a JSON array of attempt records
    Analyze {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        student_id: Option<String>,
        #[arg(long)]
        student_name: Option<String>,
        /// Repeat to keep several subjects
        #[arg(long = "subject")]
        subjects: Vec<String>,
        /// RFC 3339 timestamp or YYYY-MM-DD
        #[arg(long, value_parser = parse_date)]
        since: Option<DateTime<Utc>>,
        #[arg(long, value_parser = parse_date)]
        until: Option<DateTime<Utc>>,
        /// Ask the narrative model for summary and advice text
        #[arg(long)]
        narrative: bool,
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Build one report per student found in the input
    Batch {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        narrative: bool,
        /// Write `<student id>.json` files here instead of printing
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },
}

fn parse_date(value: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Ok(ts.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
        .ok_or_else(|| format!("invalid date '{}', expected RFC 3339 or YYYY-MM-DD", value))
}

/// File name for a student's report. Anything outside `[A-Za-z0-9_-]` becomes
/// `_`, so an id cannot point outside the output directory.
fn report_file_name(student_id: &str) -> String {
    let stem: String = student_id
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    if stem.is_empty() {
        "unknown.json".to_string()
    } else {
        format!("{}.json", stem)
    }
}

async fn load_records(path: &Path) -> anyhow::Result<Vec<AttemptRecord>> {
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;
    let records: Vec<AttemptRecord> = serde_json::from_str(&content)
        .with_context(|| format!("{} is not a JSON array of attempt records", path.display()))?;
    tracing::info!(path = %path.display(), records = records.len(), "Loaded attempt records");
    Ok(records)
}

async fn write_json<T: serde::Serialize>(value: &T, output: Option<&Path>) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(value).context("failed to serialize report")?;
    match output {
        Some(path) => tokio::fs::write(path, json)
            .await
            .with_context(|| format!("failed to write {}", path.display())),
        None => {
            println!("{}", json);
            Ok(())
        }
    }
}

async fn run<G>(engine: ReportEngine<G>, command: Commands, config: &EngineConfig) -> anyhow::Result<()>
where
    G: NarrativeGenerator + 'static,
{
    match command {
        Commands::Analyze {
            input,
            student_id,
            student_name,
            subjects,
            since,
            until,
            narrative,
            output,
        } => {
            let records = load_records(&input).await?;
            let filter = RecordFilter {
                student_id: student_id.clone(),
                subjects,
                since,
                until,
            };
            let records = filter.apply(&records);
            let options = ReportOptions {
                student_id,
                student_name,
                period_start: since,
                period_end: until,
                with_narrative: narrative || config.narrative.enabled,
                analyzed_at: None,
            };

            let report = engine
                .generate_report_until(&records, &options, async {
                    let _ = tokio::signal::ctrl_c().await;
                })
                .await;
            write_json(&report, output.as_deref()).await?;
        }
        Commands::Batch {
            input,
            narrative,
            output_dir,
        } => {
            let records = load_records(&input).await?;
            let jobs = split_by_student(&records, narrative || config.narrative.enabled);
            let metrics = Metrics::new();
            let reports = generate_reports(Arc::new(engine), jobs, &config.batch, &metrics).await;

            match output_dir {
                Some(dir) => {
                    tokio::fs::create_dir_all(&dir)
                        .await
                        .with_context(|| format!("failed to create {}", dir.display()))?;
                    for report in &reports {
                        let path = dir.join(report_file_name(&report.student_id));
                        write_json(report, Some(&path)).await?;
                    }
                }
                None => write_json(&reports, None).await?,
            }

            let snapshot = metrics.snapshot();
            tracing::info!(
                reports = snapshot.reports_total,
                generated = snapshot.narrative_generated,
                fallback = snapshot.narrative_fallback,
                empty = snapshot.empty_batches,
                latency_ms = snapshot.report_latency_ms,
                "Batch finished"
            );
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_format);

    let config = match cli.config.as_deref() {
        Some(path) => EngineConfig::load_from(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => get_engine_config().clone(),
    };

    let wants_narrative = config.narrative.enabled
        || matches!(
            cli.command,
            Commands::Analyze { narrative: true, .. } | Commands::Batch { narrative: true, .. }
        );

    if wants_narrative {
        let narrator =
            OllamaNarrator::new(&config.narrative).context("failed to set up narrative model")?;
        tracing::info!(model = narrator.name(), "Narrative generation enabled");
        run(ReportEngine::new(narrator, &config.narrative), cli.command, &config).await
    } else {
        run(ReportEngine::offline(), cli.command, &config).await
    }
}
