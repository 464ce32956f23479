pub mod analysis;
pub mod batch;
pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod narrative;
pub mod perf;
pub mod records;
pub mod report;

pub use error::EngineError;
pub use records::{AttemptRecord, WeaknessReport};
pub use report::{build_report, ReportEngine, ReportOptions};
