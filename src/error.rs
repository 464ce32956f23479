use serde::{Deserialize, Serialize};
use std::fmt;

/// Error type for everything in the crate that touches the outside world:
/// config files, the narrative model endpoint, input files.
///
/// The analysis itself never fails; this only flows through I/O paths.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineError {
    pub message: String,
    pub stage: String,
    pub model: Option<String>,
    pub context: Option<String>,
    pub source: Option<String>,
}

impl EngineError {
    pub fn new<S: Into<String>>(message: S, stage: &'static str) -> Self {
        EngineError {
            message: message.into(),
            stage: stage.to_string(),
            model: None,
            context: None,
            source: None,
        }
    }

    /// Name the narrative model involved
    pub fn with_model<S: Into<String>>(mut self, model: S) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_context<S: Into<String>>(mut self, context: S) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn with_source<S: Into<String>>(mut self, source: S) -> Self {
        self.source = Some(source.into());
        self
    }
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.stage, self.message)?;
        if let Some(ref model) = self.model {
            write!(f, " (model: {})", model)?;
        }
        if let Some(ref context) = self.context {
            write!(f, " (context: {})", context)?;
        }
        if let Some(ref source) = self.source {
            write!(f, " (source: {})", source)?;
        }
        Ok(())
    }
}

impl std::error::Error for EngineError {}

impl From<anyhow::Error> for EngineError {
    fn from(err: anyhow::Error) -> Self {
        // {:#} keeps the context chain on one line
        EngineError::new(format!("{:#}", err), "unknown").with_source("anyhow")
    }
}

impl From<std::io::Error> for EngineError {
    fn from(err: std::io::Error) -> Self {
        EngineError::new(format!("I/O error: {}", err), "io").with_source("std::io")
    }
}

impl From<serde_json::Error> for EngineError {
    fn from(err: serde_json::Error) -> Self {
        EngineError::new(format!("JSON error: {}", err), "json_parse").with_source("serde_json")
    }
}

impl From<toml::de::Error> for EngineError {
    fn from(err: toml::de::Error) -> Self {
        EngineError::new(format!("TOML error: {}", err), "config").with_source("toml")
    }
}

impl From<reqwest::Error> for EngineError {
    fn from(err: reqwest::Error) -> Self {
        let stage = if err.is_timeout() { "timeout" } else { "http" };
        EngineError::new(format!("HTTP error: {}", err), stage).with_source("reqwest")
    }
}

impl From<tokio::time::error::Elapsed> for EngineError {
    fn from(_: tokio::time::error::Elapsed) -> Self {
        EngineError::new("Operation timed out", "timeout").with_source("tokio::time")
    }
}
