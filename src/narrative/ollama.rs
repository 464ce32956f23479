use anyhow::Context;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

use crate::config::NarrativeConfig;
use crate::error::EngineError;
use crate::logging::log_narrative_call;
use crate::narrative::breaker::CircuitBreaker;
use crate::narrative::prompt::build_prompt;
use crate::narrative::{NarrativeGenerator, NarrativeRequest};

#[derive(Serialize)]
struct OllamaRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Deserialize)]
struct OllamaChunk {
    response: String,
    #[serde(default)]
    done: bool,
}

/// Narrative generator backed by a local Ollama server.
///
/// Owns its HTTP client; construct one per process and pass it to the
/// report engine.
#[derive(Clone)]
pub struct OllamaNarrator {
    client: Client,
    base_url: String,
    model: String,
    breaker: CircuitBreaker,
}

impl OllamaNarrator {
    pub fn new(config: &NarrativeConfig) -> Result<Self, EngineError> {
        let client = Client::builder()
            .timeout(config.timeout())
            .tcp_keepalive(Duration::from_secs(30))
            .pool_max_idle_per_host(10)
            .build()
            .map_err(|e| EngineError::from(e).with_context("building narrative HTTP client"))?;

        Ok(OllamaNarrator {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            breaker: CircuitBreaker::new(
                Duration::from_secs(config.cooldown_secs),
                config.failure_threshold,
            ),
        })
    }

    pub fn breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }

    async fn call(&self, prompt: &str) -> anyhow::Result<String> {
        let response = self
            .client
            .post(format!("{}/api/generate", self.base_url))
            .json(&OllamaRequest {
                model: &self.model,
                prompt,
                stream: true,
            })
            .send()
            .await
            .with_context(|| format!("Failed to connect to Ollama API for model '{}'", self.model))?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("Ollama returned error status: {}", status);
        }

        let text = response
            .text()
            .await
            .with_context(|| format!("Failed to read response from model '{}'", self.model))?;

        let full = join_stream(&text);
        if full.trim().is_empty() {
            anyhow::bail!("Model '{}' returned empty response", self.model);
        }
        Ok(full)
    }
}

/// Concatenate the `response` pieces of a line-delimited streaming reply.
pub fn join_stream(body: &str) -> String {
    let mut full = String::new();
    for line in body.lines().filter(|l| !l.trim().is_empty()) {
        if let Ok(chunk) = serde_json::from_str::<OllamaChunk>(line) {
            full.push_str(&chunk.response);
            if chunk.done {
                break;
            }
        }
    }
    full
}

/// Counts a call as failed unless it is settled. The engine drops the
/// `generate` future when its own timeout fires, so a hung server still
/// reaches the breaker.
struct PendingCall<'a> {
    breaker: &'a CircuitBreaker,
    model: &'a str,
    settled: bool,
}

impl Drop for PendingCall<'_> {
    fn drop(&mut self) {
        if !self.settled {
            self.breaker.record_failure();
            tracing::warn!(model = self.model, "Narrative call abandoned before completion");
        }
    }
}

impl NarrativeGenerator for OllamaNarrator {
    fn name(&self) -> &str {
        &self.model
    }

    fn is_available(&self) -> bool {
        !self.breaker.is_open()
    }

    async fn generate(&self, request: &NarrativeRequest) -> Result<String, EngineError> {
        let prompt = build_prompt(request);
        let start = Instant::now();
        let mut pending = PendingCall {
            breaker: &self.breaker,
            model: &self.model,
            settled: false,
        };

        let result = self.call(&prompt).await;
        pending.settled = true;
        let latency_ms = start.elapsed().as_millis() as u64;
        log_narrative_call(&self.model, result.is_ok(), latency_ms);

        match result {
            Ok(text) => {
                self.breaker.record_success();
                tracing::debug!(
                    model = %self.model,
                    raw_response_preview = %text.chars().take(500).collect::<String>(),
                    "Narrative raw response"
                );
                Ok(text)
            }
            Err(e) => {
                self.breaker.record_failure();
                Err(EngineError::from(e)
                    .with_model(self.model.clone())
                    .with_context(format!("failures in a row: {}", self.breaker.failure_count())))
            }
        }
    }
}
