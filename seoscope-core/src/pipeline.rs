use crate::config::FileConfig;
use crate::error::{GenerationError, Result, RunError};
use crate::llm::TextGenerator;
use crate::persona::{Stage, StageRequest};
use chrono::{DateTime, Utc};
use seoscope_scanner::SiteAudit;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Text recorded for a stage whose output could not be retrieved.
pub const NO_DATA_PLACEHOLDER: &str = "No data available.";

/// Marker appended to a prior-stage report cut by `max_context_chars`.
pub const TRUNCATION_MARKER: &str = " […]";

/// What one stage produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageOutcome {
    pub stage: Stage,
    pub role: String,
    pub succeeded: bool,
    /// Raw model output, or [`NO_DATA_PLACEHOLDER`] when `succeeded` is false.
    pub text: String,
    pub attempts: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StageOutcome {
    fn succeeded(request: &StageRequest, text: String, attempts: usize) -> Self {
        Self {
            stage: request.stage,
            role: request.persona.role.clone(),
            succeeded: true,
            text,
            attempts,
            error: None,
        }
    }

    fn missing(request: &StageRequest, attempts: usize, error: Option<String>) -> Self {
        Self {
            stage: request.stage,
            role: request.persona.role.clone(),
            succeeded: false,
            text: NO_DATA_PLACEHOLDER.to_string(),
            attempts,
            error,
        }
    }
}

/// Everything the pipeline needs from the search/audit phase.
#[derive(Debug, Clone)]
pub struct PipelineInput {
    pub keyword: String,
    pub search_results: String,
    pub audit_string: String,
}

/// The three stage outcomes, in execution order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PipelineOutput {
    pub analysis: StageOutcome,
    pub strategy: StageOutcome,
    pub summary: StageOutcome,
}

impl PipelineOutput {
    pub fn stages(&self) -> [&StageOutcome; 3] {
        [&self.analysis, &self.strategy, &self.summary]
    }

    /// Stages shown as individual reports (everything but the summary).
    pub fn detail_stages(&self) -> [&StageOutcome; 2] {
        [&self.analysis, &self.strategy]
    }
}

/// One complete run: inputs, intermediate texts and stage outputs.
#[derive(Debug, Clone)]
pub struct PipelineReport {
    pub run_id: String,
    pub keyword: String,
    pub url: Option<String>,
    pub generated_at: DateTime<Utc>,
    pub search_query: String,
    pub search_results: String,
    pub site_audit: Option<SiteAudit>,
    pub audit_string: String,
    pub output: PipelineOutput,
}

#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub temperature: f32,
    pub max_iterations: usize,
    pub retry_delay: Duration,
    pub max_context_chars: Option<usize>,
    pub strict: bool,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self::from(&FileConfig::default())
    }
}

impl From<&FileConfig> for PipelineOptions {
    fn from(config: &FileConfig) -> Self {
        Self {
            temperature: config.model.temperature,
            max_iterations: config.model.max_iterations.max(1),
            retry_delay: Duration::from_millis(config.model.retry_delay_ms),
            max_context_chars: config.pipeline.max_context_chars,
            strict: config.pipeline.strict,
        }
    }
}

/// Called after each stage finishes.
pub type StageCallback = Arc<dyn Fn(&StageOutcome) + Send + Sync>;

/// Runs Analysis, Strategy and Summary strictly in that order, feeding every
/// prior output into the next prompt.
pub struct PipelineRunner {
    generator: Arc<dyn TextGenerator>,
    options: PipelineOptions,
}

impl PipelineRunner {
    pub fn new(generator: Arc<dyn TextGenerator>, options: PipelineOptions) -> Self {
        Self { generator, options }
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    pub async fn run(
        &self,
        input: &PipelineInput,
        on_stage: Option<&StageCallback>,
    ) -> Result<PipelineOutput> {
        let notify = |outcome: &StageOutcome| {
            if let Some(callback) = on_stage {
                callback(outcome);
            }
        };

        let analysis = self
            .run_stage(StageRequest::analysis(
                &input.keyword,
                &input.search_results,
                &input.audit_string,
            ))
            .await?;
        notify(&analysis);

        let strategy = self
            .run_stage(StageRequest::strategy(
                &input.keyword,
                &self.context(&analysis.text),
            ))
            .await?;
        notify(&strategy);

        let summary = self
            .run_stage(StageRequest::summary(
                &input.keyword,
                &self.context(&analysis.text),
                &self.context(&strategy.text),
            ))
            .await?;
        notify(&summary);

        Ok(PipelineOutput {
            analysis,
            strategy,
            summary,
        })
    }

    /// Makes up to `max_iterations` attempts, backing off linearly between them.
    async fn run_stage(&self, request: StageRequest) -> Result<StageOutcome> {
        let max = self.options.max_iterations.max(1);
        let generation = request.to_generation_request(self.options.temperature);
        let mut last_error: Option<String> = None;

        info!(stage = %request.stage, role = %request.persona.role, "Running stage");

        for attempt in 1..=max {
            match self.generator.generate(&generation).await {
                Ok(text) if !text.trim().is_empty() => {
                    info!(stage = %request.stage, attempt, chars = text.len(), "Stage complete");
                    return Ok(StageOutcome::succeeded(&request, text, attempt));
                }
                Ok(_) => {
                    warn!(stage = %request.stage, attempt, "Stage returned empty output");
                    last_error = Some(GenerationError::EmptyOutput.to_string());
                }
                Err(e) => {
                    warn!(stage = %request.stage, attempt, "Stage attempt failed: {}", e);
                    last_error = Some(e.to_string());
                }
            }

            if attempt < max && !self.options.retry_delay.is_zero() {
                tokio::time::sleep(backoff(self.options.retry_delay, attempt)).await;
            }
        }

        if self.options.strict {
            return Err(RunError::Stage {
                stage: request.stage.to_string(),
                attempts: max,
            });
        }

        warn!(stage = %request.stage, "No output after {} attempt(s), using placeholder", max);
        Ok(StageOutcome::missing(&request, max, last_error))
    }

    fn context(&self, text: &str) -> String {
        match self.options.max_context_chars {
            Some(limit) => truncate_context(text, limit),
            None => text.to_string(),
        }
    }
}

/// Linear backoff before the next attempt, saturating instead of overflowing.
fn backoff(delay: Duration, attempt: usize) -> Duration {
    delay.saturating_mul(u32::try_from(attempt).unwrap_or(u32::MAX))
}

/// Cuts `text` to at most `limit` characters, marking the cut.
pub fn truncate_context(text: &str, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((byte_idx, _)) => format!("{}{}", &text[..byte_idx], TRUNCATION_MARKER),
        None => text.to_string(),
    }
}
