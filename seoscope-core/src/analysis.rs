// Search, audit and pipeline wired together for one run

use crate::config::{AppConfig, FileConfig};
use crate::error::{ConfigError, Result, RunError};
use crate::llm::{OpenAiGenerator, TextGenerator};
use crate::persona::Stage;
use crate::pipeline::{
    PipelineInput, PipelineOptions, PipelineReport, PipelineRunner, StageCallback, StageOutcome,
};
use crate::report::format_site_audit;
use crate::search::{SearchClient, SearchProvider, SerperProvider, build_search_query};
use seoscope_scanner::auditor::AuditOptions;
use seoscope_scanner::{SiteAudit, SiteAuditor};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Audit text used when no URL was supplied.
pub const NO_URL_AUDIT: &str = "Nessun URL fornito per l'audit del sito.";

/// User input for one run.
#[derive(Debug, Clone, Default)]
pub struct AnalysisRequest {
    pub keyword: String,
    pub url: Option<String>,
}

impl AnalysisRequest {
    pub fn new(keyword: impl Into<String>, url: Option<String>) -> Self {
        Self {
            keyword: keyword.into(),
            url,
        }
    }

    /// Trimmed keyword, or `MissingKeyword` if there is none.
    pub fn validated_keyword(&self) -> Result<&str> {
        let keyword = self.keyword.trim();
        if keyword.is_empty() {
            Err(RunError::MissingKeyword)
        } else {
            Ok(keyword)
        }
    }

    /// Trimmed URL if one was given and is not blank.
    pub fn target_url(&self) -> Option<&str> {
        self.url.as_deref().map(str::trim).filter(|u| !u.is_empty())
    }
}

/// Discrete progress points of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressStep {
    Started,
    AnalysisDone,
    StrategyDone,
    SummaryDone,
}

impl ProgressStep {
    pub const ALL: [ProgressStep; 4] = [
        ProgressStep::Started,
        ProgressStep::AnalysisDone,
        ProgressStep::StrategyDone,
        ProgressStep::SummaryDone,
    ];

    pub fn percent(self) -> u64 {
        match self {
            ProgressStep::Started => 10,
            ProgressStep::AnalysisDone => 50,
            ProgressStep::StrategyDone => 80,
            ProgressStep::SummaryDone => 100,
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            ProgressStep::Started => "Ricerca e analisi keyword in corso...",
            ProgressStep::AnalysisDone => "Elaborazione strategia SEO...",
            ProgressStep::StrategyDone => "Preparazione riepilogo finale...",
            ProgressStep::SummaryDone => "Analisi completata",
        }
    }

    fn after(stage: Stage) -> Self {
        match stage {
            Stage::Analysis => ProgressStep::AnalysisDone,
            Stage::Strategy => ProgressStep::StrategyDone,
            Stage::Summary => ProgressStep::SummaryDone,
        }
    }
}

/// Callback for reporting run progress
pub type ProgressCallback = Arc<dyn Fn(ProgressStep) + Send + Sync>;

/// Owns the collaborators of a run. Built once per process; each call to
/// [`SeoAnalyzer::run`] starts from fresh stage requests.
pub struct SeoAnalyzer {
    search: SearchClient,
    auditor: SiteAuditor,
    pipeline: PipelineRunner,
    strict: bool,
}

impl SeoAnalyzer {
    pub fn new(search: SearchClient, auditor: SiteAuditor, pipeline: PipelineRunner) -> Self {
        let strict = pipeline.options().strict;
        Self {
            search,
            auditor,
            pipeline,
            strict,
        }
    }

    /// Wires the Serper provider, the OpenAI generator and the site auditor
    /// from configuration.
    pub fn from_config(secrets: &AppConfig, config: &FileConfig) -> Result<Self, ConfigError> {
        let provider = SerperProvider::new(&secrets.serper_api_key, &config.search)
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;
        let generator = OpenAiGenerator::new(&secrets.openai_api_key, &config.model)
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;
        let auditor = SiteAuditor::new(AuditOptions {
            timeout: Duration::from_secs(config.audit.timeout_secs),
            user_agent: config.audit.user_agent.clone(),
        })
        .map_err(|e| ConfigError::HttpClient(e.to_string()))?;

        Ok(Self::with_parts(
            Arc::new(provider),
            Arc::new(generator),
            auditor,
            PipelineOptions::from(config),
        ))
    }

    pub fn with_parts(
        provider: Arc<dyn SearchProvider>,
        generator: Arc<dyn TextGenerator>,
        auditor: SiteAuditor,
        options: PipelineOptions,
    ) -> Self {
        Self::new(
            SearchClient::new(provider),
            auditor,
            PipelineRunner::new(generator, options),
        )
    }

    pub fn auditor(&self) -> &SiteAuditor {
        &self.auditor
    }

    /// Runs search, optional audit and the three stages.
    ///
    /// A blank keyword fails before anything else happens. Outside strict mode
    /// no other error is returned.
    pub async fn run(
        &self,
        request: &AnalysisRequest,
        progress: Option<ProgressCallback>,
    ) -> Result<PipelineReport> {
        let keyword = request.validated_keyword()?.to_string();
        let url = request.target_url().map(str::to_string);
        let run_id = uuid::Uuid::new_v4().to_string();

        info!(%run_id, %keyword, url = url.as_deref().unwrap_or("-"), "Starting SEO analysis");
        if let Some(ref callback) = progress {
            callback(ProgressStep::Started);
        }

        let search_query = build_search_query(&keyword);
        let search_results = if self.strict {
            self.search.try_search(&search_query).await?
        } else {
            self.search.search(&search_query).await
        };

        let site_audit = match url.as_deref() {
            Some(target) if self.strict => {
                let details = self.auditor.try_audit(target).await?;
                Some(SiteAudit::from(details))
            }
            Some(target) => Some(self.auditor.audit(target).await),
            None => None,
        };
        let audit_string = site_audit
            .as_ref()
            .map(format_site_audit)
            .unwrap_or_else(|| NO_URL_AUDIT.to_string());

        let input = PipelineInput {
            keyword: keyword.clone(),
            search_results: search_results.clone(),
            audit_string: audit_string.clone(),
        };

        let stage_callback: Option<StageCallback> = progress.clone().map(|callback| {
            Arc::new(move |outcome: &StageOutcome| callback(ProgressStep::after(outcome.stage)))
                as StageCallback
        });
        let output = self.pipeline.run(&input, stage_callback.as_ref()).await?;

        info!(%run_id, "SEO analysis complete");

        Ok(PipelineReport {
            run_id,
            keyword,
            url,
            generated_at: chrono::Utc::now(),
            search_query,
            search_results,
            site_audit,
            audit_string,
            output,
        })
    }
}

/// Runs one analysis with an already wired [`SeoAnalyzer`].
pub async fn run_analysis(
    analyzer: &SeoAnalyzer,
    request: &AnalysisRequest,
    progress: Option<ProgressCallback>,
) -> Result<PipelineReport> {
    analyzer.run(request, progress).await
}
