pub mod analysis;
pub mod config;
pub mod error;
pub mod llm;
pub mod persona;
pub mod pipeline;
pub mod report;
pub mod search;

pub use analysis::{
    AnalysisRequest, NO_URL_AUDIT, ProgressCallback, ProgressStep, SeoAnalyzer, run_analysis,
};
pub use config::{AppConfig, FileConfig};
pub use error::{ConfigError, GenerationError, RunError, SearchError};
pub use llm::{GenerationRequest, OpenAiGenerator, TextGenerator};
pub use persona::{Persona, Stage, StageRequest};
pub use pipeline::{
    NO_DATA_PLACEHOLDER, PipelineInput, PipelineOptions, PipelineOutput, PipelineReport,
    PipelineRunner, StageCallback, StageOutcome,
};
pub use report::{ReportFormat, format_site_audit, render_report, save_report};
pub use search::{SEARCH_ERROR_PREFIX, SearchClient, SearchProvider, SerperProvider};
