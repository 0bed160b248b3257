// End-to-end runs of the analysis driver with in-process doubles

use async_trait::async_trait;
use seoscope_core::error::{GenerationError, RunError, SearchError};
use seoscope_core::{
    AnalysisRequest, GenerationRequest, NO_DATA_PLACEHOLDER, NO_URL_AUDIT, PipelineOptions,
    ProgressCallback, ProgressStep, SEARCH_ERROR_PREFIX, SearchProvider, SeoAnalyzer, Stage,
    TextGenerator, run_analysis,
};
use seoscope_scanner::SiteAuditor;
use seoscope_scanner::auditor::AuditOptions;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ============================================================================
// Doubles
// ============================================================================

struct StaticSearch {
    text: String,
    calls: AtomicUsize,
}

impl StaticSearch {
    fn new(text: &str) -> Arc<Self> {
        Arc::new(Self {
            text: text.to_string(),
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl SearchProvider for StaticSearch {
    async fn run(&self, _query: &str) -> Result<String, SearchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.text.clone())
    }
}

struct BrokenSearch;

#[async_trait]
impl SearchProvider for BrokenSearch {
    async fn run(&self, _query: &str) -> Result<String, SearchError> {
        Err(SearchError::Status {
            status: 503,
            body: "service unavailable".to_string(),
        })
    }
}

/// Answers by persona and records every request it sees.
#[derive(Default)]
struct RecordingGenerator {
    requests: Mutex<Vec<GenerationRequest>>,
    /// Number of leading calls that fail before answers start.
    failures: usize,
    /// Stage whose calls always fail.
    broken_stage: Option<&'static str>,
}

impl RecordingGenerator {
    fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().unwrap().clone()
    }

    fn prompt_for(&self, role: &str) -> String {
        self.requests()
            .into_iter()
            .find(|r| r.system.starts_with(&format!("You are {}.", role)))
            .map(|r| r.prompt)
            .unwrap_or_default()
    }
}

#[async_trait]
impl TextGenerator for RecordingGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        let call = {
            let mut requests = self.requests.lock().unwrap();
            requests.push(request.clone());
            requests.len()
        };

        if call <= self.failures {
            return Err(GenerationError::Status {
                status: 500,
                body: "upstream error".to_string(),
            });
        }
        if let Some(role) = self.broken_stage
            && request.system.starts_with(&format!("You are {}.", role))
        {
            return Err(GenerationError::EmptyOutput);
        }

        let text = if request.system.starts_with("You are SEO Keyword Analyst.") {
            "ANALYSIS: keyword correlate e gap di contenuto"
        } else if request.system.starts_with("You are SEO Strategist.") {
            "STRATEGY: tre strategie on-page"
        } else {
            "SUMMARY: punti chiave e prossimi step"
        };
        Ok(text.to_string())
    }
}

fn options() -> PipelineOptions {
    PipelineOptions {
        retry_delay: Duration::ZERO,
        ..PipelineOptions::default()
    }
}

fn auditor() -> SiteAuditor {
    SiteAuditor::new(AuditOptions::default()).unwrap()
}

fn analyzer(
    search: Arc<dyn SearchProvider>,
    generator: Arc<dyn TextGenerator>,
    options: PipelineOptions,
) -> SeoAnalyzer {
    SeoAnalyzer::with_parts(search, generator, auditor(), options)
}

// ============================================================================
// Keyword validation
// ============================================================================

#[tokio::test]
async fn test_blank_keyword_makes_no_calls() {
    let search = StaticSearch::new("snippets");
    let generator = RecordingGenerator::new();
    let analyzer = analyzer(search.clone(), generator.clone(), options());

    for keyword in ["", "   "] {
        let err = analyzer
            .run(&AnalysisRequest::new(keyword, None), None)
            .await
            .unwrap_err();
        assert!(matches!(err, RunError::MissingKeyword));
        assert_eq!(
            err.to_string(),
            "Inserisci una keyword o un argomento per avviare l'analisi."
        );
    }

    assert_eq!(search.calls.load(Ordering::SeqCst), 0);
    assert!(generator.requests().is_empty());
}

// ============================================================================
// Happy path
// ============================================================================

#[tokio::test]
async fn test_run_without_url_uses_placeholder_audit() {
    let search = StaticSearch::new("Imballaggi compostabili in crescita.");
    let generator = RecordingGenerator::new();
    let analyzer = analyzer(search.clone(), generator.clone(), options());

    let report = run_analysis(
        &analyzer,
        &AnalysisRequest::new("packaging sostenibile", None),
        None,
    )
    .await
    .unwrap();

    assert_eq!(report.keyword, "packaging sostenibile");
    assert_eq!(report.url, None);
    assert!(report.site_audit.is_none());
    assert_eq!(report.audit_string, NO_URL_AUDIT);
    assert_eq!(
        report.search_query,
        "packaging sostenibile - Principali risultati di ricerca e snippet"
    );

    let analysis_prompt = generator.prompt_for("SEO Keyword Analyst");
    assert!(analysis_prompt.contains(NO_URL_AUDIT));
    assert!(analysis_prompt.contains("Imballaggi compostabili in crescita."));
    assert!(analysis_prompt.contains("'packaging sostenibile'"));

    assert_eq!(generator.requests().len(), 3);
    assert!(report.output.stages().iter().all(|s| s.succeeded));
    assert_eq!(report.output.summary.text, "SUMMARY: punti chiave e prossimi step");
}

#[tokio::test]
async fn test_later_prompts_embed_prior_outputs_verbatim() {
    let generator = RecordingGenerator::new();
    let analyzer = analyzer(StaticSearch::new("snippets"), generator.clone(), options());

    analyzer
        .run(&AnalysisRequest::new("software CRM", None), None)
        .await
        .unwrap();

    let strategy_prompt = generator.prompt_for("SEO Strategist");
    assert!(strategy_prompt.contains(
        "\n\nReport di Analisi SEO:\nANALYSIS: keyword correlate e gap di contenuto"
    ));

    let summary_prompt = generator.prompt_for("Summary Agent");
    assert!(summary_prompt.contains(
        "Report Completo:\nReport di Analisi SEO:\n\
         ANALYSIS: keyword correlate e gap di contenuto\n\n\
         Strategia SEO:\nSTRATEGY: tre strategie on-page\n\n"
    ));
}

#[tokio::test]
async fn test_stages_run_in_order() {
    let generator = RecordingGenerator::new();
    let analyzer = analyzer(StaticSearch::new("snippets"), generator.clone(), options());

    analyzer
        .run(&AnalysisRequest::new("kw", None), None)
        .await
        .unwrap();

    let roles: Vec<String> = generator
        .requests()
        .iter()
        .map(|r| r.system.split('.').next().unwrap_or_default().to_string())
        .collect();
    assert_eq!(
        roles,
        vec![
            "You are SEO Keyword Analyst",
            "You are SEO Strategist",
            "You are Summary Agent"
        ]
    );
}

#[tokio::test]
async fn test_progress_steps_are_reported_in_order() {
    let analyzer = analyzer(StaticSearch::new("snippets"), RecordingGenerator::new(), options());
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let progress: ProgressCallback = Arc::new(move |step| sink.lock().unwrap().push(step));

    analyzer
        .run(&AnalysisRequest::new("kw", None), Some(progress))
        .await
        .unwrap();

    assert_eq!(*seen.lock().unwrap(), ProgressStep::ALL.to_vec());
}

#[tokio::test]
async fn test_run_with_url_audits_page() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<html><head><title>Eco Box</title>
               <meta name="description" content="Scatole riciclate"></head>
               <body><h1>Scatole</h1><h2>Materiali</h2></body></html>"#,
        ))
        .expect(1)
        .mount(&server)
        .await;

    let generator = RecordingGenerator::new();
    let analyzer = analyzer(StaticSearch::new("snippets"), generator.clone(), options());

    let report = analyzer
        .run(
            &AnalysisRequest::new("packaging", Some(format!("{}/", server.uri()))),
            None,
        )
        .await
        .unwrap();

    let expected =
        "Titolo: Eco Box\nMeta Description: Scatole riciclate\nHeadings: Scatole, Materiali";
    assert_eq!(report.audit_string, expected);
    assert!(generator.prompt_for("SEO Keyword Analyst").contains(expected));
}

// ============================================================================
// Degrade and continue
// ============================================================================

#[tokio::test]
async fn test_search_failure_is_inlined_and_run_completes() {
    let generator = RecordingGenerator::new();
    let analyzer = analyzer(Arc::new(BrokenSearch), generator.clone(), options());

    let report = analyzer
        .run(&AnalysisRequest::new("kw", None), None)
        .await
        .unwrap();

    assert!(report.search_results.starts_with(SEARCH_ERROR_PREFIX));
    assert!(report.search_results.contains("503"));
    assert!(
        generator
            .prompt_for("SEO Keyword Analyst")
            .contains(SEARCH_ERROR_PREFIX)
    );
    assert!(report.output.summary.succeeded);
}

#[tokio::test]
async fn test_unreachable_url_is_inlined_and_run_completes() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let analyzer = analyzer(StaticSearch::new("snippets"), RecordingGenerator::new(), options());

    let report = analyzer
        .run(
            &AnalysisRequest::new("kw", Some(format!("http://127.0.0.1:{}/", port))),
            None,
        )
        .await
        .unwrap();

    assert!(report.site_audit.as_ref().unwrap().is_error());
    assert!(
        report
            .audit_string
            .starts_with("Errore durante l'analisi del sito: ")
    );
    assert!(report.output.summary.succeeded);
}

#[tokio::test]
async fn test_attempts_are_bounded_and_placeholder_used() {
    let generator = Arc::new(RecordingGenerator {
        failures: usize::MAX,
        ..RecordingGenerator::default()
    });
    let analyzer = analyzer(
        StaticSearch::new("snippets"),
        generator.clone(),
        PipelineOptions {
            max_iterations: 3,
            ..options()
        },
    );

    let report = analyzer
        .run(&AnalysisRequest::new("kw", None), None)
        .await
        .unwrap();

    assert_eq!(generator.requests().len(), 9);
    for outcome in report.output.stages() {
        assert!(!outcome.succeeded);
        assert_eq!(outcome.attempts, 3);
        assert_eq!(outcome.text, NO_DATA_PLACEHOLDER);
        assert!(outcome.error.as_deref().unwrap().contains("500"));
    }
    assert!(
        generator
            .prompt_for("SEO Strategist")
            .contains("Report di Analisi SEO:\nNo data available.")
    );
}

#[tokio::test]
async fn test_transient_failures_are_retried() {
    let generator = Arc::new(RecordingGenerator {
        failures: 2,
        ..RecordingGenerator::default()
    });
    let analyzer = analyzer(StaticSearch::new("snippets"), generator.clone(), options());

    let report = analyzer
        .run(&AnalysisRequest::new("kw", None), None)
        .await
        .unwrap();

    assert!(report.output.analysis.succeeded);
    assert_eq!(report.output.analysis.attempts, 3);
    assert_eq!(report.output.strategy.attempts, 1);
    assert_eq!(generator.requests().len(), 5);
}

#[tokio::test]
async fn test_missing_strategy_does_not_stop_summary() {
    let generator = Arc::new(RecordingGenerator {
        broken_stage: Some("SEO Strategist"),
        ..RecordingGenerator::default()
    });
    let analyzer = analyzer(
        StaticSearch::new("snippets"),
        generator.clone(),
        PipelineOptions {
            max_iterations: 2,
            ..options()
        },
    );

    let report = analyzer
        .run(&AnalysisRequest::new("kw", None), None)
        .await
        .unwrap();

    assert!(report.output.analysis.succeeded);
    assert!(!report.output.strategy.succeeded);
    assert_eq!(report.output.strategy.stage, Stage::Strategy);
    assert!(report.output.summary.succeeded);
    assert!(
        generator
            .prompt_for("Summary Agent")
            .contains("Strategia SEO:\nNo data available.\n\n")
    );
}

#[tokio::test]
async fn test_context_limit_truncates_prior_reports() {
    let generator = RecordingGenerator::new();
    let analyzer = analyzer(
        StaticSearch::new("snippets"),
        generator.clone(),
        PipelineOptions {
            max_context_chars: Some(8),
            ..options()
        },
    );

    let report = analyzer
        .run(&AnalysisRequest::new("kw", None), None)
        .await
        .unwrap();

    assert_eq!(
        report.output.analysis.text,
        "ANALYSIS: keyword correlate e gap di contenuto"
    );
    let strategy_prompt = generator.prompt_for("SEO Strategist");
    assert!(strategy_prompt.contains("Report di Analisi SEO:\nANALYSIS […]"));
    assert!(!strategy_prompt.contains("keyword correlate"));
}

// ============================================================================
// Strict mode
// ============================================================================

#[tokio::test]
async fn test_strict_mode_aborts_on_search_failure() {
    let generator = RecordingGenerator::new();
    let analyzer = analyzer(
        Arc::new(BrokenSearch),
        generator.clone(),
        PipelineOptions {
            strict: true,
            ..options()
        },
    );

    let err = analyzer
        .run(&AnalysisRequest::new("kw", None), None)
        .await
        .unwrap_err();

    assert!(matches!(err, RunError::Search(_)));
    assert!(generator.requests().is_empty());
}

#[tokio::test]
async fn test_strict_mode_aborts_on_audit_failure() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let generator = RecordingGenerator::new();
    let analyzer = analyzer(
        StaticSearch::new("snippets"),
        generator.clone(),
        PipelineOptions {
            strict: true,
            ..options()
        },
    );

    let err = analyzer
        .run(
            &AnalysisRequest::new("kw", Some(format!("http://127.0.0.1:{}/", port))),
            None,
        )
        .await
        .unwrap_err();

    assert!(matches!(err, RunError::Audit(_)), "got: {:?}", err);
    assert!(generator.requests().is_empty());
}

#[tokio::test]
async fn test_strict_mode_aborts_on_stage_failure() {
    let generator = Arc::new(RecordingGenerator {
        broken_stage: Some("SEO Keyword Analyst"),
        ..RecordingGenerator::default()
    });
    let analyzer = analyzer(
        StaticSearch::new("snippets"),
        generator.clone(),
        PipelineOptions {
            strict: true,
            max_iterations: 2,
            ..options()
        },
    );

    let err = analyzer
        .run(&AnalysisRequest::new("kw", None), None)
        .await
        .unwrap_err();

    match err {
        RunError::Stage { stage, attempts } => {
            assert_eq!(stage, "Analysis");
            assert_eq!(attempts, 2);
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert_eq!(generator.requests().len(), 2);
}
