// Tests for final report rendering

use chrono::{TimeZone, Utc};
use seoscope_core::report::{
    CLOSING_LINE, generate_json_report, generate_markdown_report, generate_text_report,
    render_report,
};
use seoscope_core::{
    NO_DATA_PLACEHOLDER, PipelineOutput, PipelineReport, ReportFormat, Stage, StageOutcome,
    save_report,
};
use seoscope_scanner::{PageAudit, SiteAudit};
use tempfile::TempDir;

fn outcome(stage: Stage, role: &str, text: &str) -> StageOutcome {
    StageOutcome {
        stage,
        role: role.to_string(),
        succeeded: true,
        text: text.to_string(),
        attempts: 1,
        error: None,
    }
}

fn sample_report() -> PipelineReport {
    PipelineReport {
        run_id: "3f1c2a9e-0000-4000-8000-000000000001".to_string(),
        keyword: "software CRM".to_string(),
        url: Some("https://example.com".to_string()),
        generated_at: Utc.with_ymd_and_hms(2025, 3, 14, 9, 30, 0).unwrap(),
        search_query: "software CRM - Principali risultati di ricerca e snippet".to_string(),
        search_results: "CRM per PMI.".to_string(),
        site_audit: Some(SiteAudit::Page(PageAudit {
            title: "Example CRM".to_string(),
            meta_description: "Il CRM semplice".to_string(),
            headings: vec!["Funzioni".to_string()],
        })),
        audit_string: "Titolo: Example CRM\nMeta Description: Il CRM semplice\nHeadings: Funzioni"
            .to_string(),
        output: PipelineOutput {
            analysis: outcome(Stage::Analysis, "SEO Keyword Analyst", "Analisi dettagliata"),
            strategy: StageOutcome {
                succeeded: false,
                text: NO_DATA_PLACEHOLDER.to_string(),
                attempts: 5,
                error: Some("Text generation returned no content".to_string()),
                ..outcome(Stage::Strategy, "SEO Strategist", "")
            },
            summary: outcome(Stage::Summary, "Summary Agent", "Riepilogo finale"),
        },
    }
}

// ============================================================================
// Text
// ============================================================================

#[test]
fn test_text_report_layout() {
    let text = generate_text_report(&sample_report());

    assert!(text.contains("Keyword:      software CRM"));
    assert!(text.contains("URL:          https://example.com"));
    assert!(text.contains("Date:         2025-03-14 09:30:00 UTC"));
    assert!(text.contains("REPORT FINALE"));
    assert!(text.contains("SEO Keyword Analyst Report"));
    assert!(text.contains("SEO Strategist Report"));
    assert!(!text.contains("Summary Agent Report"));
    assert!(text.contains("Fine Analisi"));
    assert!(text.contains(&format!("Fine Analisi\n{}\n", CLOSING_LINE)));

    let summary_at = text.find("Riepilogo finale").unwrap();
    let analysis_at = text.find("Analisi dettagliata").unwrap();
    assert!(summary_at < analysis_at);
}

#[test]
fn test_text_report_marks_missing_stage() {
    let text = generate_text_report(&sample_report());
    assert!(text.contains("no output after 5 attempt(s)"));
    assert!(text.contains(NO_DATA_PLACEHOLDER));
}

// ============================================================================
// Markdown
// ============================================================================

#[test]
fn test_markdown_report_sections() {
    let md = generate_markdown_report(&sample_report());

    assert!(md.starts_with("# Analisi SEO: software CRM\n"));
    assert!(md.contains("## Report Finale\n\nRiepilogo finale"));
    assert!(md.contains("## Report Dettagliati per Agente"));
    assert!(md.contains("### SEO Keyword Analyst Report\n\nAnalisi dettagliata"));
    assert!(md.contains("### SEO Strategist Report\n\n> no output"));
    assert!(md.trim_end().ends_with(&format!("*Fine Analisi*\n\n{}", CLOSING_LINE)));
    assert!(CLOSING_LINE.starts_with("Grazie per aver utilizzato il tool"));
}

// ============================================================================
// JSON
// ============================================================================

#[test]
fn test_json_report_structure() {
    let json = generate_json_report(&sample_report()).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    let report = &value["report"];

    assert_eq!(report["metadata"]["generator"], "seoscope");
    assert_eq!(
        report["metadata"]["run_id"],
        "3f1c2a9e-0000-4000-8000-000000000001"
    );
    assert_eq!(report["input"]["keyword"], "software CRM");
    assert_eq!(report["search"]["results"], "CRM per PMI.");
    assert_eq!(report["audit"]["result"]["title"], "Example CRM");

    let stages = report["stages"].as_array().unwrap();
    assert_eq!(stages.len(), 3);
    assert_eq!(stages[0]["stage"], "analysis");
    assert_eq!(stages[1]["succeeded"], false);
    assert_eq!(stages[1]["attempts"], 5);
    assert_eq!(stages[2]["role"], "Summary Agent");
}

#[test]
fn test_json_report_failed_audit_shape() {
    let mut report = sample_report();
    report.site_audit = Some(SiteAudit::failed("timeout"));

    let value: serde_json::Value =
        serde_json::from_str(&generate_json_report(&report).unwrap()).unwrap();
    assert_eq!(value["report"]["audit"]["result"]["error"], "timeout");
}

#[test]
fn test_render_report_dispatches_on_format() {
    let report = sample_report();
    assert_eq!(
        render_report(&report, ReportFormat::Text).unwrap(),
        generate_text_report(&report)
    );
    assert!(
        render_report(&report, ReportFormat::Json)
            .unwrap()
            .trim_start()
            .starts_with('{')
    );
}

// ============================================================================
// Saving
// ============================================================================

#[test]
fn test_save_report_writes_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("report.md");
    let content = generate_markdown_report(&sample_report());

    save_report(&content, &path).unwrap();

    assert_eq!(std::fs::read_to_string(&path).unwrap(), content);
}
