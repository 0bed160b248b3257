// Report rendering for audits and finished runs

use crate::pipeline::{PipelineReport, StageOutcome};
use seoscope_scanner::SiteAudit;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::Path;

const HEAVY_RULE: &str =
    "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n";
const LIGHT_RULE: &str =
    "────────────────────────────────────────────────────────────────────────────────\n";

/// Closing line printed under "Fine Analisi".
pub const CLOSING_LINE: &str =
    "Grazie per aver utilizzato il tool di SEO Keyword Research e Content Suggestions!";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportFormat {
    Text,
    Markdown,
    Json,
}

impl ReportFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Some(ReportFormat::Text),
            "markdown" | "md" => Some(ReportFormat::Markdown),
            "json" => Some(ReportFormat::Json),
            _ => None,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            ReportFormat::Text => "txt",
            ReportFormat::Markdown => "md",
            ReportFormat::Json => "json",
        }
    }
}

/// Renders an audit as the block embedded in the analysis prompt.
pub fn format_site_audit(audit: &SiteAudit) -> String {
    match audit {
        SiteAudit::Failed { error } => format!("Errore durante l'analisi del sito: {}", error),
        SiteAudit::Page(page) => format!(
            "Titolo: {}\nMeta Description: {}\nHeadings: {}",
            page.title,
            page.meta_description,
            page.headings.join(", ")
        ),
    }
}

pub fn render_report(
    report: &PipelineReport,
    format: ReportFormat,
) -> Result<String, serde_json::Error> {
    match format {
        ReportFormat::Text => Ok(generate_text_report(report)),
        ReportFormat::Markdown => Ok(generate_markdown_report(report)),
        ReportFormat::Json => generate_json_report(report),
    }
}

pub fn generate_text_report(report: &PipelineReport) -> String {
    let mut out = String::new();

    // Header
    out.push_str(HEAVY_RULE);
    out.push_str("                          SEOSCOPE KEYWORD REPORT\n");
    out.push_str(HEAVY_RULE);
    out.push('\n');

    out.push_str(&format!("Keyword:      {}\n", report.keyword));
    out.push_str(&format!("URL:          {}\n", report.url.as_deref().unwrap_or("-")));
    out.push_str(&format!("Date:         {}\n", format_timestamp(report)));
    out.push_str(&format!("Run ID:       {}\n", report.run_id));
    out.push('\n');

    // Summary first
    out.push_str(HEAVY_RULE);
    out.push_str("REPORT FINALE\n");
    out.push_str(HEAVY_RULE);
    out.push('\n');
    out.push_str(report.output.summary.text.trim_end());
    out.push_str("\n\n");

    out.push_str(HEAVY_RULE);
    out.push_str("REPORT DETTAGLIATI PER AGENTE\n");
    out.push_str(HEAVY_RULE);
    out.push('\n');

    for outcome in report.output.detail_stages() {
        out.push_str(&format!("{} Report\n", outcome.role));
        out.push_str(&format!("Status:       {}\n\n", stage_status(outcome)));
        out.push_str(outcome.text.trim_end());
        out.push_str("\n\n");
        out.push_str(LIGHT_RULE);
        out.push('\n');
    }

    // Footer
    out.push_str(HEAVY_RULE);
    out.push_str("                               Fine Analisi\n");
    out.push_str(CLOSING_LINE);
    out.push('\n');
    out.push_str(HEAVY_RULE);
    out.push_str(&format!("\nGenerated by seoscope {}\n", env!("CARGO_PKG_VERSION")));

    out
}

pub fn generate_markdown_report(report: &PipelineReport) -> String {
    let mut out = String::new();

    out.push_str(&format!("# Analisi SEO: {}\n\n", report.keyword));
    out.push_str(&format!("- **URL:** {}\n", report.url.as_deref().unwrap_or("-")));
    out.push_str(&format!("- **Date:** {}\n", format_timestamp(report)));
    out.push_str(&format!("- **Run ID:** `{}`\n\n", report.run_id));

    out.push_str("## Report Finale\n\n");
    out.push_str(report.output.summary.text.trim_end());
    out.push_str("\n\n");

    out.push_str("## Report Dettagliati per Agente\n\n");
    for outcome in report.output.detail_stages() {
        out.push_str(&format!("### {} Report\n\n", outcome.role));
        if !outcome.succeeded {
            out.push_str(&format!("> {}\n\n", stage_status(outcome)));
        }
        out.push_str(outcome.text.trim_end());
        out.push_str("\n\n");
    }

    out.push_str("---\n\n*Fine Analisi*\n\n");
    out.push_str(CLOSING_LINE);
    out.push('\n');
    out
}

pub fn generate_json_report(report: &PipelineReport) -> Result<String, serde_json::Error> {
    let stages: Vec<serde_json::Value> = report
        .output
        .stages()
        .iter()
        .map(|outcome| {
            serde_json::json!({
                "stage": outcome.stage,
                "role": outcome.role,
                "succeeded": outcome.succeeded,
                "attempts": outcome.attempts,
                "text": outcome.text,
                "error": outcome.error,
            })
        })
        .collect();

    let json_report = serde_json::json!({
        "report": {
            "metadata": {
                "generator": "seoscope",
                "version": env!("CARGO_PKG_VERSION"),
                "generated_at": report.generated_at.to_rfc3339(),
                "run_id": report.run_id,
                "format": "json"
            },
            "input": {
                "keyword": report.keyword,
                "url": report.url,
            },
            "search": {
                "query": report.search_query,
                "results": report.search_results,
            },
            "audit": {
                "result": report.site_audit,
                "text": report.audit_string,
            },
            "stages": stages
        }
    });

    serde_json::to_string_pretty(&json_report)
}

pub fn save_report(content: &str, path: &Path) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(content.as_bytes())?;
    Ok(())
}

fn format_timestamp(report: &PipelineReport) -> String {
    report.generated_at.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

fn stage_status(outcome: &StageOutcome) -> String {
    if outcome.succeeded {
        format!("ok ({} attempt(s))", outcome.attempts)
    } else {
        match &outcome.error {
            Some(error) => format!("no output after {} attempt(s): {}", outcome.attempts, error),
            None => format!("no output after {} attempt(s)", outcome.attempts),
        }
    }
}
