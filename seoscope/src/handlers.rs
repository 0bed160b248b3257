use anyhow::{Context, Result};
use clap::ArgMatches;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use seoscope_core::config::{
    CONFIG_FILE_NAME, default_config_path, expand_config_dir, load_config_or_default,
};
use seoscope_core::{
    AnalysisRequest, AppConfig, FileConfig, PipelineReport, ProgressCallback, ReportFormat,
    RunError, SeoAnalyzer, format_site_audit, render_report, save_report,
};
use seoscope_scanner::SiteAuditor;
use seoscope_scanner::auditor::AuditOptions;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use tracing_subscriber::EnvFilter;
use url::Url;

/// Exit status when no keyword was supplied.
pub const EXIT_MISSING_KEYWORD: u8 = 2;

pub fn print_banner() {
    println!(
        "{} {}",
        "seoscope".bright_cyan().bold(),
        env!("CARGO_PKG_VERSION").bright_black()
    );
    println!(
        "{}",
        "Keyword research · site audit · SEO strategy".bright_black()
    );
    println!();
}

/// Logs go to stderr so they never mix with a report printed on stdout.
/// `RUST_LOG` wins over `verbose`.
pub fn init_tracing(verbose: bool) {
    let default = if verbose {
        "seoscope=debug,seoscope_core=debug,seoscope_scanner=debug"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

/// Normalizes a user-supplied site address. Blank input means "no site";
/// a bare host gets `https://`.
pub fn normalize_url(input: &str) -> Option<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(url) = Url::parse(trimmed)
        && matches!(url.scheme(), "http" | "https")
    {
        return Some(trimmed.to_string());
    }

    let with_scheme = format!("https://{}", trimmed);
    if Url::parse(&with_scheme).is_ok() {
        return Some(with_scheme);
    }

    // Let the auditor report it
    Some(trimmed.to_string())
}

/// Resolves `--config`: a directory gets `config.toml` appended, `~` is expanded.
pub fn resolve_config_path(arg: Option<&str>) -> PathBuf {
    match arg {
        Some(raw) => {
            let path = expand_config_dir(raw);
            if raw.ends_with('/') || path.is_dir() {
                path.join(CONFIG_FILE_NAME)
            } else {
                path
            }
        }
        None => default_config_path(),
    }
}

/// Writes the default `config.toml` into `config_dir`, creating it if needed.
pub fn write_default_config(config_dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(config_dir)
        .with_context(|| format!("Failed to create config directory {}", config_dir.display()))?;

    let config_path = config_dir.join(CONFIG_FILE_NAME);
    let content = FileConfig::default().to_toml()?;
    fs::write(&config_path, content)
        .with_context(|| format!("Failed to write {}", config_path.display()))?;

    Ok(config_path)
}

fn print_divider() {
    println!("{}", "═".repeat(60).bright_blue().bold());
}

fn print_prompt(msg: &str) -> Result<String> {
    print!("{} ", msg.bright_cyan().bold());
    io::stdout().flush()?;
    let mut response = String::new();
    io::stdin().read_line(&mut response)?;
    Ok(response.trim().to_string())
}

fn confirm(msg: &str) -> Result<bool> {
    let response = print_prompt(msg)?.to_lowercase();
    Ok(response == "y" || response == "yes")
}

fn load_file_config(args: &ArgMatches) -> Result<FileConfig> {
    let config_path = resolve_config_path(args.get_one::<String>("config").map(String::as_str));
    debug!("Using config {}", config_path.display());
    Ok(load_config_or_default(&config_path)?)
}

pub fn handle_init(args: &ArgMatches) -> Result<ExitCode> {
    print_divider();
    println!("{}", "  SEOSCOPE INITIALIZATION".bright_white().bold());
    print_divider();
    println!();

    let dir = args
        .get_one::<String>("PATH")
        .map(String::as_str)
        .unwrap_or("~/.config/seoscope/");
    let force = args.get_flag("force");
    let config_dir = expand_config_dir(dir);
    let config_path = config_dir.join(CONFIG_FILE_NAME);

    println!(
        "{} Target: {}",
        "→".blue(),
        config_dir.display().to_string().bright_white()
    );
    println!();

    if config_path.exists() && !force {
        println!("{}", "⚠ WARNING".yellow().bold());
        println!("A config file already exists:");
        println!(
            "  {} {}",
            "•".yellow(),
            config_path.display().to_string().bright_white()
        );
        println!();

        let proceed = confirm("Do you want to overwrite it? [y/N]:")?;
        println!();

        if !proceed {
            println!("{} Initialization cancelled.", "✗".red().bold());
            return Ok(ExitCode::SUCCESS);
        }
    }

    let written = write_default_config(&config_dir)?;

    print_divider();
    println!("{}", "  INITIALIZATION COMPLETE".green().bold());
    print_divider();
    println!();
    println!(
        "{} Config: {}",
        "✓".green().bold(),
        written.display().to_string().bright_white()
    );
    println!(
        "{} Set {} and {} in your environment or a .env file.",
        "ℹ".blue(),
        "OPENAI_API_KEY".bright_white(),
        "SERPER_API_KEY".bright_white()
    );
    println!();

    Ok(ExitCode::SUCCESS)
}

/// Keyword and URL from flags, or from interactive prompts when `-k` is absent.
fn collect_request(args: &ArgMatches) -> Result<AnalysisRequest> {
    let url_arg = args.get_one::<String>("url").cloned();

    let (keyword, url) = match args.get_one::<String>("keyword") {
        Some(keyword) => (keyword.clone(), url_arg),
        None => {
            let keyword = print_prompt("Inserisci la keyword o l'argomento da analizzare:")?;
            let url = match url_arg {
                Some(url) => Some(url),
                None => Some(print_prompt(
                    "Inserisci l'URL del sito da analizzare (opzionale):",
                )?),
            };
            (keyword, url)
        }
    };

    Ok(AnalysisRequest::new(
        keyword,
        url.as_deref().and_then(normalize_url),
    ))
}

fn progress_bar() -> ProgressBar {
    let pb = ProgressBar::new(100);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.cyan} [{bar:40.cyan/blue}] {pos:>3}% {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓░"),
    );
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

pub async fn handle_analyze(args: &ArgMatches) -> Result<ExitCode> {
    let request = collect_request(args)?;

    if let Err(e @ RunError::MissingKeyword) = request.validated_keyword() {
        eprintln!("{} {}", "⚠".yellow().bold(), e.to_string().yellow());
        return Ok(ExitCode::from(EXIT_MISSING_KEYWORD));
    }

    let format = args
        .get_one::<String>("format")
        .and_then(|f| ReportFormat::from_str(f))
        .unwrap_or(ReportFormat::Text);

    let secrets = AppConfig::from_env()?;
    let mut config = load_file_config(args)?;
    if args.get_flag("strict") {
        config.pipeline.strict = true;
    }

    let analyzer = SeoAnalyzer::from_config(&secrets, &config)?;

    let pb = progress_bar();
    let bar = pb.clone();
    let progress: ProgressCallback = Arc::new(move |step| {
        bar.set_position(step.percent());
        bar.set_message(step.message());
    });

    let report = match analyzer.run(&request, Some(progress)).await {
        Ok(report) => report,
        Err(e) => {
            pb.finish_and_clear();
            return Err(e.into());
        }
    };
    pb.finish_with_message("Analisi completata");

    print_stage_status(&report);

    let rendered = render_report(&report, format)?;

    if let Some(output) = args.get_one::<PathBuf>("output") {
        save_report(&rendered, output)
            .with_context(|| format!("Failed to save report to {}", output.display()))?;
        println!(
            "{} Report saved to {}",
            "✓".green().bold(),
            output.display().to_string().bright_white()
        );
    }

    if args.get_flag("tui") {
        seoscope_tui::run(&report)?;
    } else if args.get_one::<PathBuf>("output").is_none() {
        println!();
        print!("{}", rendered);
    }

    Ok(ExitCode::SUCCESS)
}

fn print_stage_status(report: &PipelineReport) {
    for outcome in report.output.stages() {
        if outcome.succeeded {
            println!("{} {}", "✓".green().bold(), outcome.role);
        } else {
            println!(
                "{} {} {}",
                "⚠".yellow().bold(),
                outcome.role,
                "(nessun output)".yellow()
            );
        }
    }
}

pub async fn handle_audit(args: &ArgMatches) -> Result<ExitCode> {
    let raw = args
        .get_one::<String>("url")
        .map(String::as_str)
        .unwrap_or_default();
    let Some(url) = normalize_url(raw) else {
        eprintln!("{} No URL given", "✗".red().bold());
        return Ok(ExitCode::FAILURE);
    };

    let config = load_file_config(args)?;
    let auditor = SiteAuditor::new(AuditOptions {
        timeout: Duration::from_secs(config.audit.timeout_secs),
        user_agent: config.audit.user_agent.clone(),
    })?;

    println!("{} Auditing {}\n", "→".blue(), url.bright_white());
    let audit = auditor.audit(&url).await;
    println!("{}", format_site_audit(&audit));

    if audit.is_error() {
        Ok(ExitCode::FAILURE)
    } else {
        Ok(ExitCode::SUCCESS)
    }
}
