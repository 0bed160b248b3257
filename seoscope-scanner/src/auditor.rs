use crate::error::{AuditError, Result, error_chain};
use crate::result::{META_DESCRIPTION_NOT_FOUND, PageAudit, SiteAudit, TITLE_NOT_FOUND};
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use url::Url;

pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_USER_AGENT: &str = concat!("seoscope/", env!("CARGO_PKG_VERSION"));

static TITLE_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("title").expect("static title selector"));
static META_DESCRIPTION_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#"meta[name="description"]"#).expect("static meta description selector")
});
static HEADING_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("h1, h2, h3").expect("static heading selector"));

/// Fetch settings for the auditor.
#[derive(Debug, Clone)]
pub struct AuditOptions {
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for AuditOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// Fetches one page and pulls out the on-page SEO basics.
///
/// No JavaScript, no redirects beyond a small limit, no link following.
pub struct SiteAuditor {
    client: Client,
    timeout: Duration,
}

impl SiteAuditor {
    pub fn new(options: AuditOptions) -> Result<Self> {
        let client = Client::builder()
            .user_agent(options.user_agent)
            .timeout(options.timeout)
            .connect_timeout(options.timeout)
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()
            .map_err(|e| AuditError::Client(e.to_string()))?;

        Ok(Self {
            client,
            timeout: options.timeout,
        })
    }

    pub fn with_timeout(timeout_secs: u64) -> Result<Self> {
        Self::new(AuditOptions {
            timeout: Duration::from_secs(timeout_secs),
            ..AuditOptions::default()
        })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Audits `url`, folding every failure into [`SiteAudit::Failed`].
    pub async fn audit(&self, url: &str) -> SiteAudit {
        match self.try_audit(url).await {
            Ok(page) => SiteAudit::Page(page),
            Err(e) => {
                let message = error_chain(&e);
                warn!("Site audit failed for {}: {}", url, message);
                SiteAudit::failed(message)
            }
        }
    }

    /// Audits `url`, returning the failure as a typed error.
    pub async fn try_audit(&self, url: &str) -> Result<PageAudit> {
        let parsed = Url::parse(url.trim()).map_err(|e| AuditError::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(AuditError::UnsupportedScheme(parsed.scheme().to_string()));
        }

        info!("Auditing {}", parsed);
        let start = Instant::now();
        let response = self
            .client
            .get(parsed.as_str())
            .send()
            .await?
            .error_for_status()?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        debug!(
            "Fetched {} (status {}, {} bytes) in {:?}",
            parsed,
            status,
            body.len(),
            start.elapsed()
        );

        let page = audit_html(&body);
        debug!(
            "Audit of {}: title={:?}, {} headings",
            parsed,
            page.title,
            page.headings.len()
        );
        Ok(page)
    }
}

/// Extracts title, meta description and h1/h2/h3 texts from an HTML document.
pub fn audit_html(html: &str) -> PageAudit {
    let document = Html::parse_document(html);

    let title = document
        .select(&TITLE_SELECTOR)
        .next()
        .map(|el| element_text(&el))
        .filter(|text| !text.is_empty())
        .unwrap_or_else(|| TITLE_NOT_FOUND.to_string());

    let meta_description = document
        .select(&META_DESCRIPTION_SELECTOR)
        .next()
        .and_then(|el| el.value().attr("content"))
        .map(str::trim)
        .filter(|content| !content.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| META_DESCRIPTION_NOT_FOUND.to_string());

    let headings = document
        .select(&HEADING_SELECTOR)
        .map(|el| element_text(&el))
        .collect();

    PageAudit {
        title,
        meta_description,
        headings,
    }
}

fn element_text(element: &ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}
