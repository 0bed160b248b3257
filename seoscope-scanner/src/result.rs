use serde::{Deserialize, Serialize};

/// Placeholder used when a page has no usable `<title>`.
pub const TITLE_NOT_FOUND: &str = "Titolo non trovato";

/// Placeholder used when a page has no `<meta name="description">` content.
pub const META_DESCRIPTION_NOT_FOUND: &str = "Meta description non trovata";

/// On-page elements extracted from a single fetched document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageAudit {
    pub title: String,
    pub meta_description: String,
    /// Text of every h1/h2/h3 in document order, duplicates included.
    pub headings: Vec<String>,
}

/// Outcome of auditing one URL.
///
/// Serialized untagged, so a successful audit is
/// `{"title": .., "meta_description": .., "headings": [..]}` and a failed one
/// is `{"error": ".."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SiteAudit {
    Page(PageAudit),
    Failed { error: String },
}

impl SiteAudit {
    pub fn failed(error: impl Into<String>) -> Self {
        SiteAudit::Failed {
            error: error.into(),
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            SiteAudit::Failed { error } => Some(error),
            SiteAudit::Page(_) => None,
        }
    }

    pub fn page(&self) -> Option<&PageAudit> {
        match self {
            SiteAudit::Page(page) => Some(page),
            SiteAudit::Failed { .. } => None,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, SiteAudit::Failed { .. })
    }
}

impl From<PageAudit> for SiteAudit {
    fn from(page: PageAudit) -> Self {
        SiteAudit::Page(page)
    }
}
