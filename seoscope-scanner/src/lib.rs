pub mod auditor;
pub mod error;
pub mod result;

pub use auditor::{SiteAuditor, audit_html};
pub use error::{AuditError, error_chain};
pub use result::{META_DESCRIPTION_NOT_FOUND, PageAudit, SiteAudit, TITLE_NOT_FOUND};
