use async_trait::async_trait;

use crate::domain::entity::audit_entry::{AuditEntry, AuditEntryFilter};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AuditEntryRepository: Send + Sync {
    async fn append(&self, entry: &AuditEntry) -> anyhow::Result<()>;
    /// Returns matching entries, most recent first.
    async fn search(&self, filter: &AuditEntryFilter) -> anyhow::Result<Vec<AuditEntry>>;
}
