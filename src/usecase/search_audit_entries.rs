use std::sync::Arc;

use crate::domain::entity::actor::Actor;
use crate::domain::entity::audit_entry::{AuditEntry, AuditEntryFilter};
use crate::domain::repository::AuditEntryRepository;
use crate::domain::service::AccessPolicy;

#[derive(Debug, thiserror::Error)]
pub enum SearchAuditEntriesError {
    #[error("actor '{0}' may not view the audit log")]
    PermissionDenied(String),

    #[error("internal error: {0}")]
    Internal(String),
}

/// SearchAuditEntriesUseCase returns matching audit entries, most recent first.
pub struct SearchAuditEntriesUseCase {
    audit_repo: Arc<dyn AuditEntryRepository>,
}

impl SearchAuditEntriesUseCase {
    pub fn new(audit_repo: Arc<dyn AuditEntryRepository>) -> Self {
        Self { audit_repo }
    }

    pub async fn execute(
        &self,
        actor: &Actor,
        filter: &AuditEntryFilter,
    ) -> Result<Vec<AuditEntry>, SearchAuditEntriesError> {
        if !AccessPolicy::can_view_audit_log(actor) {
            return Err(SearchAuditEntriesError::PermissionDenied(
                actor.role.to_string(),
            ));
        }
        self.audit_repo
            .search(filter)
            .await
            .map_err(|e| SearchAuditEntriesError::Internal(e.to_string()))
    }
}
