use std::sync::Arc;

use crate::domain::entity::actor::Actor;
use crate::domain::entity::audit_entry::AuditEntryFilter;
use crate::domain::entity::audit_log_snapshot::AuditLogSnapshot;
use crate::domain::repository::AuditEntryRepository;
use crate::domain::service::AccessPolicy;

#[derive(Debug, thiserror::Error)]
pub enum ExportAuditLogError {
    #[error("actor '{0}' may not export the audit log")]
    PermissionDenied(String),

    #[error("internal error: {0}")]
    Internal(String),
}

/// ExportAuditLogUseCase captures the filtered audit log as a snapshot.
pub struct ExportAuditLogUseCase {
    audit_repo: Arc<dyn AuditEntryRepository>,
}

impl ExportAuditLogUseCase {
    pub fn new(audit_repo: Arc<dyn AuditEntryRepository>) -> Self {
        Self { audit_repo }
    }

    pub async fn execute(
        &self,
        actor: &Actor,
        filter: AuditEntryFilter,
    ) -> Result<AuditLogSnapshot, ExportAuditLogError> {
        if !AccessPolicy::can_view_audit_log(actor) {
            return Err(ExportAuditLogError::PermissionDenied(
                actor.role.to_string(),
            ));
        }
        let entries = self
            .audit_repo
            .search(&filter)
            .await
            .map_err(|e| ExportAuditLogError::Internal(e.to_string()))?;
        tracing::info!(actor_id = %actor.id, entries = entries.len(), "audit log exported");
        Ok(AuditLogSnapshot::new(filter, entries))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entity::actor::ActorRole;
    use crate::domain::entity::audit_entry::{AuditEntry, NewAuditEntry};
    use crate::domain::repository::audit_entry_repository::MockAuditEntryRepository;

    #[tokio::test]
    async fn test_export_round_trip() {
        let director = Actor::new("dir-1", "Director", ActorRole::Director, None);
        let entry = AuditEntry::new(
            &director,
            NewAuditEntry {
                metric_type: "fees".to_string(),
                metric_name: "Term 2 collection".to_string(),
                previous_value: Some(200000.0),
                new_value: 250000.0,
                department: None,
            },
        );
        let stored = vec![entry];
        let expected = stored.clone();
        let mut mock = MockAuditEntryRepository::new();
        mock.expect_search().returning(move |_| Ok(stored.clone()));

        let uc = ExportAuditLogUseCase::new(Arc::new(mock));
        let snapshot = uc
            .execute(&director, AuditEntryFilter::default())
            .await
            .unwrap();
        let parsed = AuditLogSnapshot::parse(&snapshot.to_json().unwrap()).unwrap();
        assert_eq!(parsed.entries, expected);
        assert_eq!(parsed.entries[0].percentage_change, Some(25.0));
    }

    #[tokio::test]
    async fn test_student_denied() {
        let mut mock = MockAuditEntryRepository::new();
        mock.expect_search().never();
        let uc = ExportAuditLogUseCase::new(Arc::new(mock));
        let student = Actor::new("stu-1", "Student", ActorRole::Student, None);
        assert!(matches!(
            uc.execute(&student, AuditEntryFilter::default()).await,
            Err(ExportAuditLogError::PermissionDenied(_))
        ));
    }
}
