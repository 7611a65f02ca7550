use std::sync::Arc;

use crate::domain::entity::actor::Actor;
use crate::domain::entity::audit_entry::{AuditEntry, NewAuditEntry};
use crate::domain::repository::AuditEntryRepository;
use crate::infrastructure::event_bus::{NotificationEvent, NotificationEventBus};

#[derive(Debug, thiserror::Error)]
pub enum RecordMetricChangeError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("audit log write failed: {0}")]
    Persistence(String),
}

/// RecordMetricChangeUseCase appends one entry to the audit log.
///
/// Any authenticated actor may record a change to a metric they updated.
/// A failed append is returned to the caller, never swallowed.
pub struct RecordMetricChangeUseCase {
    audit_repo: Arc<dyn AuditEntryRepository>,
    event_bus: Arc<NotificationEventBus>,
}

impl RecordMetricChangeUseCase {
    pub fn new(
        audit_repo: Arc<dyn AuditEntryRepository>,
        event_bus: Arc<NotificationEventBus>,
    ) -> Self {
        Self {
            audit_repo,
            event_bus,
        }
    }

    pub async fn execute(
        &self,
        actor: &Actor,
        input: NewAuditEntry,
    ) -> Result<AuditEntry, RecordMetricChangeError> {
        validate(&input)?;

        let entry = AuditEntry::new(actor, input);
        self.audit_repo
            .append(&entry)
            .await
            .map_err(|e| RecordMetricChangeError::Persistence(e.to_string()))?;

        self.event_bus
            .publish(NotificationEvent::AuditEntryAppended {
                entry: entry.clone(),
            })
            .await;

        Ok(entry)
    }
}

fn validate(input: &NewAuditEntry) -> Result<(), RecordMetricChangeError> {
    if input.metric_type.trim().is_empty() {
        return Err(RecordMetricChangeError::Validation(
            "metric_type is required".to_string(),
        ));
    }
    if input.metric_name.trim().is_empty() {
        return Err(RecordMetricChangeError::Validation(
            "metric_name is required".to_string(),
        ));
    }
    if !input.new_value.is_finite() {
        return Err(RecordMetricChangeError::Validation(
            "new_value must be a finite number".to_string(),
        ));
    }
    if input.previous_value.is_some_and(|v| !v.is_finite()) {
        return Err(RecordMetricChangeError::Validation(
            "previous_value must be a finite number".to_string(),
        ));
    }
    Ok(())
}
