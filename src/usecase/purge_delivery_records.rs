use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::domain::entity::actor::Actor;
use crate::domain::service::{AccessPolicy, NotificationLedger};

#[derive(Debug, thiserror::Error)]
pub enum PurgeDeliveryRecordsError {
    #[error("actor '{0}' may not purge delivery history")]
    PermissionDenied(String),

    #[error("purge cutoff {0} is in the future")]
    CutoffInFuture(DateTime<Utc>),

    #[error("internal error: {0}")]
    Internal(String),
}

/// PurgeDeliveryRecordsUseCase deletes delivery records created before a
/// cutoff. Admin only.
pub struct PurgeDeliveryRecordsUseCase {
    ledger: Arc<NotificationLedger>,
}

impl PurgeDeliveryRecordsUseCase {
    pub fn new(ledger: Arc<NotificationLedger>) -> Self {
        Self { ledger }
    }

    pub async fn execute(
        &self,
        actor: &Actor,
        before: DateTime<Utc>,
    ) -> Result<u64, PurgeDeliveryRecordsError> {
        if !AccessPolicy::can_purge_history(actor) {
            return Err(PurgeDeliveryRecordsError::PermissionDenied(
                actor.role.to_string(),
            ));
        }
        if before > Utc::now() {
            return Err(PurgeDeliveryRecordsError::CutoffInFuture(before));
        }
        let removed = self
            .ledger
            .purge(before)
            .await
            .map_err(|e| PurgeDeliveryRecordsError::Internal(e.to_string()))?;
        tracing::info!(actor_id = %actor.id, before = %before, removed, "delivery records purged");
        Ok(removed)
    }
}
