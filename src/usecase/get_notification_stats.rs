use std::sync::Arc;

use crate::domain::entity::actor::Actor;
use crate::domain::entity::delivery_record::DeliveryRecordFilter;
use crate::domain::entity::notification_stats::NotificationStats;
use crate::domain::service::{AccessPolicy, NotificationLedger};

#[derive(Debug, thiserror::Error)]
pub enum GetNotificationStatsError {
    #[error("actor '{0}' may not view notification stats")]
    PermissionDenied(String),

    #[error("internal error: {0}")]
    Internal(String),
}

/// GetNotificationStatsUseCase recomputes delivery stats from the ledger.
pub struct GetNotificationStatsUseCase {
    ledger: Arc<NotificationLedger>,
}

impl GetNotificationStatsUseCase {
    pub fn new(ledger: Arc<NotificationLedger>) -> Self {
        Self { ledger }
    }

    pub async fn execute(
        &self,
        actor: &Actor,
        filter: &DeliveryRecordFilter,
    ) -> Result<NotificationStats, GetNotificationStatsError> {
        if !AccessPolicy::can_manage_notifications(actor) {
            return Err(GetNotificationStatsError::PermissionDenied(
                actor.role.to_string(),
            ));
        }
        self.ledger
            .stats(filter)
            .await
            .map_err(|e| GetNotificationStatsError::Internal(e.to_string()))
    }
}
