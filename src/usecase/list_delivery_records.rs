use std::sync::Arc;

use crate::domain::entity::actor::Actor;
use crate::domain::entity::delivery_record::{DeliveryRecord, DeliveryRecordFilter};
use crate::domain::service::{AccessPolicy, NotificationLedger};

#[derive(Debug, thiserror::Error)]
pub enum ListDeliveryRecordsError {
    #[error("actor '{0}' may not view delivery records")]
    PermissionDenied(String),

    #[error("internal error: {0}")]
    Internal(String),
}

pub struct ListDeliveryRecordsUseCase {
    ledger: Arc<NotificationLedger>,
}

impl ListDeliveryRecordsUseCase {
    pub fn new(ledger: Arc<NotificationLedger>) -> Self {
        Self { ledger }
    }

    pub async fn execute(
        &self,
        actor: &Actor,
        filter: &DeliveryRecordFilter,
    ) -> Result<Vec<DeliveryRecord>, ListDeliveryRecordsError> {
        if !AccessPolicy::can_manage_notifications(actor) {
            return Err(ListDeliveryRecordsError::PermissionDenied(
                actor.role.to_string(),
            ));
        }
        self.ledger
            .query(filter)
            .await
            .map_err(|e| ListDeliveryRecordsError::Internal(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entity::actor::ActorRole;
    use crate::domain::entity::delivery_record::DeliveryStatus;
    use crate::domain::entity::notification_request::NotificationKind;
    use crate::domain::repository::delivery_record_repository::MockDeliveryRecordRepository;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_passes_filter_to_store() {
        let mut mock = MockDeliveryRecordRepository::new();
        mock.expect_search()
            .withf(|f| f.status == Some(DeliveryStatus::Failed))
            .returning(|_| {
                let mut record = DeliveryRecord::new(
                    Uuid::new_v4(),
                    NotificationKind::Emergency,
                    "fac-3".to_string(),
                    "+919000000003".to_string(),
                    "EMERGENCY: Fire drill".to_string(),
                );
                record.mark_failed("rejected".to_string(), 1).unwrap();
                Ok(vec![record])
            });

        let uc = ListDeliveryRecordsUseCase::new(Arc::new(NotificationLedger::new(Arc::new(mock))));
        let director = Actor::new("dir-1", "Director", ActorRole::Director, None);
        let filter = DeliveryRecordFilter {
            status: Some(DeliveryStatus::Failed),
            ..Default::default()
        };
        let records = uc.execute(&director, &filter).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].recipient_id, "fac-3");
    }

    #[tokio::test]
    async fn test_student_denied() {
        let mut mock = MockDeliveryRecordRepository::new();
        mock.expect_search().never();
        let uc = ListDeliveryRecordsUseCase::new(Arc::new(NotificationLedger::new(Arc::new(mock))));
        let student = Actor::new("stu-1", "Student", ActorRole::Student, None);
        let result = uc.execute(&student, &DeliveryRecordFilter::default()).await;
        assert!(matches!(
            result,
            Err(ListDeliveryRecordsError::PermissionDenied(_))
        ));
    }
}
