use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::entity::delivery_record::{DeliveryRecord, DeliveryRecordFilter, DeliveryStatus};
use crate::domain::entity::notification_stats::NotificationStats;
use crate::domain::repository::DeliveryRecordRepository;

#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("delivery record {id} must be {expected} to be {operation}")]
    InvalidState {
        id: Uuid,
        expected: &'static str,
        operation: &'static str,
    },

    #[error("delivery record {0} is missing or already finalized in the store")]
    NotPending(Uuid),

    #[error("ledger store error: {0}")]
    Store(String),
}

/// NotificationLedger is the append-mostly store of delivery outcomes.
///
/// New records go in as `pending`; finalizing a pending record is the only
/// mutation. Stats are recomputed from the stored records on every call.
pub struct NotificationLedger {
    record_repo: Arc<dyn DeliveryRecordRepository>,
}

impl NotificationLedger {
    pub fn new(record_repo: Arc<dyn DeliveryRecordRepository>) -> Self {
        Self { record_repo }
    }

    pub async fn record(&self, record: &DeliveryRecord) -> Result<(), LedgerError> {
        if record.status != DeliveryStatus::Pending {
            return Err(LedgerError::InvalidState {
                id: record.id,
                expected: "pending",
                operation: "recorded",
            });
        }
        self.record_repo
            .create(record)
            .await
            .map_err(|e| LedgerError::Store(e.to_string()))
    }

    pub async fn finalize(&self, record: &DeliveryRecord) -> Result<(), LedgerError> {
        if !record.status.is_terminal() {
            return Err(LedgerError::InvalidState {
                id: record.id,
                expected: "sent or failed",
                operation: "finalized",
            });
        }
        let updated = self
            .record_repo
            .finalize(record)
            .await
            .map_err(|e| LedgerError::Store(e.to_string()))?;
        if !updated {
            return Err(LedgerError::NotPending(record.id));
        }
        Ok(())
    }

    pub async fn query(
        &self,
        filter: &DeliveryRecordFilter,
    ) -> Result<Vec<DeliveryRecord>, LedgerError> {
        self.record_repo
            .search(filter)
            .await
            .map_err(|e| LedgerError::Store(e.to_string()))
    }

    /// Whether any outcome has already been recorded for this notification.
    pub async fn has_records(&self, notification_id: Uuid) -> Result<bool, LedgerError> {
        let records = self
            .query(&DeliveryRecordFilter::for_notification(notification_id))
            .await?;
        Ok(!records.is_empty())
    }

    pub async fn stats(&self, filter: &DeliveryRecordFilter) -> Result<NotificationStats, LedgerError> {
        let records = self.query(filter).await?;
        Ok(NotificationStats::from_records(&records))
    }

    pub async fn purge(&self, before: DateTime<Utc>) -> Result<u64, LedgerError> {
        self.record_repo
            .purge(before)
            .await
            .map_err(|e| LedgerError::Store(e.to_string()))
    }
}
