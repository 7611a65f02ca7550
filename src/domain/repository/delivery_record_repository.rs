use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::entity::delivery_record::{DeliveryRecord, DeliveryRecordFilter};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DeliveryRecordRepository: Send + Sync {
    async fn find_by_id(&self, id: &Uuid) -> anyhow::Result<Option<DeliveryRecord>>;
    /// Returns matching records, oldest first.
    async fn search(&self, filter: &DeliveryRecordFilter) -> anyhow::Result<Vec<DeliveryRecord>>;
    async fn create(&self, record: &DeliveryRecord) -> anyhow::Result<()>;
    /// Writes the terminal status of a record. Returns `false` when the
    /// stored record is missing or no longer pending.
    async fn finalize(&self, record: &DeliveryRecord) -> anyhow::Result<bool>;
    /// Deletes records created before `before`. Returns the number removed.
    async fn purge(&self, before: DateTime<Utc>) -> anyhow::Result<u64>;
}
