use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::entity::audit_entry::{AuditEntry, AuditEntryFilter};
use crate::domain::entity::delivery_record::{DeliveryRecord, DeliveryRecordFilter};
use crate::domain::entity::recipient::{Recipient, RecipientFilter};
use crate::domain::repository::{
    AuditEntryRepository, DeliveryRecordRepository, RecipientRepository,
};

/// InMemoryRecipientRepository serves a fixed recipient directory, typically
/// loaded from YAML when the server runs without a database.
pub struct InMemoryRecipientRepository {
    recipients: RwLock<Vec<Recipient>>,
}

impl InMemoryRecipientRepository {
    pub fn new(recipients: Vec<Recipient>) -> Self {
        Self {
            recipients: RwLock::new(recipients),
        }
    }

    pub fn from_yaml(content: &str) -> anyhow::Result<Self> {
        let recipients: Vec<Recipient> = serde_yaml::from_str(content)?;
        ensure_unique_ids(&recipients)?;
        Ok(Self::new(recipients))
    }

    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read recipients file {}: {}", path, e))?;
        Self::from_yaml(&content)
    }
}

#[async_trait]
impl RecipientRepository for InMemoryRecipientRepository {
    async fn find(&self, filter: &RecipientFilter) -> anyhow::Result<Vec<Recipient>> {
        let recipients = self.recipients.read().await;
        let mut matched: Vec<Recipient> = recipients
            .iter()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect();
        matched.sort_by(|a, b| {
            a.display_name
                .cmp(&b.display_name)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(matched)
    }
}

/// InMemoryDeliveryRecordRepository keeps records in insertion order.
#[derive(Default)]
pub struct InMemoryDeliveryRecordRepository {
    records: RwLock<Vec<DeliveryRecord>>,
}

impl InMemoryDeliveryRecordRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DeliveryRecordRepository for InMemoryDeliveryRecordRepository {
    async fn find_by_id(&self, id: &Uuid) -> anyhow::Result<Option<DeliveryRecord>> {
        let records = self.records.read().await;
        Ok(records.iter().find(|r| r.id == *id).cloned())
    }

    async fn search(&self, filter: &DeliveryRecordFilter) -> anyhow::Result<Vec<DeliveryRecord>> {
        let records = self.records.read().await;
        Ok(records.iter().filter(|r| filter.matches(r)).cloned().collect())
    }

    async fn create(&self, record: &DeliveryRecord) -> anyhow::Result<()> {
        let mut records = self.records.write().await;
        if records.iter().any(|r| {
            r.id == record.id
                || (r.notification_id == record.notification_id
                    && r.recipient_id == record.recipient_id)
        }) {
            anyhow::bail!(
                "delivery record already exists for notification {} and recipient {}",
                record.notification_id,
                record.recipient_id
            );
        }
        records.push(record.clone());
        Ok(())
    }

    async fn finalize(&self, record: &DeliveryRecord) -> anyhow::Result<bool> {
        let mut records = self.records.write().await;
        match records.iter_mut().find(|r| r.id == record.id) {
            Some(stored) if !stored.status.is_terminal() => {
                *stored = record.clone();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn purge(&self, before: DateTime<Utc>) -> anyhow::Result<u64> {
        let mut records = self.records.write().await;
        let len_before = records.len();
        records.retain(|r| r.created_at >= before);
        Ok((len_before - records.len()) as u64)
    }
}

/// InMemoryAuditEntryRepository is an append-only list; entries carry their
/// append sequence for tie-breaking.
#[derive(Default)]
pub struct InMemoryAuditEntryRepository {
    entries: RwLock<Vec<(u64, AuditEntry)>>,
}

impl InMemoryAuditEntryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AuditEntryRepository for InMemoryAuditEntryRepository {
    async fn append(&self, entry: &AuditEntry) -> anyhow::Result<()> {
        let mut entries = self.entries.write().await;
        let seq = entries.len() as u64;
        entries.push((seq, entry.clone()));
        Ok(())
    }

    async fn search(&self, filter: &AuditEntryFilter) -> anyhow::Result<Vec<AuditEntry>> {
        let entries = self.entries.read().await;
        let mut matched: Vec<&(u64, AuditEntry)> =
            entries.iter().filter(|(_, e)| filter.matches(e)).collect();
        matched.sort_by(|(seq_a, a), (seq_b, b)| {
            b.timestamp.cmp(&a.timestamp).then_with(|| seq_b.cmp(seq_a))
        });
        Ok(matched.into_iter().map(|(_, e)| e.clone()).collect())
    }
}

fn ensure_unique_ids(recipients: &[Recipient]) -> anyhow::Result<()> {
    let mut seen = HashSet::with_capacity(recipients.len());
    for r in recipients {
        if !seen.insert(r.id.as_str()) {
            anyhow::bail!("duplicate recipient id: {}", r.id);
        }
    }
    Ok(())
}
