use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::notification_request::NotificationKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    Pending,
    Sent,
    Failed,
}

impl DeliveryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryStatus::Pending => "pending",
            DeliveryStatus::Sent => "sent",
            DeliveryStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, DeliveryStatus::Pending)
    }
}

impl std::fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DeliveryStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(DeliveryStatus::Pending),
            "sent" => Ok(DeliveryStatus::Sent),
            "failed" => Ok(DeliveryStatus::Failed),
            other => Err(format!("unknown delivery status: {}", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeliveryTransitionError {
    #[error("delivery record {id} already finalized as {status}")]
    AlreadyFinalized { id: Uuid, status: DeliveryStatus },
}

/// DeliveryRecord is the outcome of one (notification, recipient) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryRecord {
    pub id: Uuid,
    pub notification_id: Uuid,
    pub notification_kind: NotificationKind,
    pub recipient_id: String,
    pub contact_address: String,
    pub rendered_message: String,
    pub status: DeliveryStatus,
    pub attempts: u32,
    pub external_message_id: Option<String>,
    pub error_reason: Option<String>,
    pub attempted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl DeliveryRecord {
    pub fn new(
        notification_id: Uuid,
        notification_kind: NotificationKind,
        recipient_id: String,
        contact_address: String,
        rendered_message: String,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            notification_id,
            notification_kind,
            recipient_id,
            contact_address,
            rendered_message,
            status: DeliveryStatus::Pending,
            attempts: 0,
            external_message_id: None,
            error_reason: None,
            attempted_at: None,
            created_at: Utc::now(),
        }
    }

    pub fn mark_sent(
        &mut self,
        external_message_id: String,
        attempts: u32,
    ) -> Result<(), DeliveryTransitionError> {
        self.ensure_pending()?;
        self.status = DeliveryStatus::Sent;
        self.external_message_id = Some(external_message_id);
        self.attempts = attempts;
        self.attempted_at = Some(Utc::now());
        Ok(())
    }

    pub fn mark_failed(
        &mut self,
        reason: String,
        attempts: u32,
    ) -> Result<(), DeliveryTransitionError> {
        self.ensure_pending()?;
        self.status = DeliveryStatus::Failed;
        self.error_reason = Some(reason);
        self.attempts = attempts;
        self.attempted_at = Some(Utc::now());
        Ok(())
    }

    fn ensure_pending(&self) -> Result<(), DeliveryTransitionError> {
        if self.status.is_terminal() {
            return Err(DeliveryTransitionError::AlreadyFinalized {
                id: self.id,
                status: self.status,
            });
        }
        Ok(())
    }
}

/// DeliveryRecordFilter selects ledger rows. `search` matches the rendered
/// message or the contact address, case-insensitively.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct DeliveryRecordFilter {
    pub notification_id: Option<Uuid>,
    pub kind: Option<NotificationKind>,
    pub status: Option<DeliveryStatus>,
    pub search: Option<String>,
}

impl DeliveryRecordFilter {
    pub fn for_notification(notification_id: Uuid) -> Self {
        Self {
            notification_id: Some(notification_id),
            ..Default::default()
        }
    }

    pub fn matches(&self, record: &DeliveryRecord) -> bool {
        if let Some(id) = self.notification_id {
            if record.notification_id != id {
                return false;
            }
        }
        if let Some(kind) = self.kind {
            if record.notification_kind != kind {
                return false;
            }
        }
        if let Some(status) = self.status {
            if record.status != status {
                return false;
            }
        }
        if let Some(ref search) = self.search {
            let needle = search.to_lowercase();
            if !needle.is_empty()
                && !record.rendered_message.to_lowercase().contains(&needle)
                && !record.contact_address.to_lowercase().contains(&needle)
            {
                return false;
            }
        }
        true
    }
}
