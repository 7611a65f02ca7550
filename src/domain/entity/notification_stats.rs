use serde::{Deserialize, Serialize};

use super::delivery_record::{DeliveryRecord, DeliveryStatus};

/// NotificationStats is derived from delivery records on every call and is
/// never stored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct NotificationStats {
    pub total: u64,
    pub sent: u64,
    pub failed: u64,
    pub pending: u64,
    /// sent / total, 0.0 for an empty set.
    pub success_rate: f64,
}

impl NotificationStats {
    pub fn from_records<'a, I>(records: I) -> Self
    where
        I: IntoIterator<Item = &'a DeliveryRecord>,
    {
        let mut stats = Self::default();
        for record in records {
            stats.total += 1;
            match record.status {
                DeliveryStatus::Pending => stats.pending += 1,
                DeliveryStatus::Sent => stats.sent += 1,
                DeliveryStatus::Failed => stats.failed += 1,
            }
        }
        stats.success_rate = if stats.total == 0 {
            0.0
        } else {
            stats.sent as f64 / stats.total as f64
        };
        stats
    }
}
