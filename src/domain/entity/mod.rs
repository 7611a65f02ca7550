pub mod actor;
pub mod audit_entry;
pub mod audit_log_snapshot;
pub mod delivery_record;
pub mod notification_request;
pub mod notification_stats;
pub mod recipient;

pub use actor::{Actor, ActorRole};
pub use audit_entry::{AuditEntry, AuditEntryFilter, NewAuditEntry};
pub use audit_log_snapshot::AuditLogSnapshot;
pub use delivery_record::{
    DeliveryRecord, DeliveryRecordFilter, DeliveryStatus, DeliveryTransitionError,
};
pub use notification_request::{AudienceSelector, NotificationKind, NotificationRequest, Priority};
pub use notification_stats::NotificationStats;
pub use recipient::{Recipient, RecipientFilter, RecipientRole};
