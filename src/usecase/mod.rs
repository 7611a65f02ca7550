pub mod cancel_dispatch;
pub mod dispatch_notification;
pub mod export_audit_log;
pub mod get_notification_stats;
pub mod list_delivery_records;
pub mod purge_delivery_records;
pub mod record_metric_change;
pub mod search_audit_entries;

pub use cancel_dispatch::CancelDispatchUseCase;
pub use dispatch_notification::DispatchNotificationUseCase;
pub use export_audit_log::ExportAuditLogUseCase;
pub use get_notification_stats::GetNotificationStatsUseCase;
pub use list_delivery_records::ListDeliveryRecordsUseCase;
pub use purge_delivery_records::PurgeDeliveryRecordsUseCase;
pub use record_metric_change::RecordMetricChangeUseCase;
pub use search_audit_entries::SearchAuditEntriesUseCase;
