pub mod audit_entry_repository;
pub mod delivery_record_repository;
pub mod recipient_repository;

pub use audit_entry_repository::AuditEntryRepository;
pub use delivery_record_repository::DeliveryRecordRepository;
pub use recipient_repository::RecipientRepository;
