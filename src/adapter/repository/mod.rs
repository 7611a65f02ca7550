pub mod audit_entry_postgres;
pub mod delivery_record_postgres;
pub mod in_memory;
pub mod recipient_postgres;

/// Case-insensitive literal substring test on `column` against bind
/// parameter `$bind`. `%`, `_` and `\` in the search text match themselves.
pub(crate) fn contains_ignore_case(column: &str, bind: u32) -> String {
    format!("strpos(lower({}), lower(${})) > 0", column, bind)
}

pub use audit_entry_postgres::AuditEntryPostgresRepository;
pub use delivery_record_postgres::DeliveryRecordPostgresRepository;
pub use in_memory::{
    InMemoryAuditEntryRepository, InMemoryDeliveryRecordRepository, InMemoryRecipientRepository,
};
pub use recipient_postgres::RecipientPostgresRepository;
