use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::audit_entry::{AuditEntry, AuditEntryFilter};

/// AuditLogSnapshot is the exported form of the audit log: the entries that
/// matched a filter at export time, most recent first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditLogSnapshot {
    pub exported_at: DateTime<Utc>,
    pub filter: AuditEntryFilter,
    pub entry_count: usize,
    pub entries: Vec<AuditEntry>,
}

impl AuditLogSnapshot {
    pub fn new(filter: AuditEntryFilter, entries: Vec<AuditEntry>) -> Self {
        Self {
            exported_at: Utc::now(),
            filter,
            entry_count: entries.len(),
            entries,
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn parse(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Attachment name, e.g. `audit-log-20260301T093000Z.json`.
    pub fn file_name(&self) -> String {
        format!("audit-log-{}.json", self.exported_at.format("%Y%m%dT%H%M%SZ"))
    }
}
