use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::actor::{Actor, ActorRole};

/// AuditEntry is an immutable record of one metric value change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub actor_id: String,
    pub actor_name: String,
    pub actor_role: ActorRole,
    pub metric_type: String,
    pub metric_name: String,
    pub previous_value: Option<f64>,
    pub new_value: f64,
    pub percentage_change: Option<f64>,
    #[serde(default)]
    pub department: Option<String>,
}

/// NewAuditEntry is the caller-supplied part of an audit entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAuditEntry {
    pub metric_type: String,
    pub metric_name: String,
    #[serde(default)]
    pub previous_value: Option<f64>,
    pub new_value: f64,
    #[serde(default)]
    pub department: Option<String>,
}

impl AuditEntry {
    pub fn new(actor: &Actor, input: NewAuditEntry) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            actor_id: actor.id.clone(),
            actor_name: actor.name.clone(),
            actor_role: actor.role,
            percentage_change: percentage_change(input.previous_value, input.new_value),
            metric_type: input.metric_type,
            metric_name: input.metric_name,
            previous_value: input.previous_value,
            new_value: input.new_value,
            department: input.department,
        }
    }
}

/// Percentage change from `previous` to `new`.
///
/// `None` when there is no previous value (first value of a metric) and when
/// the previous value is zero, where the ratio is undefined. The two cases
/// stay distinguishable through `previous_value`.
pub fn percentage_change(previous: Option<f64>, new: f64) -> Option<f64> {
    match previous {
        None => None,
        Some(prev) if prev == 0.0 => None,
        Some(prev) => Some((new - prev) / prev * 100.0),
    }
}

/// AuditEntryFilter narrows audit queries and exports.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuditEntryFilter {
    /// Case-insensitive match on metric name, metric type, actor name or department.
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub metric_type: Option<String>,
    #[serde(default)]
    pub actor_name: Option<String>,
}

impl AuditEntryFilter {
    pub fn matches(&self, entry: &AuditEntry) -> bool {
        if let Some(ref metric_type) = self.metric_type {
            if !metric_type.is_empty() && entry.metric_type != *metric_type {
                return false;
            }
        }
        if let Some(ref actor_name) = self.actor_name {
            if !actor_name.is_empty()
                && !entry
                    .actor_name
                    .to_lowercase()
                    .contains(&actor_name.to_lowercase())
            {
                return false;
            }
        }
        if let Some(ref search) = self.search {
            let needle = search.to_lowercase();
            if !needle.is_empty() {
                let hit = entry.metric_name.to_lowercase().contains(&needle)
                    || entry.metric_type.to_lowercase().contains(&needle)
                    || entry.actor_name.to_lowercase().contains(&needle)
                    || entry
                        .department
                        .as_deref()
                        .is_some_and(|d| d.to_lowercase().contains(&needle));
                if !hit {
                    return false;
                }
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn actor() -> Actor {
        Actor::new("hod-1", "Meera Iyer", ActorRole::Hod, Some("CSE".to_string()))
    }

    fn input(previous: Option<f64>, new: f64) -> NewAuditEntry {
        NewAuditEntry {
            metric_type: "attendance".to_string(),
            metric_name: "CSE-A average attendance".to_string(),
            previous_value: previous,
            new_value: new,
            department: Some("CSE".to_string()),
        }
    }

    #[test]
    fn test_new_metric_has_no_percentage_change() {
        let entry = AuditEntry::new(&actor(), input(None, 72.0));
        assert!(entry.previous_value.is_none());
        assert!(entry.percentage_change.is_none());
    }

    #[test]
    fn test_percentage_change_100_to_150_is_50() {
        let entry = AuditEntry::new(&actor(), input(Some(100.0), 150.0));
        assert_eq!(entry.percentage_change, Some(50.0));
    }

    #[test]
    fn test_decrease_is_negative() {
        assert_eq!(percentage_change(Some(80.0), 60.0), Some(-25.0));
    }

    #[test]
    fn test_zero_previous_is_guarded() {
        let entry = AuditEntry::new(&actor(), input(Some(0.0), 10.0));
        assert_eq!(entry.previous_value, Some(0.0));
        assert!(entry.percentage_change.is_none());
    }

    #[test]
    fn test_entry_copies_actor() {
        let entry = AuditEntry::new(&actor(), input(None, 1.0));
        assert_eq!(entry.actor_id, "hod-1");
        assert_eq!(entry.actor_name, "Meera Iyer");
        assert_eq!(entry.actor_role, ActorRole::Hod);
    }

    #[test]
    fn test_filter_matches() {
        let entry = AuditEntry::new(&actor(), input(Some(1.0), 2.0));
        let by_type = AuditEntryFilter {
            metric_type: Some("attendance".to_string()),
            ..Default::default()
        };
        let by_actor = AuditEntryFilter {
            actor_name: Some("meera".to_string()),
            ..Default::default()
        };
        let by_search = AuditEntryFilter {
            search: Some("cse-a".to_string()),
            ..Default::default()
        };
        let miss = AuditEntryFilter {
            metric_type: Some("fee".to_string()),
            ..Default::default()
        };
        assert!(by_type.matches(&entry));
        assert!(by_actor.matches(&entry));
        assert!(by_search.matches(&entry));
        assert!(!miss.matches(&entry));
    }
}
