use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Attendance,
    FeePayment,
    Marks,
    Emergency,
    General,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::Attendance => "attendance",
            NotificationKind::FeePayment => "fee_payment",
            NotificationKind::Marks => "marks",
            NotificationKind::Emergency => "emergency",
            NotificationKind::General => "general",
        }
    }
}

impl std::fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for NotificationKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "attendance" => Ok(NotificationKind::Attendance),
            "fee_payment" => Ok(NotificationKind::FeePayment),
            "marks" => Ok(NotificationKind::Marks),
            "emergency" => Ok(NotificationKind::Emergency),
            "general" => Ok(NotificationKind::General),
            other => Err(format!("unknown notification kind: {}", other)),
        }
    }
}

/// AudienceSelector names the group a notification is fanned out to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AudienceSelector {
    All,
    Students,
    Faculty,
    /// Resolved against the acting user's department.
    Department,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

/// NotificationRequest is one logical notification. The dispatcher only
/// borrows it, so it cannot change once a dispatch has begun.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationRequest {
    pub id: Uuid,
    pub kind: NotificationKind,
    pub audience: AudienceSelector,
    pub title: String,
    pub payload: serde_json::Map<String, serde_json::Value>,
    pub priority: Priority,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

impl NotificationRequest {
    pub fn new(
        kind: NotificationKind,
        audience: AudienceSelector,
        title: String,
        payload: serde_json::Map<String, serde_json::Value>,
        priority: Priority,
        created_by: String,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            audience,
            title,
            payload,
            priority,
            created_by,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_parses_wire_names() {
        assert_eq!(
            "fee_payment".parse::<NotificationKind>().unwrap(),
            NotificationKind::FeePayment
        );
        assert!("sms".parse::<NotificationKind>().is_err());
    }

    #[test]
    fn test_request_deserializes_from_json() {
        let json = serde_json::json!({
            "id": Uuid::new_v4(),
            "kind": "marks",
            "audience": "department",
            "title": "Mid-term results",
            "payload": {"subject": "Physics"},
            "priority": "high",
            "created_by": "hod-1",
            "created_at": "2026-01-10T08:00:00Z"
        });
        let req: NotificationRequest = serde_json::from_value(json).unwrap();
        assert_eq!(req.kind, NotificationKind::Marks);
        assert_eq!(req.audience, AudienceSelector::Department);
        assert_eq!(req.priority, Priority::High);
        assert_eq!(req.payload["subject"], "Physics");
    }
}
