use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecipientRole {
    Student,
    Faculty,
}

impl RecipientRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecipientRole::Student => "student",
            RecipientRole::Faculty => "faculty",
        }
    }
}

impl std::str::FromStr for RecipientRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "student" => Ok(RecipientRole::Student),
            "faculty" => Ok(RecipientRole::Faculty),
            other => Err(format!("unknown recipient role: {}", other)),
        }
    }
}

/// Recipient is read-only reference data for a student or faculty member.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipient {
    pub id: String,
    #[serde(default)]
    pub contact_address: Option<String>,
    pub display_name: String,
    pub role: RecipientRole,
    #[serde(default)]
    pub department: Option<String>,
}

impl Recipient {
    pub fn has_contact_address(&self) -> bool {
        self.contact_address
            .as_deref()
            .is_some_and(|addr| !addr.trim().is_empty())
    }
}

/// RecipientFilter narrows the recipient store. Recipients without a
/// contact address never match.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecipientFilter {
    pub role: Option<RecipientRole>,
    pub department: Option<String>,
}

impl RecipientFilter {
    pub fn matches(&self, recipient: &Recipient) -> bool {
        if !recipient.has_contact_address() {
            return false;
        }
        if let Some(role) = self.role {
            if recipient.role != role {
                return false;
            }
        }
        if let Some(ref department) = self.department {
            if recipient.department.as_deref() != Some(department.as_str()) {
                return false;
            }
        }
        true
    }
}
