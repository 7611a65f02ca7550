use serde::{Deserialize, Serialize};

/// ActorRole is the role carried by a verified credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorRole {
    Student,
    Faculty,
    Hod,
    Principal,
    Director,
    Admin,
}

impl ActorRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActorRole::Student => "student",
            ActorRole::Faculty => "faculty",
            ActorRole::Hod => "hod",
            ActorRole::Principal => "principal",
            ActorRole::Director => "director",
            ActorRole::Admin => "admin",
        }
    }
}

impl std::fmt::Display for ActorRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ActorRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "student" => Ok(ActorRole::Student),
            "faculty" => Ok(ActorRole::Faculty),
            "hod" => Ok(ActorRole::Hod),
            "principal" => Ok(ActorRole::Principal),
            "director" => Ok(ActorRole::Director),
            "admin" => Ok(ActorRole::Admin),
            other => Err(format!("unknown actor role: {}", other)),
        }
    }
}

/// Actor is the authenticated user on whose behalf an operation runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Actor {
    pub id: String,
    pub name: String,
    pub role: ActorRole,
    #[serde(default)]
    pub department: Option<String>,
}

impl Actor {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        role: ActorRole,
        department: Option<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            role,
            department,
        }
    }
}
