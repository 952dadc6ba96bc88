use std::fmt;

use serde::{Deserialize, Serialize};

/// Role resolved by the identity provider for the acting principal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    SuperAdmin,
    Admin,
    Teacher,
    Parent,
}

impl Role {
    /// Admin-tier roles approve, reject, publish and run roster changes.
    pub fn is_moderator(self) -> bool {
        matches!(self, Role::Admin | Role::SuperAdmin)
    }

    /// Roles allowed to author content.
    pub fn can_author(self) -> bool {
        matches!(self, Role::Admin | Role::SuperAdmin | Role::Teacher)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::SuperAdmin => "super_admin",
            Role::Admin => "admin",
            Role::Teacher => "teacher",
            Role::Parent => "parent",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "super_admin" => Ok(Role::SuperAdmin),
            "admin" => Ok(Role::Admin),
            "teacher" => Ok(Role::Teacher),
            "parent" => Ok(Role::Parent),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

/// The caller on whose behalf an operation runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Principal {
    pub id: String,
    pub name: String,
    pub role: Role,
}

impl Principal {
    pub fn new(id: impl Into<String>, name: impl Into<String>, role: Role) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            role,
        }
    }

    pub fn is_moderator(&self) -> bool {
        self.role.is_moderator()
    }
}
