use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Canonical role vocabulary. `finance` is a lateral specialization of `editor`:
/// both rank above `viewer` and below `super_admin`, and neither satisfies the other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "text", rename_all = "snake_case")]
pub enum Role {
    SuperAdmin,
    Editor,
    Finance,
    Viewer,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::SuperAdmin => "super_admin",
            Role::Editor => "editor",
            Role::Finance => "finance",
            Role::Viewer => "viewer",
        }
    }

    pub fn rank(&self) -> u8 {
        match self {
            Role::Viewer => 1,
            Role::Editor | Role::Finance => 2,
            Role::SuperAdmin => 3,
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "super_admin" => Ok(Role::SuperAdmin),
            "editor" => Ok(Role::Editor),
            "finance" => Ok(Role::Finance),
            "viewer" => Ok(Role::Viewer),
            other => Err(format!("unknown role '{}'", other)),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Strict membership check.
pub fn require_role(role: Role, allowed: &[Role]) -> bool {
    allowed.contains(&role)
}

/// Ordinal check: the same role, or any role that strictly outranks `required`.
pub fn has_permission_level(role: Role, required: Role) -> bool {
    role == required || role.rank() > required.rank()
}
