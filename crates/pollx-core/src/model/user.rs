use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Capability level of a user
///
/// Gating by role happens outside this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    SuperAdmin,
    PollAdmin,
    RegularUser,
    Temporary,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::SuperAdmin => "SUPER_ADMIN",
            Role::PollAdmin => "POLL_ADMIN",
            Role::RegularUser => "REGULAR_USER",
            Role::Temporary => "TEMPORARY",
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "SUPER_ADMIN" => Ok(Role::SuperAdmin),
            "POLL_ADMIN" => Ok(Role::PollAdmin),
            "REGULAR_USER" => Ok(Role::RegularUser),
            "TEMPORARY" => Ok(Role::Temporary),
            other => Err(format!("unknown role: {}", other)),
        }
    }
}

/// A person who administers polls or votes in them
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
}

impl User {
    /// Create a user with a freshly generated identifier
    pub fn new(name: impl Into<String>, email: impl Into<String>, role: Role) -> Self {
        Self {
            id: Uuid::now_v7(),
            name: name.into(),
            email: email.into(),
            role,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_wire_names() {
        let json = serde_json::to_string(&Role::PollAdmin).unwrap();
        assert_eq!(json, "\"POLL_ADMIN\"");
        assert_eq!("TEMPORARY".parse::<Role>(), Ok(Role::Temporary));
        assert!("ADMIN".parse::<Role>().is_err());
    }

    #[test]
    fn test_new_users_get_distinct_ids() {
        let a = User::new("Ada", "ada@example.com", Role::RegularUser);
        let b = User::new("Ada", "ada@example.com", Role::RegularUser);
        assert_ne!(a.id, b.id);
    }
}
