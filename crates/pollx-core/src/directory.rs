//! User directory seam
//!
//! Users live in an external service. The store resolves the admin of each
//! poll and every voter through this trait when it rebuilds a tree.

use std::collections::BTreeMap;
use std::sync::RwLock;

use uuid::Uuid;

use crate::errors::{PollError, Result};
use crate::model::User;

/// Lookup of users by identifier
pub trait UserDirectory: Send + Sync {
    /// Returns `Ok(None)` when the directory has no such user
    fn get_user(&self, id: Uuid) -> Result<Option<User>>;

    /// Like `get_user`, but an unknown id is `UserNotFound`
    fn require_user(&self, id: Uuid) -> Result<User> {
        self.get_user(id)?
            .ok_or(PollError::UserNotFound { user_id: id })
    }
}

/// Directory held in process memory
#[derive(Debug, Default)]
pub struct InMemoryUserDirectory {
    users: RwLock<BTreeMap<Uuid, User>>,
}

impl InMemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a user
    pub fn register(&self, user: User) -> Result<()> {
        let mut users = self.users.write().map_err(|_| PollError::LockPoisoned {
            resource: "user_directory".to_string(),
        })?;
        users.insert(user.id, user);
        Ok(())
    }

    /// All users ordered by identifier
    pub fn list(&self) -> Result<Vec<User>> {
        let users = self.users.read().map_err(|_| PollError::LockPoisoned {
            resource: "user_directory".to_string(),
        })?;
        Ok(users.values().cloned().collect())
    }
}

impl UserDirectory for InMemoryUserDirectory {
    fn get_user(&self, id: Uuid) -> Result<Option<User>> {
        let users = self.users.read().map_err(|_| PollError::LockPoisoned {
            resource: "user_directory".to_string(),
        })?;
        Ok(users.get(&id).cloned())
    }
}
