use pollx_core_types::Sensitive;
use uuid::Uuid;

use super::user::User;

/// A capability grant: `user` may take part in the poll `poll_id`
///
/// Independent of the poll tree; the poll is referenced by identifier only.
#[derive(Debug, Clone, PartialEq)]
pub struct Access {
    pub token: Sensitive<String>,
    pub user: User,
    pub poll_id: Uuid,
}

impl Access {
    /// Issue a grant with a new opaque token
    pub fn issue(user: User, poll_id: Uuid) -> Self {
        Self {
            token: Sensitive::new(Uuid::new_v4().simple().to_string()),
            user,
            poll_id,
        }
    }
}
