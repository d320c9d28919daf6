use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::user::User;

/// One choice inside a SubPoll, accumulating votes
///
/// `sub_poll_id` is the derived back-reference to the owning SubPoll. It is
/// recomputed whenever the option is attached and never serialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "PollOptionRepr")]
pub struct PollOption {
    id: Uuid,
    pub title: String,
    pub description: String,
    votes: Vec<User>,
    #[serde(skip)]
    sub_poll_id: Uuid,
}

#[derive(Deserialize)]
struct PollOptionRepr {
    id: Uuid,
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    votes: Vec<User>,
}

impl From<PollOptionRepr> for PollOption {
    fn from(repr: PollOptionRepr) -> Self {
        Self {
            id: repr.id,
            title: repr.title,
            description: repr.description,
            votes: repr.votes,
            sub_poll_id: Uuid::nil(),
        }
    }
}

impl PollOption {
    /// Create a detached option with a fresh identifier
    ///
    /// The back-reference stays nil until the option is attached to a SubPoll.
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self::restore(Uuid::now_v7(), title, description)
    }

    /// Rebuild an option whose identifier was assigned earlier (e.g. loaded
    /// from storage)
    pub fn restore(id: Uuid, title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            description: description.into(),
            votes: Vec::new(),
            sub_poll_id: Uuid::nil(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Identifier of the SubPoll currently holding this option
    pub fn sub_poll_id(&self) -> Uuid {
        self.sub_poll_id
    }

    pub(crate) fn set_sub_poll_id(&mut self, sub_poll_id: Uuid) {
        self.sub_poll_id = sub_poll_id;
    }

    pub fn votes(&self) -> &[User] {
        &self.votes
    }

    /// Record a vote from `user`
    ///
    /// A user appears at most once per option. Returns `false` if the user had
    /// already voted for this option.
    pub fn add_vote(&mut self, user: User) -> bool {
        if self.has_vote_from(user.id) {
            return false;
        }
        self.votes.push(user);
        true
    }

    /// Withdraw the vote of `user_id`, returning whether one was present
    pub fn remove_vote(&mut self, user_id: Uuid) -> bool {
        let before = self.votes.len();
        self.votes.retain(|u| u.id != user_id);
        self.votes.len() != before
    }

    pub fn has_vote_from(&self, user_id: Uuid) -> bool {
        self.votes.iter().any(|u| u.id == user_id)
    }
}
