use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::sub_poll::SubPoll;
use super::user::User;
use crate::errors::Result;

/// Poll - the aggregate root
///
/// A Poll owns its SubPolls (which own their options). Children point back at
/// their parent by identifier only; those back-references are recomputed on
/// attach and on decode, so the encoded form is a plain tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "PollRepr")]
pub struct Poll {
    id: Uuid,
    pub admin: User,
    pub name: String,
    sub_polls: Vec<SubPoll>,
}

#[derive(Deserialize)]
struct PollRepr {
    id: Uuid,
    admin: User,
    name: String,
    #[serde(default)]
    sub_polls: Vec<SubPoll>,
}

impl From<PollRepr> for Poll {
    fn from(repr: PollRepr) -> Self {
        let mut poll = Self {
            id: repr.id,
            admin: repr.admin,
            name: repr.name,
            sub_polls: repr.sub_polls,
        };
        poll.rewire();
        poll
    }
}

impl Poll {
    /// Create a poll with a generated identifier and no SubPolls
    pub fn new(admin: User, name: impl Into<String>) -> Self {
        Self::restore(Uuid::now_v7(), admin, name)
    }

    /// Rebuild a poll whose identifier was assigned earlier
    pub fn restore(id: Uuid, admin: User, name: impl Into<String>) -> Self {
        Self {
            id,
            admin,
            name: name.into(),
            sub_polls: Vec::new(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn sub_polls(&self) -> &[SubPoll] {
        &self.sub_polls
    }

    pub fn sub_polls_mut(&mut self) -> &mut [SubPoll] {
        &mut self.sub_polls
    }

    pub fn sub_poll(&self, sub_poll_id: Uuid) -> Option<&SubPoll> {
        self.sub_polls.iter().find(|s| s.id() == sub_poll_id)
    }

    pub fn sub_poll_mut(&mut self, sub_poll_id: Uuid) -> Option<&mut SubPoll> {
        self.sub_polls.iter_mut().find(|s| s.id() == sub_poll_id)
    }

    /// Append a new closed SubPoll and return a handle to the stored element
    ///
    /// The handle points into the poll's own sequence, so further mutation
    /// through it is visible on the poll.
    pub fn add_sub_poll(
        &mut self,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> &mut SubPoll {
        self.attach_sub_poll(SubPoll::new(title, description))
    }

    /// Append an existing SubPoll, rewiring its back-reference to this Poll
    pub fn attach_sub_poll(&mut self, mut sub_poll: SubPoll) -> &mut SubPoll {
        sub_poll.set_poll_id(self.id);
        sub_poll.rewire();
        self.sub_polls.push(sub_poll);
        let last = self.sub_polls.len() - 1;
        &mut self.sub_polls[last]
    }

    /// Detach a SubPoll; the returned value has a nil back-reference
    pub fn remove_sub_poll(&mut self, sub_poll_id: Uuid) -> Option<SubPoll> {
        let index = self.sub_polls.iter().position(|s| s.id() == sub_poll_id)?;
        let mut sub_poll = self.sub_polls.remove(index);
        sub_poll.set_poll_id(Uuid::nil());
        Some(sub_poll)
    }

    /// Total number of options across all SubPolls
    pub fn option_count(&self) -> usize {
        self.sub_polls.iter().map(|s| s.options().len()).sum()
    }

    /// Encode the whole tree as pretty-printed JSON
    ///
    /// Back-references are left out; they are re-derived by `from_json`.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Decode a tree produced by `to_json` (or by any compatible client)
    pub fn from_json(data: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(data)?)
    }

    /// Recompute every back-reference below this poll
    pub(crate) fn rewire(&mut self) {
        let id = self.id;
        for sub_poll in &mut self.sub_polls {
            sub_poll.set_poll_id(id);
            sub_poll.rewire();
        }
    }
}
