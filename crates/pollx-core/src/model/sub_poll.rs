use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::option::PollOption;

/// A single question inside a Poll
///
/// Owns its options in insertion order. `poll_id` is the derived
/// back-reference to the owning Poll and is never serialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "SubPollRepr")]
pub struct SubPoll {
    id: Uuid,
    pub title: String,
    pub description: String,
    /// Voting enabled
    pub open: bool,
    options: Vec<PollOption>,
    #[serde(skip)]
    poll_id: Uuid,
}

#[derive(Deserialize)]
struct SubPollRepr {
    id: Uuid,
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    open: bool,
    #[serde(default)]
    options: Vec<PollOption>,
}

impl From<SubPollRepr> for SubPoll {
    fn from(repr: SubPollRepr) -> Self {
        let mut sub_poll = Self {
            id: repr.id,
            title: repr.title,
            description: repr.description,
            open: repr.open,
            options: repr.options,
            poll_id: Uuid::nil(),
        };
        sub_poll.rewire();
        sub_poll
    }
}

impl SubPoll {
    /// Create a detached, closed SubPoll with a fresh identifier
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self::restore(Uuid::now_v7(), title, description, false)
    }

    /// Rebuild a SubPoll whose identifier was assigned earlier
    pub fn restore(
        id: Uuid,
        title: impl Into<String>,
        description: impl Into<String>,
        open: bool,
    ) -> Self {
        Self {
            id,
            title: title.into(),
            description: description.into(),
            open,
            options: Vec::new(),
            poll_id: Uuid::nil(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Identifier of the Poll currently holding this SubPoll
    pub fn poll_id(&self) -> Uuid {
        self.poll_id
    }

    pub(crate) fn set_poll_id(&mut self, poll_id: Uuid) {
        self.poll_id = poll_id;
    }

    pub fn options(&self) -> &[PollOption] {
        &self.options
    }

    /// In-place access; the sequence itself can only change through
    /// `add_option`, `attach_option` and `remove_option`
    pub fn options_mut(&mut self) -> &mut [PollOption] {
        &mut self.options
    }

    pub fn option(&self, option_id: Uuid) -> Option<&PollOption> {
        self.options.iter().find(|o| o.id() == option_id)
    }

    pub fn option_mut(&mut self, option_id: Uuid) -> Option<&mut PollOption> {
        self.options.iter_mut().find(|o| o.id() == option_id)
    }

    /// Append a new option and return a handle to the stored element
    pub fn add_option(
        &mut self,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> &mut PollOption {
        self.attach_option(PollOption::new(title, description))
    }

    /// Append an existing option, rewiring its back-reference to this SubPoll
    pub fn attach_option(&mut self, mut option: PollOption) -> &mut PollOption {
        option.set_sub_poll_id(self.id);
        self.options.push(option);
        let last = self.options.len() - 1;
        &mut self.options[last]
    }

    /// Detach an option; the returned value has a nil back-reference
    pub fn remove_option(&mut self, option_id: Uuid) -> Option<PollOption> {
        let index = self.options.iter().position(|o| o.id() == option_id)?;
        let mut option = self.options.remove(index);
        option.set_sub_poll_id(Uuid::nil());
        Some(option)
    }

    /// Recompute the back-reference of every option
    pub(crate) fn rewire(&mut self) {
        let id = self.id;
        for option in &mut self.options {
            option.set_sub_poll_id(id);
        }
    }
}
