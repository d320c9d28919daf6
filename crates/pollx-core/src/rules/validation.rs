//! Structural validation of a poll tree before it is persisted

use std::collections::HashSet;

use uuid::Uuid;

use crate::errors::{PollError, Result};
use crate::model::Poll;

/// Validate a poll tree
///
/// Checks that every identifier (poll, admin, SubPolls, options, voters) is
/// non-nil, that no poll/SubPoll/option identifier occurs twice, and that no
/// user votes twice on one option. A decoded tree bypasses `add_vote`, so
/// the last rule is enforced here as well.
///
/// # Errors
/// * `NilIdentifier` - an entity carries the nil UUID
/// * `DuplicateIdentifier` - an identifier is used by two entities
/// * `DuplicateVote` - a voter appears twice on the same option
pub fn validate_poll(poll: &Poll) -> Result<()> {
    require_id(poll.id(), "Poll")?;
    require_id(poll.admin.id, "Poll admin")?;

    let mut seen: HashSet<Uuid> = HashSet::new();
    seen.insert(poll.id());

    for sub_poll in poll.sub_polls() {
        require_id(sub_poll.id(), "SubPoll")?;
        if !seen.insert(sub_poll.id()) {
            return Err(PollError::DuplicateIdentifier { id: sub_poll.id() });
        }

        for option in sub_poll.options() {
            require_id(option.id(), "Option")?;
            if !seen.insert(option.id()) {
                return Err(PollError::DuplicateIdentifier { id: option.id() });
            }
            let mut voters: HashSet<Uuid> = HashSet::new();
            for voter in option.votes() {
                require_id(voter.id, "Voter")?;
                if !voters.insert(voter.id) {
                    return Err(PollError::DuplicateVote {
                        option_id: option.id(),
                        user_id: voter.id,
                    });
                }
            }
        }
    }

    Ok(())
}

fn require_id(id: Uuid, entity: &str) -> Result<()> {
    if id.is_nil() {
        return Err(PollError::NilIdentifier {
            entity: entity.to_string(),
        });
    }
    Ok(())
}
