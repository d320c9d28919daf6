use std::sync::Arc;

use pollx_core::{InMemoryUserDirectory, Poll, Role, User};
use pollx_engine::PollRepository;

/// Users every fixture refers to
#[allow(dead_code)]
pub struct Cast {
    pub admin: User,
    pub ann: User,
    pub bo: User,
}

#[allow(dead_code)]
pub fn cast() -> Cast {
    Cast {
        admin: User::new("Admin", "admin@example.com", Role::PollAdmin),
        ann: User::new("Ann", "ann@example.com", Role::RegularUser),
        bo: User::new("Bo", "bo@example.com", Role::RegularUser),
    }
}

#[allow(dead_code)]
pub fn directory(cast: &Cast) -> Arc<InMemoryUserDirectory> {
    let directory = Arc::new(InMemoryUserDirectory::new());
    for user in [&cast.admin, &cast.ann, &cast.bo] {
        directory.register(user.clone()).unwrap();
    }
    directory
}

#[allow(dead_code)]
pub fn repository(cast: &Cast) -> PollRepository {
    PollRepository::open_in_memory(directory(cast)).unwrap()
}

/// "Lunch": SubPoll "Where" with options "Pizza" and "Sushi"
#[allow(dead_code)]
pub fn lunch_poll(admin: &User) -> Poll {
    let mut poll = Poll::new(admin.clone(), "Lunch");
    let where_ = poll.add_sub_poll("Where", "Pick a place");
    where_.add_option("Pizza", "");
    where_.add_option("Sushi", "");
    poll
}
