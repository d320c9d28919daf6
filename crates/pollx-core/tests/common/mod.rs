use pollx_core::{Poll, Role, User};

/// An admin user for building fixtures
#[allow(dead_code)]
pub fn admin() -> User {
    User::new("Admin", "admin@example.com", Role::SuperAdmin)
}

/// A voter with a distinct identifier on every call
#[allow(dead_code)]
pub fn voter(name: &str) -> User {
    User::new(name, format!("{}@example.com", name.to_lowercase()), Role::RegularUser)
}

/// "Lunch" poll: one SubPoll "Where" with options "Pizza" and "Sushi"
#[allow(dead_code)]
pub fn lunch_poll() -> Poll {
    let mut poll = Poll::new(admin(), "Lunch");
    let where_ = poll.add_sub_poll("Where", "Pick a place");
    where_.add_option("Pizza", "");
    where_.add_option("Sushi", "");
    poll
}
