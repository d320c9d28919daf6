use pollx_core::{InMemoryUserDirectory, Poll, Role, User};
use rusqlite::Connection;

/// Migrated in-memory database with foreign keys enforced
#[allow(dead_code)]
pub fn setup_db() -> Connection {
    let mut conn = pollx_store::db::open_in_memory().unwrap();
    pollx_store::migrations::apply_migrations(&mut conn).unwrap();
    conn
}

#[allow(dead_code)]
pub fn count(conn: &Connection, table: &str) -> i64 {
    conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| {
        row.get(0)
    })
    .unwrap()
}

/// Directory pre-loaded with every user passed in
#[allow(dead_code)]
pub fn directory_with(users: &[&User]) -> InMemoryUserDirectory {
    let directory = InMemoryUserDirectory::new();
    for user in users {
        directory.register((*user).clone()).unwrap();
    }
    directory
}

#[allow(dead_code)]
pub fn admin() -> User {
    User::new("Admin", "admin@example.com", Role::PollAdmin)
}

#[allow(dead_code)]
pub fn voter(name: &str) -> User {
    User::new(
        name,
        format!("{}@example.com", name.to_lowercase()),
        Role::RegularUser,
    )
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

/// Two SubPolls with two options each
#[allow(dead_code)]
pub fn two_by_two(admin: &User) -> Poll {
    let mut poll = Poll::new(admin.clone(), "Offsite");
    let when = poll.add_sub_poll("When", "");
    when.add_option("Monday", "");
    when.add_option("Friday", "");
    let where_ = poll.add_sub_poll("Where", "");
    where_.add_option("Beach", "");
    where_.add_option("Mountains", "");
    poll
}
