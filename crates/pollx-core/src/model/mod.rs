pub mod access;
pub mod option;
pub mod poll;
pub mod sub_poll;
pub mod user;

pub use access::Access;
pub use option::PollOption;
pub use poll::Poll;
pub use sub_poll::SubPoll;
pub use user::{Role, User};
