//! Data access repositories.

mod activity;
mod user;

pub use activity::ActivityRepository;
pub use user::UserRepository;
