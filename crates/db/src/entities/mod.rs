//! Database entities.

pub mod activity;
pub mod activity_participant;
pub mod user;

pub use activity::Entity as Activity;
pub use activity_participant::Entity as ActivityParticipant;
pub use user::Entity as User;
