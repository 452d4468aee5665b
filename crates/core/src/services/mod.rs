//! Business logic services.

pub mod activity;
pub mod lifecycle;
pub mod user;

pub use activity::{
    ActivityDetail, ActivityService, CreateActivityInput, ParticipantEntry, UpdateActivityInput,
};
pub use lifecycle::{LifecycleState, RecomputeOutcome};
pub use user::{LoginInput, RegisterInput, UserService};
