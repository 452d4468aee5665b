//! Core business logic for gather.
//!
//! Everything state-dependent lives here: the activity lifecycle engine,
//! the activity service (edit rules, participation, deletion eligibility)
//! and the user account service. HTTP handlers are thin adapters over
//! these services.

pub mod services;

pub use services::*;
