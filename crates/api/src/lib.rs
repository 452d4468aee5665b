//! HTTP API layer for gather.
//!
//! - **Endpoints**: RPC-over-POST handlers under `/api`
//! - **Extractors**: authenticated-user extraction
//! - **Middleware**: bearer token authentication
//!
//! Built on Axum 0.8 with a Tower middleware stack.

pub mod endpoints;
pub mod extractors;
pub mod middleware;
pub mod response;

pub use endpoints::router;
pub use middleware::{AppState, auth_middleware};
