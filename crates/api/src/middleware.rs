//! API middleware.

use axum::{body::Body, extract::State, http::Request, middleware::Next, response::Response};
use gather_core::{ActivityService, UserService};

/// Application state.
#[derive(Clone)]
pub struct AppState {
    pub activity_service: ActivityService,
    pub user_service: UserService,
}

/// Authentication middleware.
///
/// Resolves a `Bearer` token to its user and stores the user in
/// request extensions for the `AuthUser` extractor. Requests without a
/// valid token pass through unauthenticated; protected handlers reject
/// them via the extractor.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    if let Some(auth_header) = req.headers().get("Authorization")
        && let Ok(auth_str) = auth_header.to_str()
        && let Some(token) = auth_str.strip_prefix("Bearer ")
        && let Ok(user) = state.user_service.authenticate_by_token(token).await
    {
        req.extensions_mut().insert(user);
    }

    next.run(req).await
}
