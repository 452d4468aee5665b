//! Request extractors.

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
};
use gather_db::entities::user;

/// Authenticated user extractor.
///
/// Reads the user placed into request extensions by the auth
/// middleware; rejects with 401 when absent.
#[derive(Debug, Clone)]
pub struct AuthUser(pub user::Model);

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<user::Model>()
            .cloned()
            .map(AuthUser)
            .ok_or((StatusCode::UNAUTHORIZED, "Unauthorized"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;
    use chrono::Utc;

    #[tokio::test]
    async fn test_rejects_without_authenticated_user() {
        let (mut parts, ()) = Request::new(()).into_parts();

        let result = AuthUser::from_request_parts(&mut parts, &()).await;

        assert!(matches!(result, Err((StatusCode::UNAUTHORIZED, _))));
    }

    #[tokio::test]
    async fn test_extracts_user_from_extensions() {
        let user = user::Model {
            id: "u1".to_string(),
            username: "alice".to_string(),
            username_lower: "alice".to_string(),
            name: "Alice".to_string(),
            email: "alice@example.com".to_string(),
            password_hash: "$argon2id$fake".to_string(),
            token: Some("token".to_string()),
            created_at: Utc::now().into(),
            updated_at: None,
        };

        let mut request = Request::new(());
        request.extensions_mut().insert(user);
        let (mut parts, ()) = request.into_parts();

        let AuthUser(extracted) = AuthUser::from_request_parts(&mut parts, &())
            .await
            .expect("user should be extracted");

        assert_eq!(extracted.id, "u1");
    }
}
