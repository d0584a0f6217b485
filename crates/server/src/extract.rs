//! Typed request context produced by the bearer middleware.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use service::auth::domain::User;

use crate::errors::JsonApiError;

/// The user resolved from the request's bearer token.
///
/// Inserted into request extensions by
/// [`require_bearer_token`](crate::routes::auth::require_bearer_token); a
/// handler taking this extractor on a route without that layer answers 401.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = JsonApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .ok_or_else(|| JsonApiError::unauthorized("User not found"))
    }
}
