//! Axum extractors for the user resolved by the session gate.

use axum::{
    extract::FromRequestParts,
    http::request::Parts,
    response::Redirect,
};
use launchpad_core::auth::{login_redirect_location, User};

/// Extractor for the authenticated user.
///
/// Redirects to the login page when the gate did not attach a user.
pub struct CurrentUser(pub User);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = Redirect;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<User>()
            .cloned()
            .map(CurrentUser)
            .ok_or_else(|| Redirect::to(&login_redirect_location(parts.uri.path())))
    }
}

/// Extractor for an optional user. Never rejects.
pub struct OptionalUser(pub Option<User>);

impl<S> FromRequestParts<S> for OptionalUser
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(OptionalUser(parts.extensions.get::<User>().cloned()))
    }
}
