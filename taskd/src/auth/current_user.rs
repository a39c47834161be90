//! Request-time principal resolution.
//!
//! The `CurrentUser` extractor turns an `Authorization: Bearer <jwt>` header
//! into an authenticated principal. The token only names the subject; the
//! role is looked up from the store on every request, so a demoted account
//! loses its privileges without waiting for the token to expire.

use crate::{
    AppState,
    api::models::users::CurrentUser,
    auth::token,
    errors::{Error, Result},
};
use axum::{extract::FromRequestParts, http::request::Parts};
use tracing::{debug, instrument, trace};

/// Extract the bearer token from the Authorization header.
///
/// Returns None when the header is absent, not a Bearer scheme, or not
/// valid UTF-8. Every malformed-credential shape collapses into the same
/// unauthenticated rejection.
fn extract_bearer(parts: &Parts) -> Option<&str> {
    let auth_header = parts.headers.get(axum::http::header::AUTHORIZATION)?;
    let auth_str = auth_header.to_str().ok()?;
    auth_str.strip_prefix("Bearer ")
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = Error;

    #[instrument(skip(parts, state))]
    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        let token = match extract_bearer(parts) {
            Some(token) => token,
            None => {
                trace!("No bearer credentials found in request");
                return Err(Error::Unauthenticated { message: None });
            }
        };

        // TokenExpired and Unauthenticated propagate as-is; an expired
        // token must be distinguishable from a missing one.
        let email = token::verify_session_token(token, &state.config)?;

        // The subject must still exist; a deleted account's tokens are dead.
        let user = state.store.users.get_by_email(&email).await?.ok_or(Error::Unauthenticated {
            message: None,
        })?;

        let current_user = CurrentUser::from(user);
        debug!("Authenticated user: {}", current_user.id);
        Ok(current_user)
    }
}
