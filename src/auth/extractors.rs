use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};
use tracing::warn;

use crate::{error::AuthError, state::AppState, store::User};

/// Validates the bearer token and loads the user it names. Every protected
/// handler takes this instead of checking the token itself.
pub struct CurrentUser(pub User);

/// Token from `Authorization: Bearer <token>`; the scheme is matched
/// case-insensitively.
pub(crate) fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers).ok_or_else(|| {
            warn!("missing or malformed Authorization header");
            AuthError::Unauthenticated
        })?;

        let claims = state
            .keys
            .verify(token)
            .map_err(|_| AuthError::Unauthenticated)?;

        match state.users.find_by_id(claims.sub).await? {
            Some(user) => Ok(CurrentUser(user)),
            None => {
                warn!(user_id = %claims.sub, "token subject no longer exists");
                Err(AuthError::Unauthenticated)
            }
        }
    }
}
