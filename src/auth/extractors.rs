use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use tracing::warn;

use crate::auth::dto::PublicUser;
use crate::auth::jwt::{JwtKeys, TokenError};
use crate::auth::repo::User;
use crate::error::ApiError;
use crate::state::AppState;

/// Auth gate: verifies the bearer token and resolves it to a live user.
///
/// Every failure is terminal and externally a 401; the internal reason
/// (missing header, bad signature, expired, deleted user) only shows up in
/// the logs. The resolved profile never carries the password hash.
pub struct CurrentUser(pub PublicUser);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ApiError::unauthenticated("No token provided"))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or_else(|| ApiError::unauthenticated("No token provided"))?;

        let keys = JwtKeys::from_ref(state);
        let claims = keys.verify(token).map_err(|e| {
            match e {
                TokenError::Expired => warn!("rejected expired token"),
                TokenError::Malformed(ref src) => warn!(error = %src, "rejected malformed token"),
            }
            ApiError::unauthenticated("Invalid or expired token")
        })?;

        // The token may outlive the account it was minted for.
        let user = User::find_by_id(&state.db, claims.sub)
            .await
            .map_err(ApiError::Unexpected)?
            .ok_or_else(|| {
                warn!(user_id = %claims.sub, "token subject no longer exists");
                ApiError::unauthenticated("Invalid or expired token")
            })?;

        Ok(CurrentUser(user.into()))
    }
}
