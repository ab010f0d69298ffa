use crate::{error::AppError, web_server::AppState};
use axum::{extract::FromRequestParts, http::request::Parts};
use common::UserProfile;

/// The caller, as resolved from the bearer token by `auth_middleware`.
#[derive(Clone, Debug)]
pub struct AuthUser(pub UserProfile);

impl AuthUser {
    pub fn id(&self) -> i64 {
        self.0.id
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        // The middleware puts AuthUser in the extensions. Missing means the
        // route was registered without it, which is a server bug.
        let user = parts.extensions.get::<AuthUser>().ok_or_else(|| {
            AppError::InternalServerError(
                "AuthUser not found in request extensions. Is the auth middleware missing?".into(),
            )
        })?;

        Ok(user.clone())
    }
}
