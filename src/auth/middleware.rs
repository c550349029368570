use axum::{
    extract::{FromRequestParts, Request},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use chrono::Utc;

use crate::error::AppError;
use crate::models::User;
use crate::AppState;

/// The user identified by a valid `auth-token` cookie. Rejects with 401
/// when the cookie is missing, forged, expired, or names a deleted user.
#[derive(Debug, Clone)]
pub struct AuthUser(pub User);

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let cookie = jar
            .get(&state.session_config.name)
            .ok_or(AppError::AuthenticationFailed)?;

        let claims = state
            .token_signer
            .verify(cookie.value(), Utc::now())
            .map_err(|e| {
                tracing::debug!("Rejected session cookie: {}", e);
                AppError::AuthenticationFailed
            })?;

        let user = state.auth_service.get_user_by_id(&claims.user_id).await?;
        Ok(AuthUser(user))
    }
}

/// Gate for API routes outside `/api/auth`: a request without a valid
/// session is answered with the extractor's 401.
pub async fn require_auth(AuthUser(user): AuthUser, request: Request, next: Next) -> Response {
    tracing::debug!("Authenticated request from user {}", user.id);
    next.run(request).await
}
