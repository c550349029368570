use crate::auth::AuthUser;
use crate::error::{AppError, Result};
use crate::handlers::ApiJson;
use crate::models::{PublicUser, SendCodeRequest, User, VerifyCodeRequest};
use crate::services::{auth_service::LoginRequest, user_service::SignupRequest};
use crate::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use axum_extra::extract::cookie::CookieJar;
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Deserialize)]
pub struct SignupBody {
    email: Option<String>,
    password: Option<String>,
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginBody {
    email: Option<String>,
    password: Option<String>,
}

fn start_session(state: &AppState, jar: CookieJar, user: &User) -> Result<CookieJar> {
    let token = state
        .token_signer
        .issue(&user.id, &user.email, Utc::now())
        .map_err(|e| AppError::InternalError(e.to_string()))?;
    Ok(jar.add(state.session_config.session_cookie(token)))
}

/// POST /api/auth/signup - Create a password account
///
/// ## Response (201 CREATED)
/// ```json
/// { "success": true, "user": { "id": "...", "email": "...", "name": null } }
/// ```
///
/// ## Errors
/// - 400 Bad Request: missing email/password, or the email is taken
pub async fn signup(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<SignupBody>,
) -> Result<Response> {
    let user = state
        .user_service
        .signup(SignupRequest {
            email: body.email,
            password: body.password,
            name: body.name,
        })
        .await?;

    tracing::info!("New signup: {}", user.email);

    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "user": PublicUser::from(user) })),
    )
        .into_response())
}

/// POST /api/auth/login - Password login, sets the `auth-token` cookie
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    ApiJson(body): ApiJson<LoginBody>,
) -> Result<Response> {
    let user = state
        .auth_service
        .authenticate(LoginRequest {
            email: body.email,
            password: body.password,
        })
        .await?;

    tracing::info!("User logged in: {}", user.email);
    let jar = start_session(&state, jar, &user)?;

    Ok((
        jar,
        Json(json!({ "success": true, "user": PublicUser::from(user) })),
    )
        .into_response())
}

/// POST /api/auth/send-code - Email a one-time sign-in code
pub async fn send_code(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<SendCodeRequest>,
) -> Result<Json<serde_json::Value>> {
    state.verification_service.send_code(body.email).await?;
    Ok(Json(json!({ "success": true })))
}

/// POST /api/auth/verify-code - Consume a one-time code, sets the
/// `auth-token` cookie. First sign-in creates the user.
pub async fn verify_code(
    State(state): State<AppState>,
    jar: CookieJar,
    ApiJson(body): ApiJson<VerifyCodeRequest>,
) -> Result<Response> {
    let user = state
        .verification_service
        .verify_code(body.email, body.code)
        .await?;

    tracing::info!("Verified sign-in code for {}", user.email);
    let jar = start_session(&state, jar, &user)?;

    Ok((
        jar,
        Json(json!({ "success": true, "user": PublicUser::from(user) })),
    )
        .into_response())
}

pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> Response {
    let jar = jar.add(state.session_config.cleared_cookie());
    (jar, Json(json!({ "success": true }))).into_response()
}

/// GET /api/auth/me - The user behind the session cookie
pub async fn me(AuthUser(user): AuthUser) -> Json<serde_json::Value> {
    Json(json!({ "user": PublicUser::from(user) }))
}
