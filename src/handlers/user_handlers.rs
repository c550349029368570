use crate::error::Result;
use crate::handlers::ApiJson;
use crate::models::{CreateUserRequest, UpdateUserRequest};
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;

pub async fn list_users(State(state): State<AppState>) -> Result<Json<serde_json::Value>> {
    let users = state.user_service.list_users().await?;
    Ok(Json(json!({ "users": users })))
}

/// POST /api/users - Get-or-create by email
///
/// ## Response
/// - 200 OK with the existing user when the email is known
/// - 201 CREATED with the new user otherwise
///
/// ## Errors
/// - 400 Bad Request: email missing
pub async fn create_user(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CreateUserRequest>,
) -> Result<Response> {
    let (user, created) = state
        .user_service
        .get_or_create(request.email, request.name)
        .await?;

    let status = if created {
        tracing::info!("Created user {}", user.email);
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };

    Ok((status, Json(json!({ "user": user }))).into_response())
}

/// GET /api/users/{id} - User with projects and per-project image counts
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>> {
    let user = state.user_service.get_user_detail(&id).await?;
    Ok(Json(json!({ "user": user })))
}

pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<UpdateUserRequest>,
) -> Result<Json<serde_json::Value>> {
    let user = state.user_service.update_user(&id, request.name).await?;
    Ok(Json(json!({ "user": user })))
}

/// DELETE /api/users/{id} - Removes the user, its projects and their images
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>> {
    state.user_service.delete_user(&id).await?;
    tracing::info!("Deleted user {}", id);
    Ok(Json(json!({ "success": true })))
}
