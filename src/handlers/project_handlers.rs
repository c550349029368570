use crate::error::Result;
use crate::handlers::ApiJson;
use crate::models::{CreateProjectRequest, UpdateProjectRequest};
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;

/// GET /api/projects - All projects newest first, each with an image summary
pub async fn list_projects(State(state): State<AppState>) -> Result<Json<serde_json::Value>> {
    let projects = state.project_service.list_projects().await?;
    Ok(Json(json!({ "projects": projects })))
}

/// POST /api/projects - Create a project from the wizard fields
///
/// ## Request Body (JSON)
/// ```json
/// {
///   "name": "Spring drop",
///   "purpose": "Launch campaign",
///   "focus": "product",
///   "quantity": 5,
///   "userId": "optional"
/// }
/// ```
///
/// Without a known `userId` the project goes to the oldest user, or to a
/// default user created on the spot.
pub async fn create_project(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CreateProjectRequest>,
) -> Result<Response> {
    let project = state.project_service.create_project(request).await?;
    tracing::info!("Created project {} ({})", project.name, project.id);

    Ok((StatusCode::CREATED, Json(json!({ "project": project }))).into_response())
}

pub async fn get_project(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>> {
    let project = state.project_service.get_project(&id).await?;
    Ok(Json(json!({ "project": project })))
}

pub async fn update_project(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<UpdateProjectRequest>,
) -> Result<Json<serde_json::Value>> {
    let project = state.project_service.update_project(&id, request).await?;
    Ok(Json(json!({ "project": project })))
}

pub async fn delete_project(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>> {
    state.project_service.delete_project(&id).await?;
    Ok(Json(json!({ "success": true })))
}
