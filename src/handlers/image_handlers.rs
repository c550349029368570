use crate::error::Result;
use crate::handlers::ApiJson;
use crate::models::{CreateImageRequest, ImageUpdate, NoteUpdateRequest};
use crate::services::{ConceptVariations, SelectVariationRequest};
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageListQuery {
    project_id: Option<String>,
}

/// GET /api/images - Images newest first, optionally `?projectId=`
pub async fn list_images(
    State(state): State<AppState>,
    Query(query): Query<ImageListQuery>,
) -> Result<Json<serde_json::Value>> {
    let images = state
        .image_service
        .list_images(query.project_id.as_deref())
        .await?;
    Ok(Json(json!({ "images": images })))
}

pub async fn create_image(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CreateImageRequest>,
) -> Result<Response> {
    let image = state.image_service.create_image(request).await?;
    Ok((StatusCode::CREATED, Json(json!({ "image": image }))).into_response())
}

pub async fn get_image(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>> {
    let image = state.image_service.get_image(&id).await?;
    Ok(Json(json!({ "image": image })))
}

/// PUT /api/images/{id} - Partial update
///
/// A single `true` flag toggles that review state; `false` flags clear;
/// note keys sent as `null` clear the note.
///
/// ## Errors
/// - 400 Bad Request: more than one flag set to `true`
/// - 404 Not Found: unknown image
pub async fn update_image(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(update): ApiJson<ImageUpdate>,
) -> Result<Json<serde_json::Value>> {
    let image = state.image_service.update_image(&id, update).await?;
    Ok(Json(json!({ "image": image })))
}

pub async fn delete_image(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>> {
    state.image_service.delete_image(&id).await?;
    Ok(Json(json!({ "success": true })))
}

/// PUT /api/images/{id}/notes - Write one note field
///
/// ## Request Body (JSON)
/// ```json
/// { "type": "reviseNote", "content": "Warmer light please" }
/// ```
pub async fn update_note(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<NoteUpdateRequest>,
) -> Result<Json<serde_json::Value>> {
    let image = state.image_service.update_note(&id, request).await?;
    Ok(Json(json!({ "image": image })))
}

/// GET /api/images/{id}/variations - Concept sidecar metadata
pub async fn get_variations(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ConceptVariations>> {
    let variations = state.variation_service.get_variations(&id).await?;
    Ok(Json(variations))
}

pub async fn select_variation(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<SelectVariationRequest>,
) -> Result<Json<serde_json::Value>> {
    state
        .variation_service
        .select_variation(&id, request)
        .await?;
    tracing::debug!("Recorded selected variation for concept {}", id);
    Ok(Json(json!({ "success": true })))
}
