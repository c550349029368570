use crate::error::Result;
use crate::handlers::ApiJson;
use crate::services::UploadRequest;
use crate::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;

/// POST /api/upload - Store a base64 data-URL image under `/uploads/`
///
/// ## Request Body (JSON)
/// ```json
/// { "image": "data:image/png;base64,...", "projectName": "Demo", "userId": "..." }
/// ```
///
/// ## Response (201 CREATED)
/// ```json
/// { "url": "/uploads/user_demo_20240309_1a2b3c4d.png" }
/// ```
pub async fn upload_image(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<UploadRequest>,
) -> Result<Response> {
    let url = state.upload_service.upload(request).await?;
    Ok((StatusCode::CREATED, Json(json!({ "url": url }))).into_response())
}
