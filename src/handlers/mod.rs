pub mod image_handlers;
pub mod project_handlers;
pub mod upload_handlers;
pub mod user_handlers;

use crate::error::AppError;
use axum::extract::FromRequest;

/// `axum::Json` whose rejections render as `{error}` with status 400.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);
