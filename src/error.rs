use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::repositories::RepositoryError;
use crate::services::{
    auth_service::AuthServiceError, image_service::ImageServiceError,
    project_service::ProjectServiceError, upload_service::UploadError,
    user_service::UserServiceError, variation_service::VariationError,
    verification_service::VerificationError,
};

// Type alias for Result with our AppError
pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("Not authenticated")]
    AuthenticationFailed,

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    PayloadTooLarge(String),

    #[error("Internal server error: {0}")]
    InternalError(String),
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        AppError::Validation(message.into())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::AuthenticationFailed => {
                (StatusCode::UNAUTHORIZED, "Not authenticated".to_string())
            }
            AppError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                "Invalid email or password".to_string(),
            ),
            AppError::NotFound(what) => (StatusCode::NOT_FOUND, format!("{} not found", what)),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::PayloadTooLarge(msg) => (StatusCode::PAYLOAD_TOO_LARGE, msg),
            AppError::Repository(e) => {
                tracing::error!("Repository failure: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
            AppError::InternalError(cause) => {
                tracing::error!("Internal failure: {}", cause);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        (status, Json(json!({ "error": error_message }))).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection.status() {
            StatusCode::PAYLOAD_TOO_LARGE => AppError::PayloadTooLarge(rejection.body_text()),
            _ => AppError::Validation(rejection.body_text()),
        }
    }
}

impl From<UserServiceError> for AppError {
    fn from(err: UserServiceError) -> Self {
        match err {
            UserServiceError::UserNotFound => AppError::NotFound("User"),
            UserServiceError::MissingEmail
            | UserServiceError::MissingCredentials
            | UserServiceError::EmailTaken => AppError::Validation(err.to_string()),
            UserServiceError::HashingError(cause) => AppError::InternalError(cause),
            UserServiceError::RepositoryError(e) => AppError::Repository(e),
        }
    }
}

impl From<AuthServiceError> for AppError {
    fn from(err: AuthServiceError) -> Self {
        match err {
            AuthServiceError::MissingCredentials => AppError::Validation(err.to_string()),
            AuthServiceError::InvalidCredentials => AppError::InvalidCredentials,
            AuthServiceError::UserNotFound => AppError::AuthenticationFailed,
            AuthServiceError::RepositoryError(e) => AppError::Repository(e),
        }
    }
}

impl From<VerificationError> for AppError {
    fn from(err: VerificationError) -> Self {
        match err {
            VerificationError::MissingEmail
            | VerificationError::MissingFields
            | VerificationError::InvalidCode => AppError::Validation(err.to_string()),
            VerificationError::EmailError(e) => {
                AppError::InternalError(format!("Failed to send verification code: {}", e))
            }
            VerificationError::RepositoryError(e) => AppError::Repository(e),
        }
    }
}

impl From<ProjectServiceError> for AppError {
    fn from(err: ProjectServiceError) -> Self {
        match err {
            ProjectServiceError::MissingName => AppError::Validation(err.to_string()),
            ProjectServiceError::ProjectNotFound => AppError::NotFound("Project"),
            ProjectServiceError::RepositoryError(e) => AppError::Repository(e),
        }
    }
}

impl From<ImageServiceError> for AppError {
    fn from(err: ImageServiceError) -> Self {
        match err {
            ImageServiceError::ImageNotFound => AppError::NotFound("Image"),
            ImageServiceError::ProjectNotFound => AppError::NotFound("Project"),
            ImageServiceError::MissingFields
            | ImageServiceError::MissingNote
            | ImageServiceError::InvalidNoteType
            | ImageServiceError::ConflictingFlags(_) => AppError::Validation(err.to_string()),
            ImageServiceError::RepositoryError(e) => AppError::Repository(e),
        }
    }
}

impl From<VariationError> for AppError {
    fn from(err: VariationError) -> Self {
        match err {
            VariationError::InvalidId | VariationError::MissingSelection => {
                AppError::Validation(err.to_string())
            }
            VariationError::ConceptNotFound => AppError::NotFound("Concept"),
            VariationError::Io(e) => AppError::InternalError(e.to_string()),
            VariationError::Metadata(e) => AppError::InternalError(e.to_string()),
        }
    }
}

impl From<UploadError> for AppError {
    fn from(err: UploadError) -> Self {
        match err {
            UploadError::MissingImage | UploadError::InvalidDataUrl | UploadError::InvalidBase64 => {
                AppError::Validation(err.to_string())
            }
            UploadError::Io(e) => AppError::InternalError(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_not_found_body() {
        let response = AppError::NotFound("Image").into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            body_json(response).await,
            json!({ "error": "Image not found" })
        );
    }

    #[tokio::test]
    async fn test_internal_errors_are_generic() {
        let response = AppError::InternalError("disk on fire".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body_json(response).await,
            json!({ "error": "Internal server error" })
        );
    }
}
