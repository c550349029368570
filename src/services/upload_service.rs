use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use uuid::Uuid;

static DATA_URL_EXTENSION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"data:image/(\w+);").expect("valid extension regex"));
static DATA_URL_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^data:image/\w+;base64,").expect("valid prefix regex"));

/// Request body cap for `POST /api/upload`. Base64 inflates images by a
/// third, so this admits images of roughly 18 MB.
pub const UPLOAD_BODY_LIMIT: usize = 25 * 1024 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("Valid base64 image data required")]
    MissingImage,
    #[error("Valid base64 image data required")]
    InvalidDataUrl,
    #[error("Image data is not valid base64")]
    InvalidBase64,
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadRequest {
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

/// Writes base64 data-URL images under `<public>/uploads/`.
pub struct UploadService {
    upload_dir: PathBuf,
}

impl UploadService {
    pub fn new(public_dir: impl AsRef<Path>) -> Self {
        Self {
            upload_dir: public_dir.as_ref().join("uploads"),
        }
    }

    /// Stores the image and returns its public URL.
    pub async fn upload(&self, request: UploadRequest) -> Result<String, UploadError> {
        let image = request
            .image
            .filter(|i| !i.is_empty())
            .ok_or(UploadError::MissingImage)?;
        if !image.starts_with("data:image/") {
            return Err(UploadError::InvalidDataUrl);
        }

        let extension = DATA_URL_EXTENSION
            .captures(&image)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str())
            .unwrap_or("png");

        let payload = DATA_URL_PREFIX.replace(&image, "");
        let bytes = STANDARD
            .decode(payload.trim().as_bytes())
            .map_err(|_| UploadError::InvalidBase64)?;

        let filename = upload_filename(
            request.user_id.as_deref(),
            request.project_name.as_deref(),
            Utc::now(),
            extension,
        );

        tokio::fs::create_dir_all(&self.upload_dir).await?;
        tokio::fs::write(self.upload_dir.join(&filename), &bytes).await?;
        tracing::info!("Stored upload {} ({} bytes)", filename, bytes.len());

        Ok(format!("/uploads/{}", filename))
    }
}

fn project_segment(project_name: Option<&str>) -> String {
    match project_name.filter(|n| !n.is_empty()) {
        Some(name) => name
            .to_lowercase()
            .chars()
            .map(|c| {
                if c.is_ascii_lowercase() || c.is_ascii_digit() {
                    c
                } else {
                    '_'
                }
            })
            .take(20)
            .collect(),
        None => "project".to_string(),
    }
}

/// `<user8>_<project20>_<YYYYMMDD>_<uuid8>.<ext>`
pub fn upload_filename(
    user_id: Option<&str>,
    project_name: Option<&str>,
    now: DateTime<Utc>,
    extension: &str,
) -> String {
    let user_segment: String = match user_id.filter(|u| !u.is_empty()) {
        Some(user_id) => user_id.chars().take(8).collect(),
        None => "user".to_string(),
    };
    let unique: String = Uuid::new_v4().to_string().chars().take(8).collect();

    format!(
        "{}_{}_{}_{}.{}",
        user_segment,
        project_segment(project_name),
        now.format("%Y%m%d"),
        unique,
        extension
    )
}
