//! Per-concept variation metadata kept in `<public>/images/<id>/metadata.json`.
//!
//! This sidecar lives beside the relational store and is not reconciled with
//! it; the selected variation recorded here is independent of image flags.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum VariationError {
    #[error("Invalid concept id")]
    InvalidId,
    #[error("selectedVariationId is required")]
    MissingSelection,
    #[error("Concept not found")]
    ConceptNotFound,
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Metadata error: {0}")]
    Metadata(#[from] serde_json::Error),
}

/// Sidecar file contents. Fields this service does not know about are kept
/// as-is when the file is rewritten.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConceptMetadata {
    #[serde(default)]
    pub id: Value,
    #[serde(default)]
    pub original_image: Value,
    #[serde(default)]
    pub variations: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_variation: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConceptVariations {
    pub id: Value,
    pub original_image: Value,
    pub variations: Value,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectVariationRequest {
    pub selected_variation_id: Option<String>,
}

pub struct VariationService {
    images_dir: PathBuf,
}

impl VariationService {
    pub fn new(public_dir: impl AsRef<Path>) -> Self {
        Self {
            images_dir: public_dir.as_ref().join("images"),
        }
    }

    fn metadata_path(&self, id: &str) -> Result<PathBuf, VariationError> {
        let unsafe_id = id.is_empty()
            || id == "."
            || id.contains("..")
            || id.contains('/')
            || id.contains('\\')
            || id.contains('\0');
        if unsafe_id {
            return Err(VariationError::InvalidId);
        }
        Ok(self.images_dir.join(id).join("metadata.json"))
    }

    async fn read_metadata(&self, id: &str) -> Result<ConceptMetadata, VariationError> {
        let path = self.metadata_path(id)?;
        let data = match tokio::fs::read_to_string(&path).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(VariationError::ConceptNotFound)
            }
            Err(e) => return Err(e.into()),
        };

        serde_json::from_str(&data).map_err(|e| {
            tracing::warn!("Unreadable variation metadata at {}: {}", path.display(), e);
            VariationError::ConceptNotFound
        })
    }

    pub async fn get_variations(&self, id: &str) -> Result<ConceptVariations, VariationError> {
        let metadata = self.read_metadata(id).await?;
        Ok(ConceptVariations {
            id: metadata.id,
            original_image: metadata.original_image,
            variations: metadata.variations,
        })
    }

    pub async fn select_variation(
        &self,
        id: &str,
        request: SelectVariationRequest,
    ) -> Result<(), VariationError> {
        let selected = request
            .selected_variation_id
            .filter(|s| !s.is_empty())
            .ok_or(VariationError::MissingSelection)?;

        let mut metadata = self.read_metadata(id).await?;
        metadata.selected_variation = Some(selected);

        let path = self.metadata_path(id)?;
        tokio::fs::write(&path, serde_json::to_string_pretty(&metadata)?).await?;
        Ok(())
    }
}
