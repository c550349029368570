use super::double_option;
use super::image::{Image, ImageSummary};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Project fetched by id, with its images newest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectWithImages {
    #[serde(flatten)]
    pub project: Project,
    pub images: Vec<Image>,
}

/// Project as listed on the collection endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectListing {
    #[serde(flatten)]
    pub project: Project,
    pub images: Vec<ImageSummary>,
}

/// Wizard metadata stored as JSON in the project description.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectMetadata {
    pub description: String,
    pub purpose: Option<String>,
    pub focus: Option<String>,
    pub quantity: Option<u32>,
    pub concepts: Option<serde_json::Value>,
}

impl ProjectMetadata {
    /// Parses a description written by project creation. Plain-text
    /// descriptions yield `None`.
    pub fn parse(description: &str) -> Option<Self> {
        serde_json::from_str(description).ok()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProjectRequest {
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purpose: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub focus: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub concepts: Option<serde_json::Value>,
}

impl CreateProjectRequest {
    pub fn metadata(&self) -> ProjectMetadata {
        ProjectMetadata {
            description: self
                .description
                .clone()
                .filter(|d| !d.is_empty())
                .or_else(|| self.purpose.clone())
                .unwrap_or_default(),
            purpose: self.purpose.clone(),
            focus: self.focus.clone(),
            quantity: self.quantity,
            concepts: self.concepts.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateProjectRequest {
    pub name: Option<String>,
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub description: Option<Option<String>>,
}

#[derive(Debug, Clone)]
pub struct NewProject {
    pub name: String,
    pub description: Option<String>,
    pub user_id: String,
}

#[derive(Debug, Clone, Default)]
pub struct ProjectChanges {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_falls_back_to_purpose() {
        let request = CreateProjectRequest {
            name: Some("Spring drop".to_string()),
            purpose: Some("Launch".to_string()),
            focus: Some("product".to_string()),
            quantity: Some(5),
            ..Default::default()
        };

        let metadata = request.metadata();
        assert_eq!(metadata.description, "Launch");
        assert_eq!(metadata.quantity, Some(5));

        let encoded = serde_json::to_string(&metadata).unwrap();
        assert_eq!(ProjectMetadata::parse(&encoded), Some(metadata));
    }

    #[test]
    fn test_plain_description_is_not_metadata() {
        assert_eq!(ProjectMetadata::parse("just some words"), None);
    }
}
